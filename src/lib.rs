#![feature(portable_simd)]
//! csvforge — high-throughput, low-allocation delimiter-separated value
//! parsing.
//!
//! Byte sources (in-memory slices or [`std::io::Read`] streams) are framed
//! into rows by a SIMD sentinel scanner and an explicit quote state machine
//! (`scanner`, `row_parser`), surfaced through zero-copy [`row_view::RowView`]s
//! via [`span_reader::SpanReader`] / [`streaming_reader::StreamingReader`]
//! (and, with `feature = "async"`, [`streaming_reader_async::AsyncStreamingReader`]).
//! Rows headed by a discriminator column dispatch to per-schema binders
//! (`discriminator`, `dispatcher`), and typed record binding
//! (`binder`) or fixed-width layout I/O (`fixed_width`) sits on top.
//!
//! # Strategies
//!
//! - C1 `scanner` — vectorised sentinel scan (delimiter/quote/`\n`/`\r`)
//! - C2 `row_parser` — quote state machine over the scanner's sentinel streams
//! - C3 `span_reader` — row framer over a contiguous in-memory buffer
//! - C4 `streaming_reader` (+ `streaming_reader_async` under `feature = "async"`)
//!   — row framer over an unbounded byte stream
//! - C5 `discriminator` / C6 `dispatcher` — multi-schema row routing
//! - C7 `binder` — typed record binding
//! - C8 `fixed_width` — fixed-width field layout reader/writer
//! - C9 `options` / `error` — configuration and error taxonomy
//! - C10 `buffer_pool` — scratch buffer reuse
//! - `scan_unit` — the 16-bit element variant of the C1 scalar scan

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod binder;
pub mod buffer_pool;
pub mod discriminator;
pub mod dispatcher;
pub mod error;
pub mod field;
pub mod fixed_width;
pub mod options;
pub mod registry;
pub mod row_parser;
pub mod row_view;
pub mod scan_unit;
pub mod scanner;
pub mod span_reader;
pub mod streaming_reader;

#[cfg(feature = "async")]
pub mod streaming_reader_async;

pub use error::{BindLocation, ParseError, Result};
pub use options::{ParserOptions, ParserOptionsBuilder, QuoteStrictness};
pub use row_view::{OwnedRow, RowView};
pub use span_reader::SpanReader;
pub use streaming_reader::StreamingReader;

#[cfg(feature = "async")]
pub use streaming_reader_async::AsyncStreamingReader;
