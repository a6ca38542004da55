//! C4 async mirror (`feature = "async"`): `spec.md` §9 "Async streaming via
//! coroutines" redesign flag.
//!
//! Same buffer discipline as [`crate::streaming_reader::StreamingReader`],
//! retargeted from a blocking [`std::io::Read`] source to
//! [`tokio::io::AsyncRead`]. `advance` takes a [`CancellationToken`] and
//! checks it at entry and again before every refill, rather than relying on
//! the source itself to observe cancellation — enriched from the TDS driver
//! example's `tokio` + `tokio_util` stack.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::buffer_pool::BufferPool;
use crate::error::{ParseError, Result};
use crate::options::ParserOptions;
use crate::row_parser::{self, RowOutcome};
use crate::row_view::{OwnedRow, RowView};
use crate::scanner::{self, SentinelIndex};

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

pub struct AsyncStreamingReader<'a, R: AsyncRead + Unpin> {
    source: Option<R>,
    leave_open: bool,

    options: &'a ParserOptions,
    pool: &'a BufferPool,

    buffer: Vec<u8>,
    length: usize,
    offset: usize,
    eof_reached: bool,
    bom_checked: bool,

    sentinels: SentinelIndex,
    sentinels_valid_len: usize,
    column_ends: Vec<i64>,

    physical_rows_seen: u64,
    emitted_row_count: u64,
    header: Option<OwnedRow>,
    header_consumed: bool,

    physical_line_number: u64,
    row_line_number: u64,

    row_start: usize,
    row_len: usize,
    terminal: bool,
}

impl<'a, R: AsyncRead + Unpin> AsyncStreamingReader<'a, R> {
    pub fn new(source: R, options: &'a ParserOptions) -> Self {
        Self::with_pool(source, options, crate::buffer_pool::global())
    }

    pub fn with_pool(source: R, options: &'a ParserOptions, pool: &'a BufferPool) -> Self {
        let mut buffer = pool.rent_bytes(options.initial_buffer_size);
        buffer.resize(options.initial_buffer_size, 0);
        let column_ends = pool.rent_column_ends(options.max_column_count as usize + 2);
        AsyncStreamingReader {
            source: Some(source),
            leave_open: false,
            options,
            pool,
            buffer,
            length: 0,
            offset: 0,
            eof_reached: false,
            bom_checked: false,
            sentinels: SentinelIndex::default(),
            sentinels_valid_len: usize::MAX,
            column_ends,
            physical_rows_seen: 0,
            emitted_row_count: 0,
            header: None,
            header_consumed: !options.has_header_row,
            physical_line_number: 1,
            row_line_number: 1,
            row_start: 0,
            row_len: 0,
            terminal: false,
        }
    }

    pub fn leave_open(mut self, leave_open: bool) -> Self {
        self.leave_open = leave_open;
        self
    }

    pub fn header(&self) -> Option<&OwnedRow> {
        self.header.as_ref()
    }

    /// Physical source line the current row starts on, 1-based. `Some` only
    /// when `track_source_line_numbers` is enabled (`spec.md` §3).
    pub fn current_line_number(&self) -> Option<u64> {
        self.options.track_source_line_numbers.then_some(self.row_line_number)
    }

    /// Physical row number (1-based, counting comment/empty/header rows) of
    /// the row last returned by `advance`.
    pub fn current_row_number(&self) -> u64 {
        self.physical_rows_seen
    }

    fn ensure_sentinels(&mut self) {
        if self.sentinels_valid_len != self.length {
            self.sentinels.clear();
            scanner::scan_into(
                &self.buffer[..self.length],
                self.options.delimiter,
                self.options.quote,
                !self.options.use_simd_if_available,
                &mut self.sentinels,
            );
            self.sentinels_valid_len = self.length;
        }
    }

    async fn refill(&mut self) -> Result<()> {
        if self.eof_reached {
            return Ok(());
        }

        if self.offset > 0 {
            self.buffer.copy_within(self.offset..self.length, 0);
            self.length -= self.offset;
            self.offset = 0;
        }

        if self.length == self.buffer.len() {
            let max_capacity = self.options.max_row_size + 2;
            if self.buffer.len() >= max_capacity {
                tracing::debug!(capacity = self.buffer.len(), max_capacity, "async streaming buffer cannot grow further");
                return Err(ParseError::row_too_large(self.options.max_row_size));
            }
            let grown = (self.buffer.len().saturating_mul(2)).min(max_capacity).max(self.buffer.len() + 1);
            tracing::trace!(from = self.buffer.len(), to = grown, "growing async streaming buffer");
            self.buffer.resize(grown, 0);
        }

        let source = self
            .source
            .as_mut()
            .unwrap_or_else(|| unreachable!("refill called after disposal"));
        let n = source.read(&mut self.buffer[self.length..]).await?;
        self.length += n;
        if n == 0 {
            self.eof_reached = true;
            tracing::trace!(total_length = self.length, "async streaming source reached end of input");
        }

        if !self.bom_checked {
            self.bom_checked = true;
            if self.length >= 3 && self.buffer[0..3] == BOM {
                self.offset = 3;
            }
        }

        Ok(())
    }

    /// Advance to the next data row, checking `cancel` before returning and
    /// before every refill. Returns [`ParseError::Cancelled`] if the token is
    /// already cancelled at either checkpoint.
    pub async fn advance(&mut self, cancel: &CancellationToken) -> Result<bool> {
        if self.terminal {
            return Ok(false);
        }
        if cancel.is_cancelled() {
            self.terminal = true;
            return Err(ParseError::Cancelled);
        }

        loop {
            self.ensure_sentinels();
            let row_number = self.physical_rows_seen + 1;
            let row_line_number = self.physical_line_number;

            let outcome = row_parser::parse_row(
                &self.buffer[..self.length],
                self.offset,
                row_number,
                self.eof_reached,
                self.options,
                &self.sentinels,
                &mut self.column_ends,
            );

            let result = match outcome {
                Err(e) => {
                    self.terminal = true;
                    return Err(e);
                }
                Ok(RowOutcome::NeedMoreData) => {
                    if cancel.is_cancelled() {
                        self.terminal = true;
                        return Err(ParseError::Cancelled);
                    }
                    self.refill().await?;
                    continue;
                }
                Ok(RowOutcome::Row(r)) => r,
            };

            if result.bytes_consumed == 0 && result.column_count == 0 {
                return Ok(false);
            }

            self.physical_rows_seen += 1;
            let row_start = self.offset;
            self.offset += result.bytes_consumed;
            let terminator_present = result.bytes_consumed > result.row_length;
            self.physical_line_number += result.newline_count + u64::from(terminator_present);

            if self.physical_rows_seen <= self.options.skip_rows {
                continue;
            }

            let is_comment = self
                .options
                .comment_character
                .is_some_and(|c| result.row_length > 0 && self.buffer[row_start] == c);
            if is_comment {
                continue;
            }

            let is_empty = result.column_count == 1 && result.row_length == 0;
            if is_empty {
                continue;
            }

            if !self.options.allow_newlines_in_quotes && result.newline_count > 0 {
                self.terminal = true;
                return Err(ParseError::Parse {
                    location: crate::error::BindLocation {
                        row: row_number,
                        column: -1,
                        member_name: None,
                        field_value: None,
                        quote_start_position: None,
                    },
                    message: "embedded newline inside quoted field, but allow_newlines_in_quotes is false".to_string(),
                    cause: None,
                });
            }

            if !self.header_consumed {
                let view = RowView::new(&self.buffer[row_start..row_start + result.row_length], &self.column_ends, false);
                self.header = Some(view.to_owned_row(self.options.quote, self.options.escape));
                self.header_consumed = true;
                continue;
            }

            if self.emitted_row_count >= self.options.max_row_count {
                self.terminal = true;
                return Err(ParseError::TooManyRows { row: row_number });
            }
            self.emitted_row_count += 1;
            self.row_start = row_start;
            self.row_len = result.row_length;
            self.row_line_number = row_line_number;
            return Ok(true);
        }
    }

    pub fn current(&self) -> RowView<'_> {
        RowView::new(
            &self.buffer[self.row_start..self.row_start + self.row_len],
            &self.column_ends,
            self.options.trim_fields,
        )
    }

    pub fn dispose(self) {}
}

impl<'a, R: AsyncRead + Unpin> Drop for AsyncStreamingReader<'a, R> {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buffer);
        self.pool.return_bytes(buf);
        let ends = std::mem::take(&mut self.column_ends);
        self.pool.return_column_ends(ends);
        if self.leave_open {
            if let Some(source) = self.source.take() {
                std::mem::forget(source);
            }
        }
    }
}
