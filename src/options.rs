//! Immutable parser options (`spec.md` §3 option table, §6 validation rules).
//!
//! `ParserOptions` is built once via [`ParserOptionsBuilder`] and then shared
//! freely (§5: "The parser-options record is immutable after construction;
//! free to share"). Validation happens entirely in `build()`; a constructed
//! `ParserOptions` is always internally consistent.

use crate::error::{ParseError, Result};

/// What a row parser does when it meets a quote character that is not at the
/// start of an unquoted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStrictness {
    /// A stray quote raises [`ParseError::strict_stray_quote`].
    Strict,
    /// A stray quote is treated as ordinary data.
    Tolerant,
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub escape: u8,
    pub enable_quoted_fields: bool,
    pub allow_newlines_in_quotes: bool,
    pub comment_character: Option<u8>,
    pub trim_fields: bool,
    pub has_header_row: bool,
    pub skip_rows: u64,
    pub max_column_count: u64,
    pub max_row_count: u64,
    pub max_field_size: usize,
    pub max_row_size: usize,
    pub use_simd_if_available: bool,
    pub track_source_line_numbers: bool,
    pub quote_strictness: QuoteStrictness,
    /// Initial (and minimum) capacity of the streaming reader's buffer.
    pub initial_buffer_size: usize,
}

impl ParserOptions {
    pub fn builder() -> ParserOptionsBuilder {
        ParserOptionsBuilder::default()
    }

    /// RFC 4180 doubled-quote semantics apply when the escape byte equals the
    /// quote byte (`spec.md` §3, `escape` row).
    #[inline]
    pub fn doubled_quote_escaping(&self) -> bool {
        self.escape == self.quote
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        match ParserOptionsBuilder::default().build() {
            Ok(options) => options,
            Err(_) => unreachable!("ParserOptionsBuilder's own defaults are always valid"),
        }
    }
}

/// Builder for [`ParserOptions`]. Every setter is typed, so unknown option
/// names are a compile-time error per `spec.md` §6; invalid *combinations* are
/// rejected by [`ParserOptionsBuilder::build`].
#[derive(Debug, Clone)]
pub struct ParserOptionsBuilder {
    delimiter: u8,
    quote: u8,
    escape: u8,
    enable_quoted_fields: bool,
    allow_newlines_in_quotes: bool,
    comment_character: Option<u8>,
    trim_fields: bool,
    has_header_row: bool,
    skip_rows: u64,
    max_column_count: u64,
    max_row_count: u64,
    max_field_size: usize,
    max_row_size: usize,
    use_simd_if_available: bool,
    track_source_line_numbers: bool,
    strict_rfc4180: bool,
    tolerant: bool,
    initial_buffer_size: usize,
}

impl Default for ParserOptionsBuilder {
    fn default() -> Self {
        ParserOptionsBuilder {
            delimiter: b',',
            quote: b'"',
            escape: b'"',
            enable_quoted_fields: true,
            allow_newlines_in_quotes: true,
            comment_character: None,
            trim_fields: false,
            has_header_row: false,
            skip_rows: 0,
            max_column_count: 4096,
            max_row_count: u64::MAX,
            max_field_size: 64 * 1024 * 1024,
            max_row_size: 256 * 1024 * 1024,
            use_simd_if_available: true,
            track_source_line_numbers: false,
            strict_rfc4180: true,
            tolerant: false,
            initial_buffer_size: 64 * 1024,
        }
    }
}

impl ParserOptionsBuilder {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    pub fn escape(mut self, escape: u8) -> Self {
        self.escape = escape;
        self
    }

    pub fn enable_quoted_fields(mut self, enable: bool) -> Self {
        self.enable_quoted_fields = enable;
        self
    }

    pub fn allow_newlines_in_quotes(mut self, allow: bool) -> Self {
        self.allow_newlines_in_quotes = allow;
        self
    }

    pub fn comment_character(mut self, comment: Option<u8>) -> Self {
        self.comment_character = comment;
        self
    }

    pub fn trim_fields(mut self, trim: bool) -> Self {
        self.trim_fields = trim;
        self
    }

    pub fn has_header_row(mut self, has_header: bool) -> Self {
        self.has_header_row = has_header;
        self
    }

    pub fn skip_rows(mut self, n: u64) -> Self {
        self.skip_rows = n;
        self
    }

    pub fn max_column_count(mut self, n: u64) -> Self {
        self.max_column_count = n;
        self
    }

    pub fn max_row_count(mut self, n: u64) -> Self {
        self.max_row_count = n;
        self
    }

    pub fn max_field_size(mut self, n: usize) -> Self {
        self.max_field_size = n;
        self
    }

    pub fn max_row_size(mut self, n: usize) -> Self {
        self.max_row_size = n;
        self
    }

    pub fn use_simd_if_available(mut self, use_simd: bool) -> Self {
        self.use_simd_if_available = use_simd;
        self
    }

    pub fn track_source_line_numbers(mut self, track: bool) -> Self {
        self.track_source_line_numbers = track;
        self
    }

    pub fn strict_rfc4180(mut self, strict: bool) -> Self {
        self.strict_rfc4180 = strict;
        self
    }

    pub fn tolerant(mut self, tolerant: bool) -> Self {
        self.tolerant = tolerant;
        self
    }

    pub fn initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size;
        self
    }

    pub fn build(self) -> Result<ParserOptions> {
        if !self.delimiter.is_ascii() {
            return Err(ParseError::InvalidDelimiter(self.delimiter));
        }
        if !self.quote.is_ascii() {
            return Err(ParseError::InvalidDelimiter(self.quote));
        }
        if self.delimiter == self.quote {
            return Err(ParseError::InvalidOptions {
                option: "delimiter/quote",
                detail: "delimiter must differ from quote".to_string(),
            });
        }
        if self.strict_rfc4180 && self.tolerant {
            return Err(ParseError::InvalidOptions {
                option: "strict_rfc4180/tolerant",
                detail: "strict_rfc4180 and tolerant are mutually exclusive".to_string(),
            });
        }
        if !self.enable_quoted_fields && self.allow_newlines_in_quotes {
            return Err(ParseError::InvalidOptions {
                option: "allow_newlines_in_quotes",
                detail: "requires enable_quoted_fields".to_string(),
            });
        }
        if self.initial_buffer_size < 1024 {
            return Err(ParseError::InvalidOptions {
                option: "initial_buffer_size",
                detail: "must be at least 1024 bytes".to_string(),
            });
        }
        if let Some(c) = self.comment_character {
            if !c.is_ascii() {
                return Err(ParseError::InvalidOptions {
                    option: "comment_character",
                    detail: "must be ASCII".to_string(),
                });
            }
        }

        let quote_strictness = if self.tolerant {
            QuoteStrictness::Tolerant
        } else {
            QuoteStrictness::Strict
        };

        Ok(ParserOptions {
            delimiter: self.delimiter,
            quote: self.quote,
            escape: self.escape,
            enable_quoted_fields: self.enable_quoted_fields,
            allow_newlines_in_quotes: self.allow_newlines_in_quotes,
            comment_character: self.comment_character,
            trim_fields: self.trim_fields,
            has_header_row: self.has_header_row,
            skip_rows: self.skip_rows,
            max_column_count: self.max_column_count,
            max_row_count: self.max_row_count,
            max_field_size: self.max_field_size,
            max_row_size: self.max_row_size,
            use_simd_if_available: self.use_simd_if_available,
            track_source_line_numbers: self.track_source_line_numbers,
            quote_strictness,
            initial_buffer_size: self.initial_buffer_size,
        })
    }
}
