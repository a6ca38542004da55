//! C3: span reader (`spec.md` §4.3).
//!
//! Iterates rows over a contiguous in-memory buffer. The whole buffer is
//! scanned for sentinels once at construction (no refill, so there is no
//! value in incremental scanning the way the streaming reader needs it);
//! `column_ends` is a single scratch array rented once and reused by every
//! row. Comment-row and empty-row skipping, header consumption, and
//! `skip_rows` all live here rather than in [`crate::row_parser`], matching
//! the framer/row-parser split the contract draws.

use crate::buffer_pool::BufferPool;
use crate::error::Result;
use crate::options::ParserOptions;
use crate::row_parser::{self, RowOutcome};
use crate::row_view::{OwnedRow, RowView};
use crate::scanner::{self, SentinelIndex};

pub struct SpanReader<'a> {
    buffer: &'a [u8],
    options: &'a ParserOptions,
    sentinels: SentinelIndex,
    column_ends: Vec<i64>,
    pool: &'a BufferPool,

    physical_rows_seen: u64,
    emitted_row_count: u64,
    header: Option<OwnedRow>,
    header_consumed: bool,

    physical_line_number: u64,
    row_line_number: u64,

    next_pos: usize,
    row_start: usize,
    row_len: usize,
    terminal: bool,
}

impl<'a> SpanReader<'a> {
    pub fn new(buffer: &'a [u8], options: &'a ParserOptions) -> Self {
        Self::with_pool(buffer, options, crate::buffer_pool::global())
    }

    pub fn with_pool(buffer: &'a [u8], options: &'a ParserOptions, pool: &'a BufferPool) -> Self {
        let start = bom_offset(buffer);
        let sentinels = scanner::scan(buffer, options.delimiter, options.quote, !options.use_simd_if_available);
        let column_ends = pool.rent_column_ends(options.max_column_count as usize + 2);
        SpanReader {
            buffer,
            options,
            sentinels,
            column_ends,
            pool,
            physical_rows_seen: 0,
            emitted_row_count: 0,
            header: None,
            header_consumed: !options.has_header_row,
            physical_line_number: 1,
            row_line_number: 1,
            next_pos: start,
            row_start: 0,
            row_len: 0,
            terminal: false,
        }
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
    /// the row last returned by `advance`. Used to locate dispatcher and
    /// binder errors against the source.
    pub fn current_row_number(&self) -> u64 {
        self.physical_rows_seen
    }

    /// Advance to the next data row. Returns `false` once input is exhausted
    /// or the reader has become terminal after an error.
    pub fn advance(&mut self) -> Result<bool> {
        if self.terminal {
            return Ok(false);
        }

        loop {
            if self.next_pos >= self.buffer.len() {
                return Ok(false);
            }

            let row_number = self.physical_rows_seen + 1;
            let row_line_number = self.physical_line_number;
            let outcome = match row_parser::parse_row(
                self.buffer,
                self.next_pos,
                row_number,
                true,
                self.options,
                &self.sentinels,
                &mut self.column_ends,
            ) {
                Ok(o) => o,
                Err(e) => {
                    self.terminal = true;
                    return Err(e);
                }
            };

            let result = match outcome {
                RowOutcome::Row(r) => r,
                RowOutcome::NeedMoreData => unreachable!("span reader always parses with end_of_input=true"),
            };

            self.physical_rows_seen += 1;
            let row_start = self.next_pos;
            self.next_pos += result.bytes_consumed;
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
                return Err(crate::error::ParseError::Parse {
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
                return Err(crate::error::ParseError::TooManyRows { row: row_number });
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

    /// Return pooled scratch to the pool. Ownership makes repeated disposal
    /// unreachable at the type level; `Drop` covers the case where a caller
    /// lets the reader fall out of scope instead of calling this explicitly.
    pub fn dispose(self) {}

    /// Adapt this reader into an `Iterator<Item = Result<OwnedRow>>` for
    /// callers who don't need zero-copy row views (`spec.md` §6 "Row output
    /// shape"). Each row is copied (with unquoting applied) before being
    /// yielded, trading the zero-copy contract for an ordinary iterator.
    pub fn into_owned_rows(self) -> OwnedRows<'a> {
        OwnedRows { reader: self }
    }
}

/// Iterator adapter returned by [`SpanReader::into_owned_rows`].
pub struct OwnedRows<'a> {
    reader: SpanReader<'a>,
}

impl<'a> Iterator for OwnedRows<'a> {
    type Item = Result<OwnedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.advance() {
            Ok(true) => {
                let row = self.reader.current().to_owned_row(self.reader.options.quote, self.reader.options.escape);
                Some(Ok(row))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a> Drop for SpanReader<'a> {
    fn drop(&mut self) {
        let ends = std::mem::take(&mut self.column_ends);
        self.pool.return_column_ends(ends);
    }
}

fn bom_offset(buffer: &[u8]) -> usize {
    if buffer.len() >= 3 && &buffer[0..3] == [0xEF, 0xBB, 0xBF] {
        3
    } else {
        0
    }
}
