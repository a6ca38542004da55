//! C2: row parser (`spec.md` §4.2).
//!
//! Drives the merged sentinel stream from [`crate::scanner`] through the
//! quote state machine and emits one row's `column_ends`. Generalises the
//! teacher's inline state handling from `strategy/general.rs` /
//! `strategy/streaming.rs` (which only supported `escape == quote`) to the
//! `escape != quote` literal-prefix case.
//!
//! The event-driven loop — react only to sentinel positions, skip everything
//! else — *is* the fast-path/complex-path split the contract describes:
//! a row with no `quote` sentinels in range never touches the quote-handling
//! arms at all.

use crate::error::{ParseError, Result};
use crate::options::{ParserOptions, QuoteStrictness};
use crate::scanner::{SentinelIndex, SentinelKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    InsideQuote,
    /// Only reachable when `escape == quote` (RFC 4180 doubled-quote mode).
    PendingQuoteAfterQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowResult {
    pub column_count: usize,
    pub row_length: usize,
    pub bytes_consumed: usize,
    pub newline_count: u64,
}

/// Result of attempting to parse one row from a possibly-incomplete buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Row(RowResult),
    /// The row did not terminate within the supplied slice and `end_of_input`
    /// was false; the caller (streaming reader) should refill and retry.
    NeedMoreData,
}

fn close_field(
    column_ends: &mut Vec<i64>,
    pos: usize,
    field_start: usize,
    row_number: u64,
    options: &ParserOptions,
) -> Result<()> {
    let length = pos - field_start;
    if length > options.max_field_size {
        return Err(ParseError::field_too_large(row_number, column_ends.len() as u64, options.max_field_size));
    }
    column_ends.push(pos as i64);
    if (column_ends.len() - 1) as u64 > options.max_column_count {
        return Err(ParseError::TooManyColumns {
            row: row_number,
            column: (column_ends.len() - 1) as u64,
        });
    }
    Ok(())
}

/// Parse one row starting at `start` in `buffer`, using `sentinels` (already
/// scanned over `buffer`) for sentinel positions. `column_ends` is cleared
/// and repopulated (rent this from the pool, per C10).
///
/// `end_of_input` signals that `buffer` holds everything there is — no more
/// bytes will ever follow `buffer[start..]`. When false and the row does not
/// terminate within the slice, [`RowOutcome::NeedMoreData`] is returned.
pub fn parse_row(
    buffer: &[u8],
    start: usize,
    row_number: u64,
    end_of_input: bool,
    options: &ParserOptions,
    sentinels: &SentinelIndex,
    column_ends: &mut Vec<i64>,
) -> Result<RowOutcome> {
    column_ends.clear();
    column_ends.push(-1);

    if start >= buffer.len() {
        if !end_of_input {
            return Ok(RowOutcome::NeedMoreData);
        }
        return Ok(RowOutcome::Row(RowResult {
            column_count: 0,
            row_length: 0,
            bytes_consumed: 0,
            newline_count: 0,
        }));
    }

    let quote = options.quote;
    let escape = options.escape;
    let quoted_fields_enabled = options.enable_quoted_fields;

    let mut state = State::Unquoted;
    let mut field_start = start;
    let mut newline_count: u64 = 0;
    let mut quote_start_position: Option<usize> = None;
    let mut terminator: Option<(usize, usize)> = None;

    let cursor = sentinels.merge_from(start as u32);
    for (raw_pos, kind) in cursor {
        let pos = raw_pos as usize;
        match state {
            State::Unquoted => match kind {
                SentinelKind::Delimiter => {
                    close_field(column_ends, pos, field_start, row_number, options)?;
                    field_start = pos + 1;
                }
                SentinelKind::Quote => {
                    if quoted_fields_enabled && pos == field_start {
                        state = State::InsideQuote;
                        quote_start_position = Some(pos);
                    } else if quoted_fields_enabled && options.quote_strictness == QuoteStrictness::Strict {
                        return Err(ParseError::strict_stray_quote(row_number, column_ends.len() as u64));
                    }
                    // `!quoted_fields_enabled`, or tolerant mid-field quote: ordinary data.
                }
                SentinelKind::Lf => {
                    terminator = Some((pos - start, 1));
                    break;
                }
                SentinelKind::Cr => {
                    let extra = if buffer.get(pos + 1) == Some(&b'\n') { 2 } else { 1 };
                    terminator = Some((pos - start, extra));
                    break;
                }
            },
            State::InsideQuote => match kind {
                SentinelKind::Quote => {
                    let escaped_literal = escape != quote && pos > 0 && buffer[pos - 1] == escape;
                    if escaped_literal {
                        // data: escape prefix already consumed the preceding byte
                    } else if escape == quote {
                        state = State::PendingQuoteAfterQuote;
                    } else {
                        state = State::Unquoted;
                    }
                }
                SentinelKind::Lf | SentinelKind::Cr => {
                    newline_count += 1;
                }
                SentinelKind::Delimiter => {}
            },
            State::PendingQuoteAfterQuote => match kind {
                SentinelKind::Quote => {
                    state = State::InsideQuote;
                }
                SentinelKind::Delimiter => {
                    close_field(column_ends, pos, field_start, row_number, options)?;
                    field_start = pos + 1;
                    state = State::Unquoted;
                }
                SentinelKind::Lf => {
                    state = State::Unquoted;
                    terminator = Some((pos - start, 1));
                    break;
                }
                SentinelKind::Cr => {
                    state = State::Unquoted;
                    let extra = if buffer.get(pos + 1) == Some(&b'\n') { 2 } else { 1 };
                    terminator = Some((pos - start, extra));
                    break;
                }
            },
        }
    }

    if let Some((row_length, extra)) = terminator {
        let term_pos = start + row_length;
        close_field(column_ends, term_pos, field_start, row_number, options)?;
        return Ok(RowOutcome::Row(RowResult {
            column_count: column_ends.len() - 1,
            row_length,
            bytes_consumed: row_length + extra,
            newline_count,
        }));
    }

    // Ran out of sentinels without hitting a row terminator.
    if !end_of_input {
        return Ok(RowOutcome::NeedMoreData);
    }

    if state == State::InsideQuote {
        return Err(ParseError::unterminated_quote(row_number, quote_start_position.unwrap_or(start)));
    }

    let row_length = buffer.len() - start;
    close_field(column_ends, buffer.len(), field_start, row_number, options)?;
    Ok(RowOutcome::Row(RowResult {
        column_count: column_ends.len() - 1,
        row_length,
        bytes_consumed: row_length,
        newline_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner;

    fn parse(buffer: &[u8], options: &ParserOptions) -> (RowOutcome, Vec<i64>) {
        let sentinels = scanner::scan(buffer, options.delimiter, options.quote, false);
        let mut ends = Vec::new();
        let outcome = parse_row(buffer, 0, 1, true, options, &sentinels, &mut ends).unwrap();
        (outcome, ends)
    }

    #[test]
    fn basic_three_column_row() {
        let options = ParserOptions::default();
        let (outcome, ends) = parse(b"a,b,c", &options);
        match outcome {
            RowOutcome::Row(r) => {
                assert_eq!(r.column_count, 3);
                assert_eq!(r.row_length, 5);
                assert_eq!(r.bytes_consumed, 5);
            }
            RowOutcome::NeedMoreData => panic!("expected a row"),
        }
        assert_eq!(ends, vec![-1, 1, 3, 5]);
    }

    #[test]
    fn quoted_field_with_embedded_delimiter_and_escaped_quote() {
        let options = ParserOptions::default();
        let input = b"zzz,\"y\"\"yy\",xxx";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let outcome = parse_row(input, 0, 1, true, &options, &sentinels, &mut ends).unwrap();
        let r = match outcome {
            RowOutcome::Row(r) => r,
            _ => panic!("expected row"),
        };
        assert_eq!(r.column_count, 3);
        let cols: Vec<&[u8]> = (0..3)
            .map(|k| &input[(ends[k] + 1) as usize..ends[k + 1] as usize])
            .collect();
        assert_eq!(cols[0], b"zzz");
        assert_eq!(crate::field::extract_field_cow(cols[1], b'"', b'"').as_ref(), b"y\"yy");
        assert_eq!(cols[2], b"xxx");
    }

    #[test]
    fn mixed_line_endings_each_consume_correct_terminator_width() {
        let options = ParserOptions::default();
        let input = b"a,b,c\r1,2,3\n4,5,6\r\n7,8,9";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let mut pos = 0usize;
        let mut rows = Vec::new();
        loop {
            let outcome = parse_row(input, pos, 1, true, &options, &sentinels, &mut ends).unwrap();
            match outcome {
                RowOutcome::Row(r) if r.bytes_consumed == 0 && pos >= input.len() => break,
                RowOutcome::Row(r) => {
                    rows.push(ends.clone());
                    pos += r.bytes_consumed;
                    if pos >= input.len() {
                        break;
                    }
                }
                RowOutcome::NeedMoreData => panic!("end_of_input=true should never need more data"),
            }
        }
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn quote_not_at_field_start_is_stray_in_strict_mode() {
        let options = ParserOptions::default();
        let input = b"a\"b,c";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let err = parse_row(input, 0, 1, true, &options, &sentinels, &mut ends).unwrap_err();
        assert!(matches!(err, ParseError::Parse { .. }));
    }

    #[test]
    fn quote_not_at_field_start_is_data_in_tolerant_mode() {
        let options = ParserOptions::builder().tolerant(true).strict_rfc4180(false).build().unwrap();
        let input = b"a\"b,c";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let outcome = parse_row(input, 0, 1, true, &options, &sentinels, &mut ends).unwrap();
        match outcome {
            RowOutcome::Row(r) => assert_eq!(r.column_count, 2),
            _ => panic!("expected row"),
        }
    }

    #[test]
    fn unterminated_quote_at_true_eof_is_an_error() {
        let options = ParserOptions::default();
        let input = b"a,\"bc";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let err = parse_row(input, 0, 1, true, &options, &sentinels, &mut ends).unwrap_err();
        assert!(matches!(err, ParseError::Parse { .. }));
    }

    #[test]
    fn unterminated_quote_not_at_eof_requests_more_data() {
        let options = ParserOptions::default();
        let input = b"a,\"bc";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let outcome = parse_row(input, 0, 1, false, &options, &sentinels, &mut ends).unwrap();
        assert_eq!(outcome, RowOutcome::NeedMoreData);
    }

    #[test]
    fn distinct_escape_byte_does_not_require_doubling() {
        let options = ParserOptions::builder().escape(b'\\').build().unwrap();
        let input = b"\"say \\\"hi\\\"\",next";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let outcome = parse_row(input, 0, 1, true, &options, &sentinels, &mut ends).unwrap();
        match outcome {
            RowOutcome::Row(r) => assert_eq!(r.column_count, 2),
            _ => panic!("expected row"),
        }
    }

    #[test]
    fn empty_row_yields_single_empty_column() {
        let options = ParserOptions::default();
        let input = b"\n";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let outcome = parse_row(input, 0, 1, true, &options, &sentinels, &mut ends).unwrap();
        match outcome {
            RowOutcome::Row(r) => {
                assert_eq!(r.column_count, 1);
                assert_eq!(r.row_length, 0);
            }
            _ => panic!("expected row"),
        }
    }

    #[test]
    fn too_many_columns_raises() {
        let options = ParserOptions::builder().max_column_count(1).build().unwrap();
        let input = b"a,b,c";
        let sentinels = scanner::scan(input, b',', b'"', false);
        let mut ends = Vec::new();
        let err = parse_row(input, 0, 1, true, &options, &sentinels, &mut ends).unwrap_err();
        assert!(matches!(err, ParseError::TooManyColumns { .. }));
    }
}
