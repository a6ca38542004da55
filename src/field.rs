//! Field extraction and quote handling.
//!
//! Generalises the teacher's `core/field.rs`: the teacher only supports
//! `escape == quote` (RFC 4180 doubled-quote semantics folded into the same
//! byte). `spec.md` §3 allows `escape` to differ from `quote`, in which case
//! `escape` is a literal prefix rather than a doubled sentinel.

use std::borrow::Cow;

/// Unescape a quoted field's inner bytes.
///
/// When `escape == quote` (RFC 4180 mode): a doubled quote (`""`) collapses to
/// one literal quote. Otherwise: `escape` followed by `quote` collapses to a
/// literal `quote`, and a lone `escape` is dropped (it only exists to escape
/// the next byte).
pub fn unescape_field(inner: &[u8], quote: u8, escape: u8) -> Vec<u8> {
    let mut result = Vec::with_capacity(inner.len());
    let mut i = 0;
    if escape == quote {
        while i < inner.len() {
            if inner[i] == escape && i + 1 < inner.len() && inner[i + 1] == quote {
                result.push(quote);
                i += 2;
            } else {
                result.push(inner[i]);
                i += 1;
            }
        }
    } else {
        while i < inner.len() {
            if inner[i] == escape && i + 1 < inner.len() {
                result.push(inner[i + 1]);
                i += 2;
            } else {
                result.push(inner[i]);
                i += 1;
            }
        }
    }
    result
}

/// Extract a field, stripping surrounding quotes and unescaping, without
/// allocating unless unescaping is actually required.
#[inline]
pub fn extract_field_cow(field: &[u8], quote: u8, escape: u8) -> Cow<'_, [u8]> {
    if field.len() < 2 || field[0] != quote || field[field.len() - 1] != quote {
        return Cow::Borrowed(field);
    }

    let inner = &field[1..field.len() - 1];
    let needs_unescape = if escape == quote {
        inner.contains(&escape)
    } else {
        inner.contains(&escape)
    };

    if !needs_unescape {
        Cow::Borrowed(inner)
    } else {
        Cow::Owned(unescape_field(inner, quote, escape))
    }
}

/// Extract a field's bytes from `input[start..end]`, stripping quotes but
/// without unescaping (for callers who only need the raw span).
#[inline]
pub fn extract_field_raw(input: &[u8], start: usize, end: usize, quote: u8) -> &[u8] {
    if start >= end {
        return &[];
    }
    let field = &input[start..end];
    if field.len() >= 2 && field[0] == quote && field[field.len() - 1] == quote {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_field_is_borrowed() {
        let result = extract_field_cow(b"hello", b'"', b'"');
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"hello");
    }

    #[test]
    fn doubled_quote_rfc4180() {
        let result = extract_field_cow(b"\"say \"\"hi\"\"\"", b'"', b'"');
        assert_eq!(result.as_ref(), b"say \"hi\"");
    }

    #[test]
    fn distinct_escape_prefix() {
        // escape='\\', quote='"': \" -> "
        let result = extract_field_cow(b"\"say \\\"hi\\\"\"", b'"', b'\\');
        assert_eq!(result.as_ref(), b"say \"hi\"");
    }

    #[test]
    fn empty_quoted_field() {
        let result = extract_field_cow(b"\"\"", b'"', b'"');
        assert_eq!(result.as_ref(), b"");
    }

    #[test]
    fn degenerate_bounds_do_not_panic() {
        assert_eq!(extract_field_raw(b"abc", 2, 1, b'"'), b"");
        assert_eq!(extract_field_raw(b"", 0, 0, b'"'), b"");
    }
}
