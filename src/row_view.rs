//! Row view (`spec.md` §3 "Row view", GLOSSARY "Row view" / "Column ends").
//!
//! A non-owning borrow of one row's bytes plus its column-end indices.
//! `ends[0] == -1`; `ends[column_count] == row_length`; strictly increasing.
//! Column *k*'s bytes are `row[ends[k]+1 .. ends[k+1]]`.

use std::borrow::Cow;

use crate::options::ParserOptions;

/// A single row, borrowed from the reader's current buffer. Valid only until
/// the next `advance()` of the owning reader (`spec.md` §3 invariants).
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    row: &'a [u8],
    ends: &'a [i64],
    trim_fields: bool,
}

impl<'a> RowView<'a> {
    pub fn new(row: &'a [u8], ends: &'a [i64], trim_fields: bool) -> Self {
        debug_assert_eq!(ends[0], -1);
        debug_assert_eq!(ends.last().copied().unwrap_or(-1), row.len() as i64);
        RowView { row, ends, trim_fields }
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.ends.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.column_count() == 0
    }

    /// Raw bytes of column `k`, quotes and all — unquoting is a read-time
    /// transformation (`spec.md` §3 invariants).
    pub fn raw_column(&self, k: usize) -> Option<&'a [u8]> {
        if k >= self.column_count() {
            return None;
        }
        let start = (self.ends[k] + 1) as usize;
        let end = self.ends[k + 1] as usize;
        Some(&self.row[start..end])
    }

    /// Column `k`'s bytes with surrounding quotes stripped and doubled quotes
    /// collapsed, allocating only when unescaping is actually needed.
    pub fn column(&self, k: usize, quote: u8, escape: u8) -> Option<Cow<'a, [u8]>> {
        let raw = self.raw_column(k)?;
        let unquoted = crate::field::extract_field_cow(raw, quote, escape);
        Some(if self.trim_fields && !is_quoted(raw, quote) {
            Cow::Owned(trim_ascii_whitespace(&unquoted).to_vec())
        } else {
            unquoted
        })
    }

    /// Column lookup using a [`ParserOptions`] for quote/escape/trim settings.
    pub fn column_with_options(&self, k: usize, options: &ParserOptions) -> Option<Cow<'a, [u8]>> {
        self.column(k, options.quote, options.escape)
    }

    pub fn row_bytes(&self) -> &'a [u8] {
        self.row
    }

    pub fn ends(&self) -> &'a [i64] {
        self.ends
    }

    /// Copy this view into an owned, independently-lifetimed row. Required
    /// before retaining a row past the next `advance()` (`spec.md` §3).
    pub fn to_owned_row(&self, quote: u8, escape: u8) -> OwnedRow {
        let fields = (0..self.column_count())
            .map(|k| {
                self.column(k, quote, escape)
                    .unwrap_or_else(|| unreachable!("k ranges within column_count"))
                    .into_owned()
            })
            .collect();
        OwnedRow { fields }
    }
}

fn is_quoted(raw: &[u8], quote: u8) -> bool {
    raw.len() >= 2 && raw[0] == quote && raw[raw.len() - 1] == quote
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |p| p + 1);
    &bytes[start..end]
}

/// An owned copy of a row's fields, for callers that need to retain data past
/// the reader's next advance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OwnedRow {
    pub fields: Vec<Vec<u8>>,
}

impl OwnedRow {
    pub fn column(&self, k: usize) -> Option<&[u8]> {
        self.fields.get(k).map(|v| v.as_slice())
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_slicing_respects_ends_convention() {
        let row = b"a,bb,ccc";
        let ends = [-1i64, 1, 4, 8];
        let view = RowView::new(row, &ends, false);
        assert_eq!(view.column_count(), 3);
        assert_eq!(view.raw_column(0), Some(&b"a"[..]));
        assert_eq!(view.raw_column(1), Some(&b"bb"[..]));
        assert_eq!(view.raw_column(2), Some(&b"ccc"[..]));
        assert_eq!(view.raw_column(3), None);
    }

    #[test]
    fn quoted_column_unescapes() {
        let row = b"\"a\"\"b\"";
        let ends = [-1i64, 6];
        let view = RowView::new(row, &ends, false);
        assert_eq!(view.column(0, b'"', b'"').unwrap().as_ref(), b"a\"b");
    }

    #[test]
    fn trim_applies_only_outside_quotes() {
        let row = b"  x  ,\"  y  \"";
        let ends = [-1i64, 5, 13];
        let view = RowView::new(row, &ends, true);
        assert_eq!(view.column(0, b'"', b'"').unwrap().as_ref(), b"x");
        assert_eq!(view.column(1, b'"', b'"').unwrap().as_ref(), b"  y  ");
    }

    #[test]
    fn to_owned_row_survives_source_drop() {
        let owned = {
            let row = b"a,b".to_vec();
            let ends = [-1i64, 1, 3];
            let view = RowView::new(&row, &ends, false);
            view.to_owned_row(b'"', b'"')
        };
        assert_eq!(owned.column(0), Some(&b"a"[..]));
        assert_eq!(owned.column(1), Some(&b"b"[..]));
    }
}
