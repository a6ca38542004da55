//! Fixed-width record reading (`spec.md` §3 "Fixed-width field layout",
//! reader direction).

use crate::binder::{ConverterRegistry, FromField};
use crate::error::{BindLocation, ParseError, Result};
use crate::fixed_width::layout::{Alignment, FieldLayout, FixedWidthLayout};

fn trim_trailing(bytes: &[u8], pad: u8) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != pad).map(|i| i + 1).unwrap_or(0);
    &bytes[..end]
}

fn trim_leading(bytes: &[u8], pad: u8) -> &[u8] {
    let start = bytes.iter().position(|&b| b != pad).unwrap_or(bytes.len());
    &bytes[start..]
}

fn trim_both(bytes: &[u8], pad: u8) -> &[u8] {
    trim_leading(trim_trailing(bytes, pad), pad)
}

/// Strip `field`'s padding, direction determined by its alignment: a
/// left-aligned field pads on the right, a right-aligned field pads on the
/// left, a centered field pads (potentially) on both sides.
fn trim_aligned<'a>(bytes: &'a [u8], field: &FieldLayout) -> &'a [u8] {
    match field.alignment {
        Alignment::Left => trim_trailing(bytes, field.pad),
        Alignment::Right => trim_leading(bytes, field.pad),
        Alignment::Center => trim_both(bytes, field.pad),
    }
}

fn length_error(record_len: usize, expected: usize) -> ParseError {
    ParseError::Parse {
        location: BindLocation {
            row: 0,
            column: -1,
            member_name: None,
            field_value: None,
            quote_start_position: None,
        },
        message: format!("record length {record_len} does not match layout's record_length {expected}"),
        cause: None,
    }
}

/// Reads fixed-width records against a [`FixedWidthLayout`]: slices each
/// field's byte span and trims its padding according to its alignment.
pub struct FixedWidthReader<'a> {
    layout: &'a FixedWidthLayout,
}

impl<'a> FixedWidthReader<'a> {
    pub fn new(layout: &'a FixedWidthLayout) -> Self {
        FixedWidthReader { layout }
    }

    /// Split `record` into its fields' trimmed byte slices, in layout order.
    pub fn read_record<'r>(&self, record: &'r [u8]) -> Result<Vec<&'r [u8]>> {
        if record.len() != self.layout.record_length {
            return Err(length_error(record.len(), self.layout.record_length));
        }
        Ok(self
            .layout
            .fields
            .iter()
            .map(|field| trim_aligned(&record[field.start..field.start + field.length], field))
            .collect())
    }

    /// Convert one named field of `record` to `V`, preferring a registered
    /// custom converter and falling back to `V::from_field`.
    pub fn field_value<V: FromField + 'static>(&self, record: &[u8], name: &str, registry: &ConverterRegistry) -> Result<V> {
        let field = self.layout.field(name).ok_or_else(|| ParseError::InvalidOptions {
            option: "fixed_width_layout",
            detail: format!("no field named `{name}`"),
        })?;
        let bytes = trim_aligned(&record[field.start..field.start + field.length], field);
        crate::binder::resolve_field::<V>(registry, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_width::layout::FieldLayout;

    fn layout() -> FixedWidthLayout {
        FixedWidthLayout::new(
            vec![
                FieldLayout::new("name", 0, 5, Alignment::Left, b' '),
                FieldLayout::new("amount", 5, 4, Alignment::Right, b'0'),
            ],
            b' ',
        )
        .unwrap()
    }

    #[test]
    fn trims_left_aligned_field() {
        let layout = layout();
        let reader = FixedWidthReader::new(&layout);
        let fields = reader.read_record(b"Jo   0042").unwrap();
        assert_eq!(fields[0], b"Jo");
    }

    #[test]
    fn trims_right_aligned_field() {
        let layout = layout();
        let reader = FixedWidthReader::new(&layout);
        let fields = reader.read_record(b"Jo   0042").unwrap();
        assert_eq!(fields[1], b"42");
    }

    #[test]
    fn centered_field_trims_both_sides() {
        let layout = FixedWidthLayout::new(vec![FieldLayout::new("mid", 0, 6, Alignment::Center, b' ')], b' ').unwrap();
        let reader = FixedWidthReader::new(&layout);
        let fields = reader.read_record(b" mid  ").unwrap();
        assert_eq!(fields[0], b"mid");
    }

    #[test]
    fn rejects_wrong_record_length() {
        let layout = layout();
        let reader = FixedWidthReader::new(&layout);
        assert!(reader.read_record(b"short").is_err());
    }
}
