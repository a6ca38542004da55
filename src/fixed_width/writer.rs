//! Fixed-width record writing (`spec.md` §3 "Fixed-width field layout",
//! writer direction).

use crate::error::{ParseError, Result};
use crate::fixed_width::layout::{Alignment, FieldLayout, FixedWidthLayout, OverflowBehavior};

/// What to do with a row whose formatting failed (distinct from the
/// per-field [`OverflowBehavior`], which governs width overflow only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeErrorAction {
    Throw,
    SkipRow,
    WriteEmpty,
}

/// Truncate `value` to `width` bytes, cutting from the side opposite the
/// field's alignment: a left-aligned field keeps its leading bytes and
/// drops the tail, a right-aligned field keeps its trailing bytes and
/// drops the head, a centered field drops evenly from both ends.
fn truncate_for_overflow<'a>(value: &'a [u8], width: usize, alignment: Alignment) -> &'a [u8] {
    let excess = value.len() - width;
    match alignment {
        Alignment::Left => &value[..width],
        Alignment::Right => &value[excess..],
        Alignment::Center => {
            let drop_front = excess / 2;
            let drop_back = excess - drop_front;
            &value[drop_front..value.len() - drop_back]
        }
    }
}

/// Write `value` (already within `field.length`) into `out[field.start..]`,
/// padding with `field.pad` on the side(s) its alignment calls for. A
/// centered field splits padding with the smaller half first (floor) and
/// the larger half last (ceiling).
fn apply_aligned(out: &mut [u8], field: &FieldLayout, value: &[u8]) {
    let slot = &mut out[field.start..field.start + field.length];
    let pad_total = field.length - value.len();
    match field.alignment {
        Alignment::Left => {
            slot[..value.len()].copy_from_slice(value);
            slot[value.len()..].fill(field.pad);
        }
        Alignment::Right => {
            slot[..pad_total].fill(field.pad);
            slot[pad_total..].copy_from_slice(value);
        }
        Alignment::Center => {
            let left_pad = pad_total / 2;
            let right_pad = pad_total - left_pad;
            slot[..left_pad].fill(field.pad);
            slot[left_pad..left_pad + value.len()].copy_from_slice(value);
            slot[left_pad + value.len()..].fill(field.pad);
            debug_assert_eq!(right_pad, field.length - left_pad - value.len());
        }
    }
}

/// Writes formatted field values into fixed-width records against a
/// [`FixedWidthLayout`], enforcing `max_output_size`/`max_row_count` the
/// same way the streaming reader enforces `max_row_size`/`max_row_count`.
pub struct FixedWidthWriter<'a> {
    layout: &'a FixedWidthLayout,
    overflow: OverflowBehavior,
    on_serialize_error: SerializeErrorAction,
    max_output_size: Option<u64>,
    max_row_count: Option<u64>,
    bytes_written: u64,
    rows_written: u64,
}

impl<'a> FixedWidthWriter<'a> {
    pub fn new(layout: &'a FixedWidthLayout, overflow: OverflowBehavior) -> Self {
        FixedWidthWriter {
            layout,
            overflow,
            on_serialize_error: SerializeErrorAction::Throw,
            max_output_size: None,
            max_row_count: None,
            bytes_written: 0,
            rows_written: 0,
        }
    }

    pub fn with_max_output_size(mut self, limit: u64) -> Self {
        self.max_output_size = Some(limit);
        self
    }

    pub fn with_max_row_count(mut self, limit: u64) -> Self {
        self.max_row_count = Some(limit);
        self
    }

    /// Set what happens to a row that fails to serialize (`spec.md` §4.7).
    /// Distinct from [`OverflowBehavior`], which governs a single
    /// over-width field; this governs the whole row once that per-field
    /// policy (or `max_output_size`) turns into an error.
    pub fn with_serialize_error_handler(mut self, action: SerializeErrorAction) -> Self {
        self.on_serialize_error = action;
        self
    }

    /// Format one record: `values` must be in layout field order. Returns
    /// `Ok(None)` when the row failed to serialize and
    /// `on_serialize_error` is `SkipRow`.
    pub fn write_record(&mut self, values: &[&[u8]]) -> Result<Option<Vec<u8>>> {
        if let Some(limit) = self.max_row_count {
            if self.rows_written >= limit {
                return Err(ParseError::TooManyRows { row: self.rows_written + 1 });
            }
        }
        if values.len() != self.layout.fields.len() {
            return Err(ParseError::InvalidOptions {
                option: "fixed_width_layout",
                detail: format!("expected {} values, got {}", self.layout.fields.len(), values.len()),
            });
        }

        let mut out = vec![self.layout.default_pad; self.layout.record_length];
        for (field, value) in self.layout.fields.iter().zip(values.iter()) {
            let value = if value.len() > field.length {
                match self.overflow {
                    OverflowBehavior::Throw => {
                        let err = ParseError::FieldOverflow {
                            row: self.rows_written + 1,
                            field: field.name.clone(),
                            width: field.length,
                            formatted_len: value.len(),
                        };
                        return self.handle_serialize_error(err);
                    }
                    OverflowBehavior::Truncate => truncate_for_overflow(value, field.length, field.alignment),
                }
            } else {
                value
            };
            apply_aligned(&mut out, field, value);
        }

        self.rows_written += 1;
        self.bytes_written += out.len() as u64;
        if let Some(limit) = self.max_output_size {
            if self.bytes_written > limit {
                let err = ParseError::OutputSizeExceeded { current: self.bytes_written, limit };
                return self.handle_serialize_error(err);
            }
        }
        Ok(Some(out))
    }

    fn handle_serialize_error(&mut self, err: ParseError) -> Result<Option<Vec<u8>>> {
        match self.on_serialize_error {
            SerializeErrorAction::Throw => Err(err),
            SerializeErrorAction::SkipRow => {
                tracing::debug!(error = %err, "skipping row after serialize error");
                Ok(None)
            }
            SerializeErrorAction::WriteEmpty => {
                tracing::debug!(error = %err, "writing empty record after serialize error");
                Ok(Some(vec![self.layout.default_pad; self.layout.record_length]))
            }
        }
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
    fn formats_left_and_right_aligned_fields() {
        let layout = layout();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Truncate);
        let record = writer.write_record(&[b"Jo", b"42"]).unwrap().unwrap();
        assert_eq!(record, b"Jo   0042");
    }

    #[test]
    fn throw_overflow_raises_field_overflow_error() {
        let layout = layout();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Throw);
        let err = writer.write_record(&[b"TooLong", b"42"]).unwrap_err();
        assert!(matches!(err, ParseError::FieldOverflow { .. }));
    }

    #[test]
    fn truncate_overflow_drops_from_side_opposite_alignment() {
        let layout = layout();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Truncate);
        let record = writer.write_record(&[b"TooLong", b"99999"]).unwrap().unwrap();
        assert_eq!(&record[..5], b"TooLo");
        assert_eq!(&record[5..], b"9999");
    }

    #[test]
    fn centered_field_splits_padding_floor_left_ceiling_right() {
        let layout = FixedWidthLayout::new(vec![FieldLayout::new("mid", 0, 7, Alignment::Center, b' ')], b' ').unwrap();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Truncate);
        let record = writer.write_record(&[b"mid"]).unwrap().unwrap();
        assert_eq!(record, b"  mid  ");
    }

    #[test]
    fn max_row_count_enforced() {
        let layout = layout();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Truncate).with_max_row_count(1);
        writer.write_record(&[b"Jo", b"42"]).unwrap();
        assert!(writer.write_record(&[b"Jo", b"42"]).is_err());
    }

    #[test]
    fn max_output_size_enforced() {
        let layout = layout();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Truncate).with_max_output_size(9);
        writer.write_record(&[b"Jo", b"42"]).unwrap();
        assert!(writer.write_record(&[b"Jo", b"42"]).is_err());
    }

    #[test]
    fn skip_row_handler_swallows_a_field_overflow_as_none() {
        let layout = layout();
        let mut writer =
            FixedWidthWriter::new(&layout, OverflowBehavior::Throw).with_serialize_error_handler(SerializeErrorAction::SkipRow);
        let outcome = writer.write_record(&[b"TooLong", b"42"]).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn write_empty_handler_substitutes_a_blank_padded_record() {
        let layout = layout();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Throw)
            .with_serialize_error_handler(SerializeErrorAction::WriteEmpty);
        let record = writer.write_record(&[b"TooLong", b"42"]).unwrap().unwrap();
        assert_eq!(record, b"         ");
    }

    #[test]
    fn throw_handler_is_the_default_and_still_propagates() {
        let layout = layout();
        let mut writer = FixedWidthWriter::new(&layout, OverflowBehavior::Throw);
        assert!(writer.write_record(&[b"TooLong", b"42"]).is_err());
    }
}
