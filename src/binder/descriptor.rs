//! Record descriptor (`spec.md` §3 "Record descriptor (binder-side)", §4.6
//! "Header resolution").
//!
//! A function-pointer-based descriptor, per the design note's alternative
//! (b) to compiled expression-tree setters: each field carries a closure
//! built once by [`FieldDescriptor::field`] that knows how to convert and
//! assign its own column, so there is no per-row reflection.

use crate::binder::registry::{resolve_field_with_format, ConverterRegistry};
use crate::binder::FromField;
use crate::error::{ParseError, Result};
use crate::row_view::OwnedRow;

/// Where a field's column lives: a fixed position, or a header name resolved
/// once against the header row.
#[derive(Debug, Clone)]
pub enum ColumnLocator {
    Index(usize),
    Name(String),
}

pub struct FieldDescriptor<T> {
    pub member_name: &'static str,
    pub column: ColumnLocator,
    pub required: bool,
    pub null_values: Vec<Vec<u8>>,
    pub format: Option<String>,
    pub(crate) resolved_index: Option<usize>,
    setter: Box<dyn Fn(&mut T, &[u8], &ConverterRegistry, Option<&str>) -> Result<()> + Send + Sync>,
}

impl<T> FieldDescriptor<T> {
    /// Build a field descriptor whose setter converts the column's bytes to
    /// `V` (via a registered custom converter, or `V`'s [`FromField`] impl)
    /// and hands the value to `assign`.
    pub fn field<V>(
        member_name: &'static str,
        column: ColumnLocator,
        required: bool,
        assign: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self
    where
        V: FromField + 'static,
    {
        let resolved_index = match &column {
            ColumnLocator::Index(i) => Some(*i),
            ColumnLocator::Name(_) => None,
        };
        FieldDescriptor {
            member_name,
            column,
            required,
            null_values: Vec::new(),
            format: None,
            resolved_index,
            setter: Box::new(move |target, bytes, registry, format| {
                let value = resolve_field_with_format::<V>(registry, bytes, format)?;
                assign(target, value);
                Ok(())
            }),
        }
    }

    pub fn null_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.null_values.push(value.into());
        self
    }

    /// Set a format string consulted by date/time conversions (`spec.md`
    /// §4.6). Ignored by target types with no notion of a format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub(crate) fn is_null(&self, bytes: &[u8]) -> bool {
        self.null_values.iter().any(|v| v.as_slice() == bytes)
    }

    pub(crate) fn invoke(&self, target: &mut T, bytes: &[u8], registry: &ConverterRegistry) -> Result<()> {
        (self.setter)(target, bytes, registry, self.format.as_deref())
    }
}

pub struct RecordDescriptor<T> {
    pub(crate) fields: Vec<FieldDescriptor<T>>,
    resolved: bool,
    allow_missing_columns: bool,
    case_sensitive: bool,
}

impl<T> RecordDescriptor<T> {
    pub fn new(fields: Vec<FieldDescriptor<T>>, allow_missing_columns: bool, case_sensitive: bool) -> Self {
        RecordDescriptor {
            fields,
            resolved: false,
            allow_missing_columns,
            case_sensitive,
        }
    }

    pub fn allow_missing_columns(&self) -> bool {
        self.allow_missing_columns
    }

    /// Resolve every `ColumnLocator::Name` field against `header`'s columns.
    /// A no-op on the second and later calls (`spec.md` §3 "header
    /// resolution mutates once, then frozen").
    pub fn resolve_header(&mut self, header: &OwnedRow) -> Result<()> {
        if self.resolved {
            return Ok(());
        }
        for field in &mut self.fields {
            if let ColumnLocator::Name(name) = &field.column {
                let idx = (0..header.column_count()).find(|&i| {
                    let col = header.column(i).unwrap_or(&[]);
                    if self.case_sensitive {
                        col == name.as_bytes()
                    } else {
                        col.eq_ignore_ascii_case(name.as_bytes())
                    }
                });
                match idx {
                    Some(i) => field.resolved_index = Some(i),
                    None if field.required && !self.allow_missing_columns => {
                        return Err(ParseError::required_column_missing(field.member_name));
                    }
                    None => field.resolved_index = None,
                }
            }
        }
        self.resolved = true;
        Ok(())
    }
}
