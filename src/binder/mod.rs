//! C7: record binder (`spec.md` §4.6).
//!
//! Binds a [`RowView`] to a caller-defined record type `T`, resolving
//! header-named columns once and then running the per-row conversion loop.
//! Error routing replaces the source's throw/catch-per-field control flow
//! with an explicit [`ErrorHandlerAction`] match, per the design note
//! "Exceptions for control flow".

mod converters;
mod descriptor;
mod registry;

pub use converters::FromField;
pub use descriptor::{ColumnLocator, FieldDescriptor, RecordDescriptor};
pub use registry::{resolve_field, resolve_field_with_format, ConverterRegistry};

use crate::error::{BindLocation, ParseError, Result};
use crate::row_view::{OwnedRow, RowView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorHandlerAction {
    Throw,
    SkipRow,
    UseDefault,
}

pub enum BindOutcome<T> {
    Bound(T),
    SkippedRow,
}

type ErrorHandler = Box<dyn Fn(&ParseError) -> ErrorHandlerAction + Send + Sync>;

pub struct Binder<T> {
    descriptor: RecordDescriptor<T>,
    registry: ConverterRegistry,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    error_handler: ErrorHandler,
    quote: u8,
    escape: u8,
}

impl<T> Binder<T> {
    pub fn new(descriptor: RecordDescriptor<T>, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Binder {
            descriptor,
            registry: ConverterRegistry::new(),
            factory: Box::new(factory),
            error_handler: Box::new(|_| ErrorHandlerAction::Throw),
            quote: b'"',
            escape: b'"',
        }
    }

    pub fn with_converters(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_error_handler(mut self, handler: impl Fn(&ParseError) -> ErrorHandlerAction + Send + Sync + 'static) -> Self {
        self.error_handler = Box::new(handler);
        self
    }

    pub fn with_quote_escape(mut self, quote: u8, escape: u8) -> Self {
        self.quote = quote;
        self.escape = escape;
        self
    }

    pub fn resolve_header(&mut self, header: &OwnedRow) -> Result<()> {
        self.descriptor.resolve_header(header)
    }

    /// Bind one row to a fresh `T`. Column indices must already be resolved
    /// via [`Binder::resolve_header`] for any header-bound fields.
    pub fn bind(&self, row: &RowView, row_number: u64) -> Result<BindOutcome<T>> {
        let mut record = (self.factory)();

        for field in &self.descriptor.fields {
            let idx = field.resolved_index.filter(|&i| i < row.column_count());

            let Some(idx) = idx else {
                if field.required && !self.descriptor.allow_missing_columns() {
                    let err = missing_column_error(row_number, field.member_name);
                    match (self.error_handler)(&err) {
                        ErrorHandlerAction::Throw => return Err(err),
                        ErrorHandlerAction::SkipRow => return Ok(BindOutcome::SkippedRow),
                        ErrorHandlerAction::UseDefault => continue,
                    }
                }
                continue;
            };

            let raw = row.raw_column(idx).unwrap_or(&[]);
            let value = match row.column(idx, self.quote, self.escape) {
                Some(v) => v,
                None => continue,
            };

            if field.is_null(&value) {
                continue;
            }

            if let Err(e) = field.invoke(&mut record, &value, &self.registry) {
                let located = attach_location(e, row_number, idx as i64, field.member_name, raw);
                let action = (self.error_handler)(&located);
                tracing::debug!(row = row_number, member = field.member_name, ?action, "binder error handler decision");
                match action {
                    ErrorHandlerAction::Throw => return Err(located),
                    ErrorHandlerAction::SkipRow => return Ok(BindOutcome::SkippedRow),
                    ErrorHandlerAction::UseDefault => continue,
                }
            }
        }

        Ok(BindOutcome::Bound(record))
    }
}

fn missing_column_error(row: u64, member_name: &str) -> ParseError {
    ParseError::Parse {
        location: BindLocation {
            row,
            column: -1,
            member_name: Some(member_name.to_string()),
            field_value: None,
            quote_start_position: None,
        },
        message: "required column not found in row".to_string(),
        cause: None,
    }
}

fn attach_location(e: ParseError, row: u64, column: i64, member_name: &str, raw: &[u8]) -> ParseError {
    match e {
        ParseError::Parse { message, cause, .. } => ParseError::Parse {
            location: BindLocation {
                row,
                column,
                member_name: Some(member_name.to_string()),
                field_value: Some(raw.to_vec()),
                quote_start_position: None,
            },
            message,
            cause,
        },
        other => other,
    }
}
