//! Error taxonomy (`spec.md` §7).
//!
//! One variant per error kind in the specification's table; each carries
//! exactly the data the spec lists for it. `ParseError` is the single public
//! error type returned by every fallible operation in this crate.

use std::fmt;

/// Where in a row binding failed, for [`ParseError::Parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindLocation {
    pub row: u64,
    pub column: i64,
    pub member_name: Option<String>,
    pub field_value: Option<Vec<u8>>,
    pub quote_start_position: Option<usize>,
}

impl fmt::Display for BindLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column {}", self.row, self.column)?;
        if let Some(name) = &self.member_name {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

/// The crate's single error type. Every variant corresponds to a row in
/// `spec.md` §7's error taxonomy table.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Illegal option combination, caught at `ParserOptionsBuilder::build`.
    #[error("invalid option `{option}`: {detail}")]
    InvalidOptions { option: &'static str, detail: String },

    /// `delimiter`/`quote` not ASCII.
    #[error("delimiter/quote byte {0:#04x} is not ASCII")]
    InvalidDelimiter(u8),

    /// Row exceeded `max_column_count`.
    #[error("row {row} exceeded max_column_count at column {column}")]
    TooManyColumns { row: u64, column: u64 },

    /// Document exceeded `max_row_count`.
    #[error("document exceeded max_row_count at row {row}")]
    TooManyRows { row: u64 },

    /// Fixed-width write exceeded field width.
    #[error("field `{field}` overflowed width {width} (formatted length {formatted_len})")]
    FieldOverflow {
        row: u64,
        field: String,
        width: usize,
        formatted_len: usize,
    },

    /// Generic parse or conversion failure.
    #[error("parse error at {location}: {message}")]
    Parse {
        location: BindLocation,
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// Writer exceeded `max_output_size`.
    #[error("output size {current} exceeded limit {limit}")]
    OutputSizeExceeded { current: u64, limit: u64 },

    /// Asynchronous operation cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Underlying I/O failure from a streaming source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn unterminated_quote(row: u64, quote_start_position: usize) -> Self {
        ParseError::Parse {
            location: BindLocation {
                row,
                column: -1,
                member_name: None,
                field_value: None,
                quote_start_position: Some(quote_start_position),
            },
            message: "unterminated quoted field".to_string(),
            cause: None,
        }
    }

    pub fn row_too_large(limit: usize) -> Self {
        ParseError::Parse {
            location: BindLocation {
                row: 0,
                column: -1,
                member_name: None,
                field_value: None,
                quote_start_position: None,
            },
            message: format!("row exceeds max size ({limit} bytes)"),
            cause: None,
        }
    }

    pub fn field_too_large(row: u64, column: u64, limit: usize) -> Self {
        ParseError::Parse {
            location: BindLocation {
                row,
                column: column as i64,
                member_name: None,
                field_value: None,
                quote_start_position: None,
            },
            message: format!("field exceeds max_field_size ({limit} bytes)"),
            cause: None,
        }
    }

    pub fn required_column_missing(member_name: &str) -> Self {
        ParseError::Parse {
            location: BindLocation {
                row: 1,
                column: 0,
                member_name: Some(member_name.to_string()),
                field_value: None,
                quote_start_position: None,
            },
            message: "required column not found".to_string(),
            cause: None,
        }
    }

    pub fn strict_stray_quote(row: u64, column: u64) -> Self {
        ParseError::Parse {
            location: BindLocation {
                row,
                column: column as i64,
                member_name: None,
                field_value: None,
                quote_start_position: None,
            },
            message: "quote character found mid-field in strict mode".to_string(),
            cause: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
