//! Built-in typed field converters (`spec.md` §4.6 "Typed conversion").
//!
//! Every converter reads directly from the field's byte slice; `str::from_utf8`
//! validates without allocating, so only the `String`/`Vec<u8>` targets ever
//! own a heap buffer. Grounded on the `FromSql` conversion trait shape from
//! the driver's type layer, retargeted from wire values to byte slices.

use crate::error::{ParseError, Result};

fn as_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| conversion_error(bytes, "valid UTF-8"))
}

fn conversion_error(bytes: &[u8], expected: &str) -> ParseError {
    ParseError::Parse {
        location: crate::error::BindLocation {
            row: 0,
            column: -1,
            member_name: None,
            field_value: Some(bytes.to_vec()),
            quote_start_position: None,
        },
        message: format!("expected {expected}"),
        cause: None,
    }
}

/// Converts a field's byte slice into a typed value. Implemented for every
/// built-in target type `spec.md` §4.6 lists; custom targets register a
/// converter in a [`super::ConverterRegistry`] instead of implementing this
/// trait (the registry is checked first and shadows these impls).
pub trait FromField: Sized {
    fn from_field(bytes: &[u8]) -> Result<Self>;

    /// Same conversion, honouring a per-field format string (`spec.md` §4.6
    /// "dates ... with optional format string"). Types with no notion of a
    /// format (integers, bools, strings) ignore it and defer to
    /// [`FromField::from_field`]; date/time types override this.
    fn from_field_with_format(bytes: &[u8], _format: Option<&str>) -> Result<Self> {
        Self::from_field(bytes)
    }
}

macro_rules! impl_from_field_int {
    ($($t:ty),+) => {
        $(
            impl FromField for $t {
                fn from_field(bytes: &[u8]) -> Result<Self> {
                    as_str(bytes)?
                        .trim()
                        .parse::<$t>()
                        .map_err(|_| conversion_error(bytes, concat!("a valid ", stringify!($t))))
                }
            }
        )+
    };
}

impl_from_field_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_from_field_float {
    ($($t:ty),+) => {
        $(
            impl FromField for $t {
                fn from_field(bytes: &[u8]) -> Result<Self> {
                    as_str(bytes)?
                        .trim()
                        .parse::<$t>()
                        .map_err(|_| conversion_error(bytes, concat!("a valid ", stringify!($t))))
                }
            }
        )+
    };
}

impl_from_field_float!(f32, f64);

impl FromField for bool {
    fn from_field(bytes: &[u8]) -> Result<Self> {
        let s = as_str(bytes)?.trim();
        if s.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if s.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(conversion_error(bytes, "\"True\" or \"False\""))
        }
    }
}

impl FromField for String {
    fn from_field(bytes: &[u8]) -> Result<Self> {
        as_str(bytes).map(|s| s.to_string())
    }
}

impl FromField for Vec<u8> {
    fn from_field(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    impl FromField for NaiveDate {
        fn from_field(bytes: &[u8]) -> Result<Self> {
            NaiveDate::parse_from_str(as_str(bytes)?.trim(), "%Y-%m-%d")
                .map_err(|_| conversion_error(bytes, "a date in YYYY-MM-DD format"))
        }

        fn from_field_with_format(bytes: &[u8], format: Option<&str>) -> Result<Self> {
            match format {
                None => Self::from_field(bytes),
                Some(fmt) => NaiveDate::parse_from_str(as_str(bytes)?.trim(), fmt)
                    .map_err(|_| conversion_error(bytes, "a date matching the configured format")),
            }
        }
    }

    impl FromField for NaiveTime {
        fn from_field(bytes: &[u8]) -> Result<Self> {
            NaiveTime::parse_from_str(as_str(bytes)?.trim(), "%H:%M:%S")
                .map_err(|_| conversion_error(bytes, "a time in HH:MM:SS format"))
        }

        fn from_field_with_format(bytes: &[u8], format: Option<&str>) -> Result<Self> {
            match format {
                None => Self::from_field(bytes),
                Some(fmt) => NaiveTime::parse_from_str(as_str(bytes)?.trim(), fmt)
                    .map_err(|_| conversion_error(bytes, "a time matching the configured format")),
            }
        }
    }

    impl FromField for NaiveDateTime {
        fn from_field(bytes: &[u8]) -> Result<Self> {
            let s = as_str(bytes)?.trim();
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map_err(|_| conversion_error(bytes, "a date-time in YYYY-MM-DD HH:MM:SS format"))
        }

        fn from_field_with_format(bytes: &[u8], format: Option<&str>) -> Result<Self> {
            match format {
                None => Self::from_field(bytes),
                Some(fmt) => NaiveDateTime::parse_from_str(as_str(bytes)?.trim(), fmt)
                    .map_err(|_| conversion_error(bytes, "a date-time matching the configured format")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_trimmed() {
        assert_eq!(i32::from_field(b" 42 ").unwrap(), 42);
    }

    #[test]
    fn parses_floats() {
        assert_eq!(f64::from_field(b"50.00").unwrap(), 50.0);
    }

    #[test]
    fn parses_bool_case_insensitively() {
        assert!(bool::from_field(b"TRUE").unwrap());
        assert!(!bool::from_field(b"false").unwrap());
    }

    #[test]
    fn rejects_garbage_integers() {
        assert!(i32::from_field(b"not a number").is_err());
    }

    #[test]
    fn string_decodes_utf8() {
        assert_eq!(String::from_field("héllo".as_bytes()).unwrap(), "héllo");
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn parses_iso_date() {
        use chrono::NaiveDate;
        let d = NaiveDate::from_field(b"2024-01-01").unwrap();
        assert_eq!(d.to_string(), "2024-01-01");
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn parses_date_with_custom_format() {
        use chrono::NaiveDate;
        let d = NaiveDate::from_field_with_format(b"01/31/2024", Some("%m/%d/%Y")).unwrap();
        assert_eq!(d.to_string(), "2024-01-31");
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn custom_format_rejects_default_layout() {
        use chrono::NaiveDate;
        assert!(NaiveDate::from_field_with_format(b"2024-01-31", Some("%m/%d/%Y")).is_err());
    }
}
