//! C8: fixed-width field layout (`spec.md` §4.7).
//!
//! A byte-offset record layout independent of the delimited scanner: given
//! `(start, length)` spans per field, [`FixedWidthReader`] slices and trims
//! padding, [`FixedWidthWriter`] pads and (optionally) truncates on write.

mod layout;
mod reader;
mod writer;

pub use layout::{Alignment, FieldLayout, FixedWidthLayout, OverflowBehavior};
pub use reader::FixedWidthReader;
pub use writer::{FixedWidthWriter, SerializeErrorAction};
