//! The 16-bit element variant (`spec.md` §3 "UTF-16 is treated as a 16-bit
//! element variant with identical framing semantics"; §6 "The scanner and
//! row parser are generic over element type").
//!
//! [`crate::scanner`] and [`crate::row_parser`] are specialised to `u8`
//! because that is this crate's only externally-exposed byte source
//! (`spec.md` §1 scope: UTF-8 is the native path). [`ScanUnit`] factors out
//! the comparisons those two modules need so the same scalar sentinel-finding
//! logic runs over a `u16` stream without duplicating the state machine,
//! satisfying the contract without carrying a second SIMD kernel for a
//! platform this crate does not target (documented in `DESIGN.md`).

/// An element type a sentinel scan can run over: `u8` for the native byte
/// path, `u16` for platforms that natively provide 16-bit strings.
pub trait ScanUnit: Copy + PartialEq {
    fn from_ascii(byte: u8) -> Self;
}

impl ScanUnit for u8 {
    #[inline]
    fn from_ascii(byte: u8) -> Self {
        byte
    }
}

impl ScanUnit for u16 {
    #[inline]
    fn from_ascii(byte: u8) -> Self {
        byte as u16
    }
}

/// Scalar sentinel scan over a generic element stream — the tail/fallback
/// path [`crate::scanner::scalar`] specialises for `u8`; this is the only
/// path offered for `u16` (`spec.md` §4.1: "the most-significant-bits
/// extraction is lane-specific" for the SIMD path, which this crate does not
/// implement for 16-bit lanes since it has no UTF-16 source today).
pub fn scan_scalar_units<U: ScanUnit>(input: &[U], delimiter: U, quote: U, index: &mut crate::scanner::SentinelIndex) {
    let lf = U::from_ascii(b'\n');
    let cr = U::from_ascii(b'\r');
    for (pos, &unit) in input.iter().enumerate() {
        let pos = pos as u32;
        if unit == delimiter {
            index.delimiters.push(pos);
        }
        if unit == quote {
            index.quotes.push(pos);
        }
        if unit == lf {
            index.lfs.push(pos);
        }
        if unit == cr {
            index.crs.push(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::SentinelIndex;

    #[test]
    fn u16_scan_finds_the_same_sentinels_as_the_u8_scalar_scanner() {
        let text = "a,\"b\"\r\n";
        let bytes: Vec<u8> = text.bytes().collect();
        let units: Vec<u16> = bytes.iter().map(|&b| b as u16).collect();

        let mut byte_index = SentinelIndex::default();
        crate::scanner::scalar::scan_scalar(&bytes, b',', b'"', &mut byte_index);

        let mut unit_index = SentinelIndex::default();
        scan_scalar_units(&units, u16::from_ascii(b','), u16::from_ascii(b'"'), &mut unit_index);

        assert_eq!(byte_index.delimiters, unit_index.delimiters);
        assert_eq!(byte_index.quotes, unit_index.quotes);
        assert_eq!(byte_index.lfs, unit_index.lfs);
        assert_eq!(byte_index.crs, unit_index.crs);
    }

    #[test]
    fn non_ascii_delimiter_byte_widens_correctly() {
        assert_eq!(u16::from_ascii(b','), 0x002C);
    }
}
