//! SIMD scan: 32-byte AVX2 lanes where available, 16-byte SSE-width lanes
//! otherwise, scalar tail. Mirrors the teacher's `core/simd_scanner.rs`
//! chunking strategy, generalised to four independent sentinel masks instead
//! of one prefix-XOR-folded quote mask (quote-state interpretation moved to
//! `crate::row_parser`, per this component's "does not interpret quote state"
//! contract).

use std::simd::prelude::*;

use super::{scalar::scan_scalar, SentinelIndex};

const CHUNK: usize = 16;
#[cfg(target_feature = "avx2")]
const WIDE: usize = 32;

#[inline]
pub fn available() -> bool {
    // `std::simd` lanes always compile on stable-ish nightly portable_simd;
    // this flag exists so callers (and the `use_simd_if_available` option)
    // have a single place to short-circuit to the scalar path.
    true
}

#[inline]
fn extract_positions(mut mask: u64, base_pos: u32, out: &mut Vec<u32>) {
    while mask != 0 {
        let bit = mask.trailing_zeros();
        out.push(base_pos + bit);
        mask &= mask - 1;
    }
}

pub fn scan_simd(input: &[u8], delimiter: u8, quote: u8, index: &mut SentinelIndex) {
    let mut pos: usize = 0;

    #[cfg(target_feature = "avx2")]
    {
        let delim_splat = Simd::<u8, WIDE>::splat(delimiter);
        let quote_splat = Simd::<u8, WIDE>::splat(quote);
        let lf_splat = Simd::<u8, WIDE>::splat(b'\n');
        let cr_splat = Simd::<u8, WIDE>::splat(b'\r');
        const MASK_32: u64 = (1u64 << 32) - 1;

        while pos + WIDE <= input.len() {
            let chunk = Simd::<u8, WIDE>::from_slice(&input[pos..pos + WIDE]);
            let base = pos as u32;

            let delim_bits = chunk.simd_eq(delim_splat).to_bitmask() & MASK_32;
            let quote_bits = chunk.simd_eq(quote_splat).to_bitmask() & MASK_32;
            let lf_bits = chunk.simd_eq(lf_splat).to_bitmask() & MASK_32;
            let cr_bits = chunk.simd_eq(cr_splat).to_bitmask() & MASK_32;

            extract_positions(delim_bits, base, &mut index.delimiters);
            extract_positions(quote_bits, base, &mut index.quotes);
            extract_positions(lf_bits, base, &mut index.lfs);
            extract_positions(cr_bits, base, &mut index.crs);

            pos += WIDE;
        }
    }

    {
        let delim_splat = Simd::<u8, CHUNK>::splat(delimiter);
        let quote_splat = Simd::<u8, CHUNK>::splat(quote);
        let lf_splat = Simd::<u8, CHUNK>::splat(b'\n');
        let cr_splat = Simd::<u8, CHUNK>::splat(b'\r');
        const MASK_16: u64 = (1u64 << 16) - 1;

        while pos + CHUNK <= input.len() {
            let chunk = Simd::<u8, CHUNK>::from_slice(&input[pos..pos + CHUNK]);
            let base = pos as u32;

            let delim_bits = chunk.simd_eq(delim_splat).to_bitmask() & MASK_16;
            let quote_bits = chunk.simd_eq(quote_splat).to_bitmask() & MASK_16;
            let lf_bits = chunk.simd_eq(lf_splat).to_bitmask() & MASK_16;
            let cr_bits = chunk.simd_eq(cr_splat).to_bitmask() & MASK_16;

            extract_positions(delim_bits, base, &mut index.delimiters);
            extract_positions(quote_bits, base, &mut index.quotes);
            extract_positions(lf_bits, base, &mut index.lfs);
            extract_positions(cr_bits, base, &mut index.crs);

            pos += CHUNK;
        }
    }

    // Scalar tail: re-use the scalar scanner, appending into the same index.
    scan_scalar_from(input, pos, delimiter, quote, index);
}

fn scan_scalar_from(input: &[u8], start: usize, delimiter: u8, quote: u8, index: &mut SentinelIndex) {
    let mut tail = SentinelIndex::default();
    scan_scalar(&input[start..], delimiter, quote, &mut tail);
    let base = start as u32;
    index.delimiters.extend(tail.delimiters.into_iter().map(|p| p + base));
    index.quotes.extend(tail.quotes.into_iter().map(|p| p + base));
    index.lfs.extend(tail.lfs.into_iter().map(|p| p + base));
    index.crs.extend(tail.crs.into_iter().map(|p| p + base));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_scalar_on_short_input() {
        let input = b"a,b\n";
        let mut simd_idx = SentinelIndex::default();
        scan_simd(input, b',', b'"', &mut simd_idx);
        let mut scalar_idx = SentinelIndex::default();
        scan_scalar(input, b',', b'"', &mut scalar_idx);
        assert_eq!(simd_idx.delimiters, scalar_idx.delimiters);
        assert_eq!(simd_idx.lfs, scalar_idx.lfs);
    }

    #[test]
    fn matches_scalar_across_chunk_boundary() {
        let mut input = vec![b'x'; 15];
        input.push(b',');
        input.extend_from_slice(b"rest,of,the,line\n");
        let mut simd_idx = SentinelIndex::default();
        scan_simd(&input, b',', b'"', &mut simd_idx);
        let mut scalar_idx = SentinelIndex::default();
        scan_scalar(&input, b',', b'"', &mut scalar_idx);
        assert_eq!(simd_idx.delimiters, scalar_idx.delimiters);
        assert_eq!(simd_idx.lfs, scalar_idx.lfs);
    }
}
