//! C1: vectorised byte-level scanner (`spec.md` §4.1).
//!
//! Contract: given a byte slice and four sentinel bytes (`delimiter`, `quote`,
//! `\n`, `\r`), produce the positions of *all* sentinel occurrences in scan
//! order, without interpreting quote state — that is [`crate::row_parser`]'s
//! job. Generalises the teacher's `core/simd_scanner.rs` prefix-XOR structural
//! scanner: we drop the prefix-XOR quote-region folding (that logic now lives
//! one layer up, in the row parser's explicit state machine) and keep the
//! vector-width / bitmask-extraction technique.

pub(crate) mod scalar;
mod simd;

/// Which of the four sentinel bytes a hit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelKind {
    Delimiter,
    Quote,
    Lf,
    Cr,
}

/// Raw positions of each sentinel kind in a scanned slice, in ascending
/// order within each kind. The row parser merges the four streams.
#[derive(Debug, Default, Clone)]
pub struct SentinelIndex {
    pub delimiters: Vec<u32>,
    pub quotes: Vec<u32>,
    pub lfs: Vec<u32>,
    pub crs: Vec<u32>,
}

impl SentinelIndex {
    fn with_capacity(input_len: usize) -> Self {
        let est = input_len / 16 + 8;
        SentinelIndex {
            delimiters: Vec::with_capacity(est),
            quotes: Vec::new(),
            lfs: Vec::with_capacity(input_len / 40 + 4),
            crs: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.delimiters.clear();
        self.quotes.clear();
        self.lfs.clear();
        self.crs.clear();
    }

    /// Merge cursor over the four sorted streams, yielding `(pos, kind)` in
    /// scan order. Ties (two kinds hitting the same byte position, only
    /// possible when a caller configures `delimiter`/`quote` equal to `\n`/`\r`)
    /// are broken in a fixed kind order so iteration is deterministic.
    pub fn merge_from(&self, start: u32) -> MergeCursor<'_> {
        MergeCursor {
            index: self,
            d: self.delimiters.partition_point(|&p| p < start),
            q: self.quotes.partition_point(|&p| p < start),
            l: self.lfs.partition_point(|&p| p < start),
            c: self.crs.partition_point(|&p| p < start),
        }
    }
}

pub struct MergeCursor<'a> {
    index: &'a SentinelIndex,
    d: usize,
    q: usize,
    l: usize,
    c: usize,
}

impl<'a> Iterator for MergeCursor<'a> {
    type Item = (u32, SentinelKind);

    fn next(&mut self) -> Option<Self::Item> {
        let candidates = [
            self.index.delimiters.get(self.d).map(|&p| (p, SentinelKind::Delimiter)),
            self.index.quotes.get(self.q).map(|&p| (p, SentinelKind::Quote)),
            self.index.lfs.get(self.l).map(|&p| (p, SentinelKind::Lf)),
            self.index.crs.get(self.c).map(|&p| (p, SentinelKind::Cr)),
        ];
        let (best_idx, best) = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|v| (i, v)))
            .min_by_key(|&(_, (pos, _))| pos)?;
        match best_idx {
            0 => self.d += 1,
            1 => self.q += 1,
            2 => self.l += 1,
            _ => self.c += 1,
        }
        Some(best)
    }
}

/// Scan `input` for all occurrences of `delimiter`, `quote`, `\n`, and `\r`.
///
/// `force_scalar` corresponds to the `use_simd_if_available=false` option
/// (testing / determinism, `spec.md` §3).
pub fn scan(input: &[u8], delimiter: u8, quote: u8, force_scalar: bool) -> SentinelIndex {
    let mut index = SentinelIndex::with_capacity(input.len());
    scan_into(input, delimiter, quote, force_scalar, &mut index);
    index
}

/// Same as [`scan`] but reuses a caller-provided, already-cleared index
/// (buffer-pool friendly — `spec.md` §4.10 / C10).
pub fn scan_into(input: &[u8], delimiter: u8, quote: u8, force_scalar: bool, index: &mut SentinelIndex) {
    if force_scalar || !simd::available() {
        scalar::scan_scalar(input, delimiter, quote, index);
    } else {
        simd::scan_simd(input, delimiter, quote, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_cursor_orders_by_position() {
        let mut idx = SentinelIndex::default();
        idx.delimiters = vec![1, 7];
        idx.quotes = vec![2, 6];
        idx.lfs = vec![9];
        idx.crs = vec![];

        let hits: Vec<_> = idx.merge_from(0).collect();
        assert_eq!(
            hits,
            vec![
                (1, SentinelKind::Delimiter),
                (2, SentinelKind::Quote),
                (6, SentinelKind::Quote),
                (7, SentinelKind::Delimiter),
                (9, SentinelKind::Lf),
            ]
        );
    }

    #[test]
    fn merge_from_respects_start_offset() {
        let mut idx = SentinelIndex::default();
        idx.delimiters = vec![1, 7, 20];
        let hits: Vec<_> = idx.merge_from(10).collect();
        assert_eq!(hits, vec![(20, SentinelKind::Delimiter)]);
    }

    #[test]
    fn scalar_and_simd_agree() {
        let input = b"a,\"b,c\",d\r\ne,f\ng\r\"h\"\"i\",j";
        let mut scalar_idx = SentinelIndex::default();
        scalar::scan_scalar(input, b',', b'"', &mut scalar_idx);
        let mut simd_idx = SentinelIndex::default();
        simd::scan_simd(input, b',', b'"', &mut simd_idx);
        assert_eq!(scalar_idx.delimiters, simd_idx.delimiters);
        assert_eq!(scalar_idx.quotes, simd_idx.quotes);
        assert_eq!(scalar_idx.lfs, simd_idx.lfs);
        assert_eq!(scalar_idx.crs, simd_idx.crs);
    }
}
