//! Per-position base counting over the BAM pileup.
//!
//! Walks every reference contig in header order and tallies the A/C/G/T
//! observations at each covered position. Deletions and reference skips
//! (spliced gaps) never contribute a base; bases outside the four-letter
//! alphabet (e.g. `N`) are ignored.

use rust_htslib::bam::{self, Read};

use crate::PloidyError;

/// The ordered nucleotide alphabet backing [`BaseCounts`].
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Slot of a base in the fixed A/C/G/T alphabet. `None` for anything else.
pub(crate) fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Per-position observation counts over the fixed A/C/G/T alphabet.
///
/// A count of zero means the base was not observed; there is no separate
/// "absent" encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseCounts([u32; 4]);

impl BaseCounts {
    /// Counts in A, C, G, T order.
    pub fn new(counts: [u32; 4]) -> Self {
        Self(counts)
    }

    /// Records one observation of `base`. Non-ACGT bases are dropped.
    pub fn record(&mut self, base: u8) {
        if let Some(idx) = base_index(base) {
            self.0[idx] += 1;
        }
    }

    /// Count for the base at `idx` in A, C, G, T order.
    pub fn get(&self, idx: usize) -> u32 {
        self.0[idx]
    }

    /// Total observations across the four bases.
    pub fn depth(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    /// Number of distinct bases observed at least once.
    pub fn distinct(&self) -> usize {
        self.0.iter().filter(|&&c| c > 0).count()
    }

    /// Count of the single most frequent base.
    pub fn max_count(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Iterates `(base, count)` pairs in A, C, G, T order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        BASES.iter().copied().zip(self.0.iter().copied())
    }
}

/// One covered pileup position and its base counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site<'a> {
    /// Reference contig name from the BAM header.
    pub contig: &'a str,
    /// Zero-based position on the contig.
    pub pos: u64,
    /// Observed base counts at this position.
    pub counts: BaseCounts,
}

/// Streams every covered position of every reference contig to `visit`, in
/// header contig order and ascending position.
///
/// Positions with zero coverage do not appear in the pileup and are never
/// visited. A position whose overlapping reads are all deletions or skips
/// is still visited, with all-zero counts; the normalizer discards it as
/// monomorphic.
pub fn scan_pileup<F>(reader: &mut bam::IndexedReader, mut visit: F) -> Result<(), PloidyError>
where
    F: FnMut(&Site<'_>) -> Result<(), PloidyError>,
{
    let header = reader.header().to_owned();

    for tid in 0..header.target_count() {
        let contig = String::from_utf8_lossy(header.tid2name(tid)).into_owned();
        let Some(end) = header.target_len(tid) else {
            continue;
        };
        reader.fetch((tid as i32, 0i64, end as i64))?;

        for column in reader.pileup() {
            let column = column?;
            let mut counts = BaseCounts::default();
            for alignment in column.alignments() {
                if alignment.is_del() || alignment.is_refskip() {
                    continue;
                }
                // qpos is always present for a non-deletion alignment
                let Some(qpos) = alignment.qpos() else {
                    continue;
                };
                counts.record(alignment.record().seq()[qpos]);
            }
            visit(&Site {
                contig: &contig,
                pos: u64::from(column.pos()),
                counts,
            })?;
        }
    }

    Ok(())
}
