//! Library-size normalization and the diversity filter.
//!
//! Counts are first scaled to counts-per-million against the library size,
//! then each base's normalized count is expressed as a percentage of the
//! position's own normalized depth. The per-million scaling cancels
//! algebraically, but it is kept so output matches the historical
//! normalization bit for bit.

use crate::pileup::BaseCounts;
use crate::PloidyError;

/// Scaling factor for the counts-per-million normalization.
const PER_MILLION: f64 = 1_000_000.0;

/// Outcome of normalizing and filtering one pileup position.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteVerdict {
    /// Fewer than two distinct bases observed; carries no ploidy signal.
    Monomorphic,
    /// The dominant allele's share exceeds the configured maximum; the
    /// position is not informative.
    TooDominant,
    /// The position is reported, with percentage shares in A, C, G, T order.
    Retained([f64; 4]),
}

/// Normalizes one position's counts and decides whether it is reported.
///
/// `contig` and `pos` only label the error when the division-by-zero
/// precondition is violated; the decision is a pure function of `counts`,
/// `library_size` and `max_allele_freq`.
pub fn classify(
    contig: &str,
    pos: u64,
    counts: &BaseCounts,
    library_size: u64,
    max_allele_freq: f64,
) -> Result<SiteVerdict, PloidyError> {
    if counts.distinct() < 2 {
        return Ok(SiteVerdict::Monomorphic);
    }

    let depth = counts.depth();
    if depth == 0 || library_size == 0 {
        return Err(PloidyError::DivisionByZero {
            contig: contig.to_string(),
            position: pos,
            depth,
            library_size,
        });
    }

    let dominant_share = f64::from(counts.max_count()) / depth as f64;
    if dominant_share > max_allele_freq {
        return Ok(SiteVerdict::TooDominant);
    }

    let depth_cpm = (depth as f64 / library_size as f64) * PER_MILLION;
    let mut shares = [0.0f64; 4];
    for (idx, share) in shares.iter_mut().enumerate() {
        let count = counts.get(idx);
        if count == 0 {
            continue;
        }
        let base_cpm = (f64::from(count) / library_size as f64) * PER_MILLION;
        *share = (base_cpm / depth_cpm) * 100.0;
    }

    Ok(SiteVerdict::Retained(shares))
}
