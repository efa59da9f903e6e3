//! Reference genome and library-size loading.
//!
//! Contig lengths come from the FASTA; the library size (total mapped
//! reads) comes from the BAM index summary, the same source `samtools
//! idxstats` reads. The index is built in place when it is missing.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use bio::io::fasta;
use rust_htslib::bam::{self, Read};
use tracing::{info, warn};

use crate::PloidyError;

/// Contig name to sequence length, as declared by the reference FASTA.
pub type ContigLengths = HashMap<String, u64>;

/// Parses the reference FASTA and returns each record's id and length.
pub fn contig_lengths(path: &Path) -> Result<ContigLengths, PloidyError> {
    let reader = fasta::Reader::from_file(path).map_err(|err| PloidyError::InputFormat {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let mut lengths = ContigLengths::new();
    for record in reader.records() {
        let record = record.map_err(|err| PloidyError::InputFormat {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        record.check().map_err(|reason| PloidyError::InputFormat {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        })?;
        lengths.insert(record.id().to_string(), record.seq().len() as u64);
    }
    Ok(lengths)
}

/// Path of the BAI index expected next to `bam`.
pub fn index_path(bam: &Path) -> PathBuf {
    let mut name = OsString::from(bam.as_os_str());
    name.push(".bai");
    PathBuf::from(name)
}

/// Builds the BAI index next to the BAM when it does not exist yet.
pub fn ensure_index(bam: &Path) -> Result<(), PloidyError> {
    if index_path(bam).exists() {
        info!(bam = %bam.display(), "BAM index present");
        return Ok(());
    }

    info!(bam = %bam.display(), "no index available for pileup, creating one");
    bam::index::build(bam, None::<&Path>, bam::index::Type::Bai, 1).map_err(|err| {
        PloidyError::IndexCreation {
            path: bam.to_path_buf(),
            reason: err.to_string(),
        }
    })
}

/// Sums the mapped-read column of the index summary over all references.
///
/// A summary row that does not resolve against the reference list is
/// malformed; it is logged and skipped rather than aborting the run.
pub fn library_size(reader: &mut bam::IndexedReader) -> Result<u64, PloidyError> {
    let targets = i64::from(reader.header().target_count());
    let stats = reader.index_stats()?;
    Ok(sum_mapped(&stats, targets))
}

/// `stats` rows are `(tid, length, mapped, unmapped)` as reported by the
/// index; `targets` is the reference count from the BAM header.
fn sum_mapped(stats: &[(i64, u64, u64, u64)], targets: i64) -> u64 {
    let mut total = 0u64;
    for &(tid, _length, mapped, _unmapped) in stats {
        if tid < 0 || tid >= targets {
            let row = PloidyError::MalformedSummaryRow { tid };
            warn!(error = %row, "skipping index summary row");
            continue;
        }
        total += mapped;
    }
    total
}
