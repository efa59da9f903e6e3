//! # ploidyngs
//!
//! Estimates the distribution of observed nucleotide allele frequencies per
//! genomic position from an aligned, indexed BAM file. Positions where more
//! than one allele is seen at substantial frequency hint at polyploidy,
//! aneuploidy or heterozygosity.
//!
//! ## Pipeline
//!
//! 1. **Load**: contig lengths from the reference FASTA, library size from
//!    the BAM index summary (built on the fly when missing)
//! 2. **Aggregate**: per-position base counts from the pileup, skipping
//!    deletions and reference skips
//! 3. **Normalize & filter**: library-size-normalized shares, dropping
//!    monomorphic positions and positions whose dominant allele exceeds the
//!    configured maximum frequency
//! 4. **Emit**: the four shares per retained position, ranked ascending,
//!    as a TAB table consumed by a downstream histogram report

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod frequency;
pub mod genome;
pub mod pileup;
pub mod report;
pub mod table;

pub use frequency::SiteVerdict;
pub use pileup::{BaseCounts, Site, BASES};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use rust_htslib::bam;
use thiserror::Error;
use tracing::{info, warn};

/// Errors produced while building the allele frequency table.
#[derive(Error, Debug)]
pub enum PloidyError {
    /// Genome or alignment input could not be parsed as expected.
    #[error("failed to parse {path}: {reason}")]
    InputFormat {
        /// Offending input file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The BAM index was absent and could not be built.
    #[error("could not build index for {path}: {reason}")]
    IndexCreation {
        /// Alignment file that was being indexed.
        path: PathBuf,
        /// Indexer diagnostic.
        reason: String,
    },

    /// A retained position has zero depth, or the library size is zero.
    /// Indicates a precondition violation upstream of the normalizer.
    #[error("division by zero normalizing {contig}:{position} (depth {depth}, library size {library_size})")]
    DivisionByZero {
        /// Contig of the offending position.
        contig: String,
        /// Zero-based position.
        position: u64,
        /// Raw depth at the position.
        depth: u64,
        /// Total mapped reads in the library.
        library_size: u64,
    },

    /// An index summary row does not resolve against the reference list.
    /// Recovered locally by skipping the row.
    #[error("index summary row for tid {tid} does not match the reference list")]
    MalformedSummaryRow {
        /// Target id reported by the index.
        tid: i64,
    },

    /// The downstream report interpreter failed or could not be spawned.
    #[error("report script {script} failed: {reason}")]
    Plot {
        /// Script handed to the interpreter.
        script: PathBuf,
        /// Interpreter diagnostic.
        reason: String,
    },

    /// Underlying htslib failure while reading the alignment file.
    #[error(transparent)]
    Hts(#[from] rust_htslib::errors::Error),

    /// Filesystem failure on one of the run's inputs or outputs.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PloidyError {
    /// True when the error is recovered locally by skipping a row rather
    /// than aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PloidyError::MalformedSummaryRow { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T, E = PloidyError> = std::result::Result<T, E>;

/// Inputs for a table-building run, threaded explicitly through the
/// pipeline instead of living in module state.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Indexed, coordinate-sorted BAM with the aligned reads.
    pub bam: PathBuf,
    /// Reference genome FASTA.
    pub genome: PathBuf,
    /// Destination for the TAB frequency table.
    pub out: PathBuf,
    /// Maximum dominant-allele frequency for a position to be reported.
    pub max_allele_freq: f64,
}

/// What a completed table-building run looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// Total mapped reads used as the normalization denominator.
    pub library_size: u64,
    /// Pileup positions visited.
    pub sites_visited: u64,
    /// Positions that passed the diversity filter and were written out.
    pub sites_retained: u64,
}

/// Runs the full loader/aggregator/normalizer/emitter pipeline and writes
/// the frequency table to `settings.out`.
///
/// The output file is flushed and closed before this returns, so a
/// downstream consumer may read it immediately.
pub fn write_frequency_table(settings: &RunSettings) -> Result<TableSummary> {
    let contig_lengths = genome::contig_lengths(&settings.genome)?;
    info!(
        contigs = contig_lengths.len(),
        genome = %settings.genome.display(),
        "loaded reference contig lengths"
    );

    genome::ensure_index(&settings.bam)?;

    let mut reader = bam::IndexedReader::from_path(&settings.bam)?;
    let library_size = genome::library_size(&mut reader)?;
    info!(library_size, "computed library size from index summary");

    check_references(&reader, &contig_lengths);

    let out = File::create(&settings.out)?;
    let mut writer = BufWriter::new(out);

    let mut sites_visited = 0u64;
    let mut sites_retained = 0u64;
    pileup::scan_pileup(&mut reader, |site| {
        sites_visited += 1;
        let verdict = frequency::classify(
            site.contig,
            site.pos,
            &site.counts,
            library_size,
            settings.max_allele_freq,
        )?;
        if let SiteVerdict::Retained(shares) = verdict {
            table::write_site(&mut writer, site.contig, site.pos, shares)?;
            sites_retained += 1;
        }
        Ok(())
    })?;

    writer.flush()?;
    info!(
        sites_visited,
        sites_retained,
        out = %settings.out.display(),
        "frequency table written"
    );

    Ok(TableSummary {
        library_size,
        sites_visited,
        sites_retained,
    })
}

/// Warns when the BAM reference list and the FASTA disagree. Mismatched
/// inputs still run; the pileup span is bounded by the BAM header.
fn check_references(reader: &bam::IndexedReader, contig_lengths: &genome::ContigLengths) {
    use rust_htslib::bam::Read;

    let header = reader.header();
    for tid in 0..header.target_count() {
        let name = String::from_utf8_lossy(header.tid2name(tid));
        match (contig_lengths.get(name.as_ref()), header.target_len(tid)) {
            (None, _) => {
                warn!(contig = %name, "BAM reference absent from the genome FASTA");
            }
            (Some(&fasta_len), Some(bam_len)) if fasta_len != bam_len => {
                warn!(
                    contig = %name,
                    fasta_len,
                    bam_len,
                    "contig length differs between FASTA and BAM header"
                );
            }
            _ => {}
        }
    }
}
