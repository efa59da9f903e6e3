use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ploidyngs::{report, write_frequency_table, RunSettings};

#[derive(Parser, Debug)]
#[command(name = "ploidyngs", about = "Print allele frequencies per position")]
struct Cli {
    /// BAM file used to get allele frequencies.
    #[arg(long, value_name = "mappingGenome.bam")]
    bam: PathBuf,

    /// Genome (FASTA).
    #[arg(long, value_name = "genome.fasta")]
    genome: PathBuf,

    /// TAB file with allele counts; consumed by the report and removed.
    #[arg(long, value_name = "file.tab")]
    out: PathBuf,

    /// Maximum allowed frequency of the dominant allele at a reported position.
    #[arg(long = "max_allele_freq", value_name = "FREQ", default_value_t = 0.95)]
    max_allele_freq: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = RunSettings {
        bam: cli.bam,
        genome: cli.genome,
        out: cli.out.clone(),
        max_allele_freq: cli.max_allele_freq,
    };

    let summary = write_frequency_table(&settings)
        .with_context(|| format!("failed to build frequency table {}", cli.out.display()))?;
    info!(
        library_size = summary.library_size,
        sites_retained = summary.sites_retained,
        "allele frequency table complete"
    );

    let script = report::write_script(&cli.out)?;
    report::run_script(&script)?;

    // The table and script are intermediates; the rendered PDF survives.
    fs::remove_file(&cli.out)
        .with_context(|| format!("failed to remove table {}", cli.out.display()))?;
    fs::remove_file(&script)
        .with_context(|| format!("failed to remove script {}", script.display()))?;
    info!(pdf = %report::pdf_path(&cli.out).display(), "done");

    Ok(())
}
