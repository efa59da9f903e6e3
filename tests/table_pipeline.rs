//! End-to-end pipeline tests over a synthetic BAM.
//!
//! The fixture covers three positions on one contig: a monomorphic site,
//! a site whose dominant allele exceeds the default threshold, and a
//! biallelic 80/20 site that should be the only one reported.

use std::fs;
use std::path::Path;

use rust_htslib::bam::{self, header::HeaderRecord, Format, Header, HeaderView, Record};
use tempfile::TempDir;

use ploidyngs::{genome, write_frequency_table, RunSettings};

const CONTIG: &str = "chr1";
const CONTIG_LEN: usize = 10;

fn sam_line(name: &str, pos_1based: u32, base: char) -> String {
    format!("{name}\t0\t{CONTIG}\t{pos_1based}\t60\t1M\t*\t0\t0\t{base}\tI")
}

/// Writes the reference FASTA and a coordinate-sorted BAM:
/// pos 2: C,C,C (monomorphic), pos 4: 96xA + 4xC, pos 6: 8xA + 2xG.
fn write_fixture(dir: &Path) -> RunSettings {
    let genome_path = dir.join("genome.fasta");
    fs::write(&genome_path, format!(">{CONTIG}\nACGTACGTAC\n")).unwrap();

    let mut header = Header::new();
    let mut hd = HeaderRecord::new(b"HD");
    hd.push_tag(b"VN", &"1.6").push_tag(b"SO", &"coordinate");
    header.push_record(&hd);
    let mut sq = HeaderRecord::new(b"SQ");
    sq.push_tag(b"SN", &CONTIG).push_tag(b"LN", &CONTIG_LEN);
    header.push_record(&sq);
    let view = HeaderView::from_header(&header);

    let bam_path = dir.join("reads.bam");
    {
        let mut writer = bam::Writer::from_path(&bam_path, &header, Format::Bam).unwrap();
        let mut lines = Vec::new();
        for i in 0..3 {
            lines.push(sam_line(&format!("mono{i}"), 2, 'C'));
        }
        for i in 0..96 {
            lines.push(sam_line(&format!("dom_a{i}"), 4, 'A'));
        }
        for i in 0..4 {
            lines.push(sam_line(&format!("dom_c{i}"), 4, 'C'));
        }
        for i in 0..8 {
            lines.push(sam_line(&format!("bi_a{i}"), 6, 'A'));
        }
        for i in 0..2 {
            lines.push(sam_line(&format!("bi_g{i}"), 6, 'G'));
        }
        for line in lines {
            let record = Record::from_sam(&view, line.as_bytes()).unwrap();
            writer.write(&record).unwrap();
        }
    }

    RunSettings {
        bam: bam_path,
        genome: genome_path,
        out: dir.join("freqs.tab"),
        max_allele_freq: 0.95,
    }
}

#[test]
fn reports_only_the_biallelic_site_at_default_threshold() {
    let dir = TempDir::new().unwrap();
    let settings = write_fixture(dir.path());

    let summary = write_frequency_table(&settings).unwrap();
    assert_eq!(summary.library_size, 113);
    assert_eq!(summary.sites_visited, 3);
    assert_eq!(summary.sites_retained, 1);

    let table = fs::read_to_string(&settings.out).unwrap();
    assert_eq!(
        table,
        "chr1\t5\tFourthFreq\t0.00\n\
         chr1\t5\tThirdFreq\t0.00\n\
         chr1\t5\tSecondFreq\t20.00\n\
         chr1\t5\tFirstFreq\t80.00\n"
    );
}

#[test]
fn builds_the_missing_index_next_to_the_bam() {
    let dir = TempDir::new().unwrap();
    let settings = write_fixture(dir.path());
    let index = genome::index_path(&settings.bam);
    assert!(!index.exists());

    write_frequency_table(&settings).unwrap();
    assert!(index.exists(), "expected {} to be created", index.display());
}

#[test]
fn threshold_one_keeps_every_polymorphic_site() {
    let dir = TempDir::new().unwrap();
    let mut settings = write_fixture(dir.path());
    settings.max_allele_freq = 1.0;

    let summary = write_frequency_table(&settings).unwrap();
    assert_eq!(summary.sites_retained, 2);

    let table = fs::read_to_string(&settings.out).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 8);
    // visit order: the 96/4 site at offset 3 precedes the 80/20 site at 5
    assert_eq!(lines[0], "chr1\t3\tFourthFreq\t0.00");
    assert_eq!(lines[2], "chr1\t3\tSecondFreq\t4.00");
    assert_eq!(lines[3], "chr1\t3\tFirstFreq\t96.00");
    assert_eq!(lines[7], "chr1\t5\tFirstFreq\t80.00");
}

#[test]
fn threshold_zero_keeps_nothing() {
    let dir = TempDir::new().unwrap();
    let mut settings = write_fixture(dir.path());
    settings.max_allele_freq = 0.0;

    let summary = write_frequency_table(&settings).unwrap();
    assert_eq!(summary.sites_retained, 0);
    assert_eq!(fs::read_to_string(&settings.out).unwrap(), "");
}

#[test]
fn reruns_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let settings = write_fixture(dir.path());

    write_frequency_table(&settings).unwrap();
    let first = fs::read(&settings.out).unwrap();
    write_frequency_table(&settings).unwrap();
    let second = fs::read(&settings.out).unwrap();
    assert_eq!(first, second);
}
