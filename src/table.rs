//! TAB table emission with ascending rank labels.
//!
//! Each retained position becomes four rows, one per rank of the four
//! percentage shares. Labels describe relative magnitude, not base
//! identity: `FirstFreq` is the largest share, `FourthFreq` the smallest.

use std::io::{self, Write};

/// Rank labels in emission order, smallest share first.
pub const RANK_LABELS: [&str; 4] = ["FourthFreq", "ThirdFreq", "SecondFreq", "FirstFreq"];

/// Writes the four ranked rows for one retained position.
///
/// `shares` arrives in A, C, G, T order and is sorted ascending here;
/// values are formatted with exactly two decimal digits and no header row
/// is ever written.
pub fn write_site<W: Write>(
    out: &mut W,
    contig: &str,
    pos: u64,
    shares: [f64; 4],
) -> io::Result<()> {
    let mut ranked = shares;
    ranked.sort_by(f64::total_cmp);
    for (label, value) in RANK_LABELS.iter().zip(ranked) {
        writeln!(out, "{contig}\t{pos}\t{label}\t{value:.2}")?;
    }
    Ok(())
}
