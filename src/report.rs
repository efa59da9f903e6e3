//! Downstream histogram report.
//!
//! The core's obligation ends at the TAB table; rendering is delegated to
//! an external `Rscript` invocation over a generated ggplot2 script. The
//! caller removes the table and the script once the render completes.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::PloidyError;

/// Path of the generated plot script for `table`.
pub fn script_path(table: &Path) -> PathBuf {
    append_suffix(table, ".Rscript")
}

/// Path of the PDF the script renders for `table`.
pub fn pdf_path(table: &Path) -> PathBuf {
    append_suffix(table, ".ExplorePloidy.pdf")
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Renders the ggplot2 histogram script for a frequency table.
pub fn render_script(table: &Path) -> String {
    let pdf = pdf_path(table);
    let table = table.display();
    let pdf = pdf.display();
    format!(
        "library(ggplot2)\n\
         datain<-read.table(\"{table}\",header=F)\n\
         colnames(datain)<-c('Chrom','Pos','Type','Freq')\n\
         pdf(\"{pdf}\")\n\
         ggplot(datain,aes(x=Freq, fill=Type)) +\n \
         geom_histogram(binwidth = 0.5, alpha=0.4) +\n \
         ggtitle(\"Explore ploidy - NGS\") +\n \
         ylab(\"Counts positions\") +\n \
         xlab(\"Allele Freq\") +\n \
         scale_x_continuous(limits=c(1,100))\n\
         dev.off()\n"
    )
}

/// Writes the plot script next to the table and returns its path.
pub fn write_script(table: &Path) -> Result<PathBuf, PloidyError> {
    let script = script_path(table);
    fs::write(&script, render_script(table))?;
    info!(script = %script.display(), "wrote report script");
    Ok(script)
}

/// Runs the plot script through `Rscript`, producing the PDF report.
pub fn run_script(script: &Path) -> Result<(), PloidyError> {
    let status = Command::new("Rscript")
        .arg(script)
        .status()
        .map_err(|err| PloidyError::Plot {
            script: script.to_path_buf(),
            reason: format!("could not launch Rscript: {err}"),
        })?;

    if !status.success() {
        return Err(PloidyError::Plot {
            script: script.to_path_buf(),
            reason: format!("Rscript exited with {status}"),
        });
    }
    info!(script = %script.display(), "report rendered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_reads_the_table_and_renders_a_pdf() {
        let script = render_script(Path::new("freqs.tab"));
        assert!(script.starts_with("library(ggplot2)\n"));
        assert!(script.contains("read.table(\"freqs.tab\",header=F)"));
        assert!(script.contains("colnames(datain)<-c('Chrom','Pos','Type','Freq')"));
        assert!(script.contains("pdf(\"freqs.tab.ExplorePloidy.pdf\")"));
        assert!(script.contains("geom_histogram(binwidth = 0.5, alpha=0.4)"));
        assert!(script.ends_with("dev.off()\n"));
    }

    #[test]
    fn sibling_paths_append_suffixes() {
        let table = Path::new("/tmp/run/freqs.tab");
        assert_eq!(
            script_path(table),
            PathBuf::from("/tmp/run/freqs.tab.Rscript")
        );
        assert_eq!(
            pdf_path(table),
            PathBuf::from("/tmp/run/freqs.tab.ExplorePloidy.pdf")
        );
    }
}
