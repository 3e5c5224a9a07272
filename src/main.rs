//! consalign - Cross-strategy alignment consistency
//!
//! ## Usage
//!
//! ```bash
//! consalign genes.fa > genes.aln
//! consalign --maxiterate 1000 --change-case no genes.fa
//! consalign --batch fasta_dir/ --outdir aln_dir/ --input-suffix .fa
//! ```
//!
//! The output is the E-INS-i alignment preceded by a marker row with `C`
//! where G-INS-i, L-INS-i and E-INS-i agree and `N` elsewhere.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use consalign::aligner::Mafft;
use consalign::marker::MarkerStyle;
use consalign::model::{CaseMode, SequenceKind};
use consalign::pipeline::{align_consistently, run_batch, BatchOptions, PipelineConfig};

/// Case change applied to the output alignment
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CaseArg {
    /// Upper-case every sequence
    Upper,
    /// Lower-case every sequence
    Lower,
    /// Keep the aligner's case
    No,
}

impl From<CaseArg> for CaseMode {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::Upper => CaseMode::Upper,
            CaseArg::Lower => CaseMode::Lower,
            CaseArg::No => CaseMode::Unchanged,
        }
    }
}

/// consalign - mark alignment columns consistent across MAFFT strategies
///
/// Without --batch, aligns FILE and writes the marked alignment to stdout.
/// With --batch, aligns every matching file of a directory into --outdir.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Unaligned FASTA file (single-file mode)
    file: Option<PathBuf>,

    /// Maximum number of iterative refinements performed by MAFFT
    #[arg(long = "maxiterate", default_value = "0")]
    max_iterate: u32,

    /// Symbol used for gaps in the alignments ("---" with --codon)
    #[arg(long = "gapchar", default_value = "-")]
    gap_char: String,

    /// Identifier of the marker row
    #[arg(long = "marker-id", default_value = "marker")]
    marker_id: String,

    /// Marker for columns consistent across all strategies
    #[arg(long = "consistent-marker", default_value = "C")]
    consistent_marker: char,

    /// Marker for columns inconsistent in at least one strategy
    #[arg(long = "inconsistent-marker", default_value = "N")]
    inconsistent_marker: char,

    /// Change the case of the output sequences
    #[arg(long = "change-case", value_enum, default_value = "upper")]
    change_case: CaseArg,

    /// Save the G-INS-i, L-INS-i and E-INS-i alignments next to each input
    #[arg(long = "save-temp-alignments")]
    save_temp_alignments: bool,

    /// Treat sequences as codons (one column per 3 nucleotides)
    #[arg(long = "codon")]
    codon: bool,

    /// Directory of FASTA files to process (batch mode)
    #[arg(long = "batch")]
    batch: Option<PathBuf>,

    /// Only files ending with this suffix are processed in batch mode
    #[arg(long = "input-suffix", default_value = ".fa")]
    input_suffix: String,

    /// Suffix appended to input file names for batch outputs
    #[arg(long = "output-suffix", default_value = ".aln")]
    output_suffix: String,

    /// Directory where batch outputs are written
    #[arg(long = "outdir")]
    outdir: Option<PathBuf>,

    /// MAFFT executable (default: $CONSALIGN_MAFFT_BIN, then "mafft")
    #[arg(long = "mafft")]
    mafft: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// A codon gap must be one codon, a character gap one character.
    fn check_gap_symbol(&self) -> Result<()> {
        let len = self.gap_char.chars().count();
        if self.codon && len != 3 {
            bail!(
                "With --codon the gap symbol must be a codon (e.g. ---), got '{}'",
                self.gap_char
            );
        }
        if !self.codon && len != 1 {
            bail!(
                "The gap symbol must be a single character (use --codon for codon gaps), got '{}'",
                self.gap_char
            );
        }
        Ok(())
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            iterations: self.max_iterate,
            gap: self.gap_char.clone(),
            sequence_kind: if self.codon {
                SequenceKind::Codon
            } else {
                SequenceKind::Char
            },
            marker: MarkerStyle {
                marker_id: self.marker_id.clone(),
                consistent: self.consistent_marker,
                inconsistent: self.inconsistent_marker,
            },
            case: self.change_case.into(),
            save_alignments: self.save_temp_alignments,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the alignment
    let filter = if args.verbose {
        EnvFilter::new("consalign=debug,info")
    } else {
        EnvFilter::new("consalign=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    args.check_gap_symbol()?;

    let config = args.pipeline_config();
    let mafft = match &args.mafft {
        Some(executable) => Mafft::new(executable.clone()),
        None => Mafft::from_env(),
    };
    debug!("Aligning with {}", mafft.executable());

    match &args.batch {
        None => {
            let Some(file) = &args.file else {
                bail!("Missing path to FASTA file");
            };
            if !file.exists() {
                bail!("File does not exist: {}", file.display());
            }

            let marked = align_consistently(&mafft, file, &config)
                .with_context(|| format!("Failed to process {}", file.display()))?;

            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(marked.as_bytes())?;
        }
        Some(input_dir) => {
            if args.file.is_some() {
                bail!("A FASTA file cannot be given together with --batch");
            }
            if !input_dir.is_dir() {
                bail!("Batch directory does not exist: {}", input_dir.display());
            }
            let Some(output_dir) = &args.outdir else {
                bail!("Missing output directory. Use --outdir to specify where alignments are saved");
            };
            if !output_dir.is_dir() {
                bail!("Output directory does not exist: {}", output_dir.display());
            }

            let options = BatchOptions {
                input_dir: input_dir.clone(),
                input_suffix: args.input_suffix.clone(),
                output_dir: output_dir.clone(),
                output_suffix: args.output_suffix.clone(),
            };
            let report = run_batch(&mafft, &options, &config)
                .with_context(|| format!("Failed to read {}", input_dir.display()))?;

            info!(
                "Wrote {} alignment(s) to {}",
                report.written.len(),
                output_dir.display()
            );
            if !report.is_success() {
                for (input, e) in &report.failed {
                    eprintln!("{}: {}", input.display(), e);
                }
                bail!(
                    "{} of {} input(s) failed",
                    report.failed.len(),
                    report.failed.len() + report.written.len()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("consalign").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_default_gap_symbol() {
        assert!(parse(&["in.fa"]).check_gap_symbol().is_ok());
    }

    #[test]
    fn test_character_gap_must_be_one_char() {
        assert!(parse(&["--gapchar=--", "in.fa"]).check_gap_symbol().is_err());
        assert!(parse(&["--gapchar=", "in.fa"]).check_gap_symbol().is_err());
        assert!(parse(&["--gapchar=.", "in.fa"]).check_gap_symbol().is_ok());
    }

    #[test]
    fn test_codon_gap_must_be_one_codon() {
        assert!(parse(&["--codon", "--gapchar=---", "in.fa"]).check_gap_symbol().is_ok());
        assert!(parse(&["--codon", "in.fa"]).check_gap_symbol().is_err());
    }
}
