//! End-to-end consistency marking of unaligned FASTA files.
//!
//! For each input the three strategies are aligned in turn, their columns
//! compared, and the affine-local alignment is written with a marker row.
//! In batch mode a failing input is logged and skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aligner::{AlignerError, AlignmentProvider, Strategy};
use crate::consistency::{alignment_consistency, ConsistencyError};
use crate::fasta::{parse_fasta_str_as, write_fasta_file, FastaError};
use crate::marker::{render_marked_alignment, MarkerStyle};
use crate::model::{Alignment, CaseMode, SequenceKind};

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Refinement iterations passed to the aligner
    pub iterations: u32,
    /// Gap symbol in the aligner output ("---" for codon rows)
    pub gap: String,
    pub sequence_kind: SequenceKind,
    pub marker: MarkerStyle,
    pub case: CaseMode,
    /// Write each strategy's alignment next to the input
    pub save_alignments: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            iterations: 0,
            gap: "-".to_string(),
            sequence_kind: SequenceKind::Char,
            marker: MarkerStyle::default(),
            case: CaseMode::Upper,
            save_alignments: false,
        }
    }
}

/// Errors for a single input file.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{strategy} alignment failed: {source}")]
    Aligner {
        strategy: Strategy,
        #[source]
        source: AlignerError,
    },

    #[error("Could not read {strategy} alignment: {source}")]
    Fasta {
        strategy: Strategy,
        #[source]
        source: FastaError,
    },

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("Could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Path of a saved strategy alignment: `<input>.<strategy>.aln`.
pub fn saved_alignment_path(input: &Path, strategy: Strategy) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(format!(".{}.aln", strategy.name()));
    PathBuf::from(name)
}

/// Aligns `input` with every strategy and returns the marked alignment as FASTA.
pub fn align_consistently<P: AlignmentProvider + ?Sized>(
    provider: &P,
    input: &Path,
    config: &PipelineConfig,
) -> Result<String, PipelineError> {
    // Compared in this order; the affine-local alignment is the one written out
    let alignments = [
        align_with(provider, input, Strategy::Global, config)?,
        align_with(provider, input, Strategy::Local, config)?,
        align_with(provider, input, Strategy::AffineLocal, config)?,
    ];

    let consistent = alignment_consistency(&alignments, &config.gap)?;
    let n_consistent = consistent.iter().filter(|&&c| c).count();
    info!(
        "{}: {} of {} columns consistent",
        input.display(),
        n_consistent,
        consistent.len()
    );

    let [_, _, reference] = alignments;
    Ok(render_marked_alignment(
        reference,
        &consistent,
        &config.marker,
        config.case,
    ))
}

/// Runs one strategy, parses its output and saves it when asked to.
fn align_with<P: AlignmentProvider + ?Sized>(
    provider: &P,
    input: &Path,
    strategy: Strategy,
    config: &PipelineConfig,
) -> Result<Alignment, PipelineError> {
    info!("Aligning {} with {}", input.display(), strategy);
    let text = provider
        .align(input, strategy, config.iterations)
        .map_err(|source| PipelineError::Aligner { strategy, source })?;
    let alignment = parse_fasta_str_as(&text, config.sequence_kind)
        .map_err(|source| PipelineError::Fasta { strategy, source })?;
    debug!(
        "{} alignment: {} rows, {} columns",
        strategy,
        alignment.sequence_count(),
        alignment.alignment_length()
    );

    if config.save_alignments {
        let path = saved_alignment_path(input, strategy);
        write_fasta_file(&path, &alignment)
            .map_err(|source| PipelineError::Write { path, source })?;
    }
    Ok(alignment)
}

/// Where batch inputs are read from and outputs written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub input_suffix: String,
    pub output_dir: PathBuf,
    pub output_suffix: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written
    pub written: Vec<PathBuf>,
    /// Inputs that failed, with their error
    pub failed: Vec<(PathBuf, PipelineError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Regular files in `dir` whose name ends with `suffix`, sorted by name.
pub fn find_inputs(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(suffix) {
            inputs.push(entry.path());
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Output path for a batch input: `<output_dir>/<file name><output_suffix>`.
pub fn batch_output_path(input: &Path, options: &BatchOptions) -> PathBuf {
    let mut name = input.file_name().unwrap_or(input.as_os_str()).to_os_string();
    name.push(&options.output_suffix);
    options.output_dir.join(name)
}

/// Processes every matching input of a directory.
///
/// Failures are recorded per input and do not stop the batch. Only a
/// failure to list the input directory is returned as an error.
pub fn run_batch<P: AlignmentProvider + ?Sized>(
    provider: &P,
    options: &BatchOptions,
    config: &PipelineConfig,
) -> io::Result<BatchReport> {
    let inputs = find_inputs(&options.input_dir, &options.input_suffix)?;
    info!(
        "Found {} input(s) ending with '{}' in {}",
        inputs.len(),
        options.input_suffix,
        options.input_dir.display()
    );

    let mut report = BatchReport::default();
    for input in inputs {
        let result = align_consistently(provider, &input, config).and_then(|marked| {
            let path = batch_output_path(&input, options);
            match fs::write(&path, marked) {
                Ok(()) => Ok(path),
                Err(source) => Err(PipelineError::Write { path, source }),
            }
        });

        match result {
            Ok(path) => {
                debug!("Wrote {}", path.display());
                report.written.push(path);
            }
            Err(e) => {
                warn!("Skipping {}: {}", input.display(), e);
                report.failed.push((input, e));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_alignment_path() {
        let path = saved_alignment_path(Path::new("data/gene.fa"), Strategy::AffineLocal);
        assert_eq!(path, PathBuf::from("data/gene.fa.einsi.aln"));
    }

    #[test]
    fn test_batch_output_path() {
        let options = BatchOptions {
            input_dir: PathBuf::from("in"),
            input_suffix: ".fa".to_string(),
            output_dir: PathBuf::from("out"),
            output_suffix: ".aln".to_string(),
        };
        assert_eq!(
            batch_output_path(Path::new("in/gene1.fa"), &options),
            PathBuf::from("out/gene1.fa.aln")
        );
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.gap, "-");
        assert_eq!(config.case, CaseMode::Upper);
        assert_eq!(config.marker.marker_id, "marker");
        assert!(!config.save_alignments);
    }
}
