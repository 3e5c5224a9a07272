//! Alignment strategies and the external aligner that computes them.
//!
//! Alignments are produced by MAFFT's iterative refinement modes. The
//! [`AlignmentProvider`] trait keeps the rest of the crate independent of the
//! external program so it can be driven by canned outputs.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Default MAFFT executable name.
pub const DEFAULT_MAFFT_BIN: &str = "mafft";

/// Environment variable overriding the MAFFT executable.
pub const MAFFT_ENV_BIN: &str = "CONSALIGN_MAFFT_BIN";

/// Pairwise scoring used by the aligner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Global pairwise alignment (G-INS-i)
    Global,
    /// Local pairwise alignment (L-INS-i)
    Local,
    /// Local pairwise alignment with generalized affine gap costs (E-INS-i)
    AffineLocal,
}

impl Strategy {
    /// Short name, also used as the suffix of saved alignments.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Global => "ginsi",
            Strategy::Local => "linsi",
            Strategy::AffineLocal => "einsi",
        }
    }

    /// MAFFT option selecting the pairwise scoring.
    pub fn mafft_flag(self) -> &'static str {
        match self {
            Strategy::Global => "--globalpair",
            Strategy::Local => "--localpair",
            Strategy::AffineLocal => "--genafpair",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors at the aligner boundary.
#[derive(Error, Debug)]
pub enum AlignerError {
    #[error("Could not find aligner executable '{executable}'. Install MAFFT or set CONSALIGN_MAFFT_BIN")]
    ToolNotFound { executable: String },

    #[error("Aligner failed: {executable} {} (status={status:?}, stderr='{}')", .args.join(" "), .stderr.trim())]
    ToolFailed {
        executable: String,
        args: Vec<String>,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Aligner produced no {strategy} alignment for {}", .input.display())]
    EmptyOutput { strategy: Strategy, input: PathBuf },

    #[error("Could not run aligner: {0}")]
    Io(#[from] std::io::Error),
}

/// Computes one alignment of an unaligned FASTA file.
pub trait AlignmentProvider {
    /// Returns the aligned FASTA text.
    fn align(
        &self,
        input: &Path,
        strategy: Strategy,
        iterations: u32,
    ) -> Result<String, AlignerError>;
}

/// MAFFT run as a child process.
#[derive(Debug, Clone)]
pub struct Mafft {
    executable: String,
}

impl Mafft {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Uses `CONSALIGN_MAFFT_BIN` if set, `mafft` otherwise.
    pub fn from_env() -> Self {
        let executable = std::env::var(MAFFT_ENV_BIN)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MAFFT_BIN.to_string());
        Self::new(executable)
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Command-line arguments for one run.
    pub fn args(input: &Path, strategy: Strategy, iterations: u32) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            strategy.mafft_flag().to_string(),
            "--maxiterate".to_string(),
            iterations.to_string(),
            input.to_string_lossy().into_owned(),
        ]
    }
}

impl AlignmentProvider for Mafft {
    fn align(
        &self,
        input: &Path,
        strategy: Strategy,
        iterations: u32,
    ) -> Result<String, AlignerError> {
        let args = Self::args(input, strategy, iterations);
        debug!("Running {} {}", self.executable, args.join(" "));

        let output = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    AlignerError::ToolNotFound {
                        executable: self.executable.clone(),
                    }
                } else {
                    AlignerError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(AlignerError::ToolFailed {
                executable: self.executable.clone(),
                args,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(AlignerError::EmptyOutput {
                strategy,
                input: input.to_path_buf(),
            });
        }
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names_and_flags() {
        assert_eq!(Strategy::Global.name(), "ginsi");
        assert_eq!(Strategy::Local.name(), "linsi");
        assert_eq!(Strategy::AffineLocal.name(), "einsi");
        assert_eq!(Strategy::Global.mafft_flag(), "--globalpair");
        assert_eq!(Strategy::Local.mafft_flag(), "--localpair");
        assert_eq!(Strategy::AffineLocal.mafft_flag(), "--genafpair");
    }

    #[test]
    fn test_mafft_args() {
        let args = Mafft::args(Path::new("in.fa"), Strategy::Local, 1000);
        assert_eq!(args, vec!["--quiet", "--localpair", "--maxiterate", "1000", "in.fa"]);
    }

    #[test]
    fn test_missing_executable() {
        let mafft = Mafft::new("consalign-test-no-such-aligner");
        let result = mafft.align(Path::new("in.fa"), Strategy::Global, 0);
        assert!(matches!(result, Err(AlignerError::ToolNotFound { .. })));
    }
}
