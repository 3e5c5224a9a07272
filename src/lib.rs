//! # consalign - Cross-strategy alignment consistency
//!
//! Aligns the same unaligned sequences with three MAFFT strategies (global,
//! local and affine-local) and marks the alignment columns on which all
//! three agree.
//!
//! ## Architecture
//!
//! - `model`: Character and codon sequences, alignments
//! - `genetic_code`: Standard genetic code used by codon sequences
//! - `fasta`: FASTA parsing and writing
//! - `coords`: Ungapped coordinate matrices
//! - `consistency`: Column-by-column comparison of coordinate matrices
//! - `marker`: Marked alignment output
//! - `aligner`: Alignment strategies and the external aligner
//! - `pipeline`: Single-file and batch orchestration

pub mod aligner;
pub mod consistency;
pub mod coords;
pub mod fasta;
pub mod genetic_code;
pub mod marker;
pub mod model;
pub mod pipeline;
