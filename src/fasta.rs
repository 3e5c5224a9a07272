//! FASTA reader and writer.
//!
//! This module handles reading and writing FASTA alignments.
//! It supports both single-line and multi-line sequences.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional title
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! The identifier is everything before the first space of the header and may
//! be empty. Content lines are concatenated as-is, only line terminators are
//! removed. Blank lines and lines starting with `#` are ignored. Records whose
//! content is empty are dropped.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use thiserror::Error;

use crate::model::{Alignment, Sequence, SequenceError, SequenceKind, SiteSequence};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Failed to read FASTA: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),

    #[error("Invalid record '{id}': {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: SequenceError,
    },

    #[error("Not an alignment: {0}")]
    InvalidAlignment(#[source] SequenceError),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Header fields of the record being accumulated.
struct Header {
    id: String,
    title: String,
}

impl Header {
    fn parse(header: &str) -> Self {
        let (id, title) = header.split_once(' ').unwrap_or((header, ""));
        Self {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    fn into_sequence(self, kind: SequenceKind, data: String) -> FastaResult<Sequence> {
        Sequence::with_kind(kind, self.id.clone(), self.title, data)
            .map_err(|source| FastaError::InvalidRecord { id: self.id, source })
    }
}

/// Parses FASTA content from a reader, building rows of the given kind.
///
/// All rows must end up with the same number of sites.
pub fn parse_fasta<R: BufRead>(reader: R, kind: SequenceKind) -> FastaResult<Alignment> {
    let mut sequences = Vec::new();
    let mut current: Option<Header> = None;
    let mut current_seq = String::new();
    let mut line_number = 0;

    for line_result in reader.lines() {
        line_number += 1;
        let line = line_result?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            // Save previous sequence if exists
            if let Some(previous) = current.take() {
                if !current_seq.is_empty() {
                    sequences.push(previous.into_sequence(kind, std::mem::take(&mut current_seq))?);
                }
            }
            current = Some(Header::parse(header));
            current_seq.clear();
        } else {
            if current.is_none() {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            }
            current_seq.push_str(line);
        }
    }

    // Don't forget the last sequence
    if let Some(last) = current {
        if !current_seq.is_empty() {
            sequences.push(last.into_sequence(kind, current_seq)?);
        }
    }

    if sequences.is_empty() {
        return Err(FastaError::EmptyFile);
    }

    Alignment::new(sequences).map_err(FastaError::InvalidAlignment)
}

/// Parses FASTA content from a string.
pub fn parse_fasta_str(content: &str) -> FastaResult<Alignment> {
    parse_fasta(content.as_bytes(), SequenceKind::Char)
}

/// Parses FASTA content from a string into rows of the given kind.
pub fn parse_fasta_str_as(content: &str, kind: SequenceKind) -> FastaResult<Alignment> {
    parse_fasta(content.as_bytes(), kind)
}

/// Appends one record: a `>id title` header line, then the content on one line.
pub fn push_record(out: &mut String, id: &str, title: &str, data: &str) {
    out.push('>');
    out.push_str(id);
    if !title.is_empty() {
        out.push(' ');
        out.push_str(title);
    }
    out.push('\n');
    out.push_str(data);
    out.push('\n');
}

/// Appends every row of an alignment in row order.
pub fn push_alignment(out: &mut String, alignment: &Alignment) {
    for seq in alignment {
        push_record(out, seq.id(), seq.title(), seq.as_str());
    }
}

/// Serializes an alignment to FASTA text.
pub fn to_fasta_string(alignment: &Alignment) -> String {
    let mut out = String::new();
    push_alignment(&mut out, alignment);
    out
}

/// Writes an alignment to a FASTA file, replacing any existing file.
pub fn write_fasta_file<P: AsRef<Path>>(path: P, alignment: &Alignment) -> io::Result<()> {
    fs::write(path, to_fasta_string(alignment))
}
