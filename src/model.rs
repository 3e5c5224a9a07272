//! Data model for sequences and alignments.
//!
//! Two kinds of sequence share one capability set ([`SiteSequence`]):
//! - [`CharSequence`]: one character per site (nucleotides, one-letter amino acids)
//! - [`CodonSequence`]: one codon per site, with the nucleotide string, the codon
//!   list and the translated protein kept in step
//!
//! [`Sequence`] is the tagged union stored in an [`Alignment`].

use std::fmt;

use thiserror::Error;

use crate::genetic_code;

/// Value used in ungapped position slices for gap sites.
pub const GAP_POSITION: isize = -1;

/// Errors raised when a sequence would break its structural invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Sequence length ({len}) is not divisible by 3")]
    NotCodonAligned { len: usize },

    #[error("Gap symbol {found:?} must be {expected} character(s) long")]
    GapSymbolLength { expected: usize, found: String },

    #[error("Codon {index} ({codon:?}) is not 3 nucleotides long")]
    InvalidCodon { index: usize, codon: String },

    #[error("Row {row} has {found} sites, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Operations shared by every kind of sequence.
///
/// A "site" is the unit a column of the alignment holds for this row: one
/// character for a [`CharSequence`], one codon for a [`CodonSequence`].
pub trait SiteSequence {
    /// The sequence identifier (from FASTA header, without '>')
    fn id(&self) -> &str;

    /// The free text following the identifier in the header.
    fn title(&self) -> &str;

    /// Raw content as it is written to FASTA.
    fn as_str(&self) -> &str;

    /// Site at a column, if in range.
    fn site(&self, index: usize) -> Option<&str>;

    /// Number of sites (alignment columns) in the sequence.
    fn site_count(&self) -> usize;

    /// Replaces the raw content.
    fn set_sequence(&mut self, seq: String) -> Result<(), SequenceError>;

    /// Upper-cases ASCII letters; the site count never changes.
    fn to_upper(&mut self);

    /// Lower-cases ASCII letters; the site count never changes.
    fn to_lower(&mut self);

    /// For each site, whether it equals the gap symbol.
    fn gap_mask(&self, gap: &str) -> Result<Vec<bool>, SequenceError>;

    /// Columns holding a non-gap site, in increasing order.
    fn ungapped_coords(&self, gap: &str) -> Result<Vec<usize>, SequenceError> {
        Ok(self
            .gap_mask(gap)?
            .into_iter()
            .enumerate()
            .filter_map(|(col, is_gap)| (!is_gap).then_some(col))
            .collect())
    }

    /// Per column, the 0-based rank of the site among non-gap sites,
    /// or [`GAP_POSITION`] where the site is a gap.
    fn ungapped_position_slice(&self, gap: &str) -> Result<Vec<isize>, SequenceError> {
        let mut count: isize = 0;
        Ok(self
            .gap_mask(gap)?
            .into_iter()
            .map(|is_gap| {
                if is_gap {
                    GAP_POSITION
                } else {
                    count += 1;
                    count - 1
                }
            })
            .collect())
    }
}

/// Single-character sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSequence {
    id: String,
    title: String,
    data: String,
}

impl CharSequence {
    pub fn new(id: impl Into<String>, title: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            data: data.into(),
        }
    }
}

impl SiteSequence for CharSequence {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn as_str(&self) -> &str {
        &self.data
    }

    fn site(&self, index: usize) -> Option<&str> {
        let (start, c) = self.data.char_indices().nth(index)?;
        Some(&self.data[start..start + c.len_utf8()])
    }

    fn site_count(&self) -> usize {
        self.data.chars().count()
    }

    fn set_sequence(&mut self, seq: String) -> Result<(), SequenceError> {
        self.data = seq;
        Ok(())
    }

    fn to_upper(&mut self) {
        self.data.make_ascii_uppercase();
    }

    fn to_lower(&mut self) {
        self.data.make_ascii_lowercase();
    }

    fn gap_mask(&self, gap: &str) -> Result<Vec<bool>, SequenceError> {
        let mut chars = gap.chars();
        let gap_char = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(SequenceError::GapSymbolLength {
                    expected: 1,
                    found: gap.to_string(),
                })
            }
        };
        Ok(self.data.chars().map(|c| c == gap_char).collect())
    }
}

/// Codon sequence.
///
/// `seq`, `codons` and `protein` follow a positional correspondence: codon
/// `i` is `seq[3i..3i+3]` and translates to `protein[i]`. There is no
/// protein setter since translation cannot be reversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodonSequence {
    id: String,
    title: String,
    seq: String,
    codons: Vec<String>,
    protein: String,
}

impl CodonSequence {
    /// Creates a codon sequence; codons and protein are derived from `seq`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        seq: impl Into<String>,
    ) -> Result<Self, SequenceError> {
        let mut s = Self {
            id: id.into(),
            title: title.into(),
            seq: String::new(),
            codons: Vec::new(),
            protein: String::new(),
        };
        s.set_sequence(seq.into())?;
        Ok(s)
    }

    pub fn codons(&self) -> &[String] {
        &self.codons
    }

    /// The translated amino acid sequence.
    pub fn protein(&self) -> &str {
        &self.protein
    }

    pub fn codon(&self, index: usize) -> Option<&str> {
        self.codons.get(index).map(String::as_str)
    }

    pub fn amino_acid(&self, index: usize) -> Option<char> {
        self.protein.chars().nth(index)
    }

    pub fn nucleotide(&self, index: usize) -> Option<char> {
        self.seq.chars().nth(index)
    }

    /// Replaces the codons; the nucleotide string and protein are recomputed.
    pub fn set_codons(&mut self, codons: Vec<String>) -> Result<(), SequenceError> {
        if let Some((index, codon)) = codons
            .iter()
            .enumerate()
            .find(|(_, c)| c.chars().count() != 3)
        {
            return Err(SequenceError::InvalidCodon {
                index,
                codon: codon.clone(),
            });
        }
        let seq = codons.concat();
        self.protein = genetic_code::translate(&seq)?;
        self.seq = seq;
        self.codons = codons;
        Ok(())
    }
}

impl SiteSequence for CodonSequence {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn as_str(&self) -> &str {
        &self.seq
    }

    fn site(&self, index: usize) -> Option<&str> {
        self.codon(index)
    }

    fn site_count(&self) -> usize {
        self.codons.len()
    }

    fn set_sequence(&mut self, seq: String) -> Result<(), SequenceError> {
        // Translation validates the length before anything is overwritten
        let protein = genetic_code::translate(&seq)?;
        let chars: Vec<char> = seq.chars().collect();
        self.codons = chars.chunks_exact(3).map(|c| c.iter().collect()).collect();
        self.protein = protein;
        self.seq = seq;
        Ok(())
    }

    fn to_upper(&mut self) {
        self.seq.make_ascii_uppercase();
        self.protein.make_ascii_uppercase();
        self.codons.iter_mut().for_each(|c| c.make_ascii_uppercase());
    }

    fn to_lower(&mut self) {
        self.seq.make_ascii_lowercase();
        self.protein.make_ascii_lowercase();
        self.codons.iter_mut().for_each(|c| c.make_ascii_lowercase());
    }

    fn gap_mask(&self, gap: &str) -> Result<Vec<bool>, SequenceError> {
        if gap.chars().count() != 3 {
            return Err(SequenceError::GapSymbolLength {
                expected: 3,
                found: gap.to_string(),
            });
        }
        Ok(self.codons.iter().map(|c| c == gap).collect())
    }
}

/// A row of an alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sequence {
    Char(CharSequence),
    Codon(CodonSequence),
}

/// How rows are parsed from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceKind {
    #[default]
    Char,
    Codon,
}

impl Sequence {
    /// Creates a single-character sequence without a title.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Sequence::Char(CharSequence::new(id, "", data))
    }

    /// Creates a sequence of the given kind.
    pub fn with_kind(
        kind: SequenceKind,
        id: impl Into<String>,
        title: impl Into<String>,
        data: impl Into<String>,
    ) -> Result<Self, SequenceError> {
        Ok(match kind {
            SequenceKind::Char => Sequence::Char(CharSequence::new(id, title, data)),
            SequenceKind::Codon => Sequence::Codon(CodonSequence::new(id, title, data)?),
        })
    }

    pub fn as_codon(&self) -> Option<&CodonSequence> {
        match self {
            Sequence::Codon(s) => Some(s),
            Sequence::Char(_) => None,
        }
    }

    fn inner(&self) -> &dyn SiteSequence {
        match self {
            Sequence::Char(s) => s,
            Sequence::Codon(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SiteSequence {
        match self {
            Sequence::Char(s) => s,
            Sequence::Codon(s) => s,
        }
    }
}

impl SiteSequence for Sequence {
    fn id(&self) -> &str {
        self.inner().id()
    }

    fn title(&self) -> &str {
        self.inner().title()
    }

    fn as_str(&self) -> &str {
        self.inner().as_str()
    }

    fn site(&self, index: usize) -> Option<&str> {
        self.inner().site(index)
    }

    fn site_count(&self) -> usize {
        self.inner().site_count()
    }

    fn set_sequence(&mut self, seq: String) -> Result<(), SequenceError> {
        self.inner_mut().set_sequence(seq)
    }

    fn to_upper(&mut self) {
        self.inner_mut().to_upper()
    }

    fn to_lower(&mut self) {
        self.inner_mut().to_lower()
    }

    fn gap_mask(&self, gap: &str) -> Result<Vec<bool>, SequenceError> {
        self.inner().gap_mask(gap)
    }
}

/// Case folding applied to an alignment before it is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Upper,
    Lower,
    Unchanged,
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseMode::Upper => write!(f, "upper"),
            CaseMode::Lower => write!(f, "lower"),
            CaseMode::Unchanged => write!(f, "no"),
        }
    }
}

/// Represents an alignment of multiple sequences.
///
/// Every row has the same number of sites. Row order is meaningful: row `i`
/// of alignments computed from the same input refers to the same input
/// sequence.
#[derive(Debug, Clone)]
pub struct Alignment {
    sequences: Vec<Sequence>,
    /// Site count shared by all rows
    alignment_length: usize,
}

impl Alignment {
    /// Creates an alignment, rejecting rows whose site count differs from the first row.
    pub fn new(sequences: Vec<Sequence>) -> Result<Self, SequenceError> {
        let alignment_length = sequences.first().map_or(0, |s| s.site_count());
        if let Some((row, found)) = sequences
            .iter()
            .map(|s| s.site_count())
            .enumerate()
            .find(|&(_, len)| len != alignment_length)
        {
            return Err(SequenceError::RaggedRow {
                row,
                expected: alignment_length,
                found,
            });
        }
        Ok(Self {
            sequences,
            alignment_length,
        })
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the number of columns.
    pub fn alignment_length(&self) -> usize {
        self.alignment_length
    }

    /// Gets a sequence by index.
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    /// Row identifiers in row order.
    pub fn ids(&self) -> Vec<&str> {
        self.sequences.iter().map(|s| s.id()).collect()
    }

    pub fn to_upper(&mut self) {
        self.sequences.iter_mut().for_each(SiteSequence::to_upper);
    }

    pub fn to_lower(&mut self) {
        self.sequences.iter_mut().for_each(SiteSequence::to_lower);
    }

    pub fn apply_case(&mut self, mode: CaseMode) {
        match mode {
            CaseMode::Upper => self.to_upper(),
            CaseMode::Lower => self.to_lower(),
            CaseMode::Unchanged => {}
        }
    }
}

impl<'a> IntoIterator for &'a Alignment {
    type Item = &'a Sequence;
    type IntoIter = std::slice::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}
