//! Standard genetic code and codon translation.
//!
//! The table is built once on first use and shared read-only by every
//! `CodonSequence` in the process.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::model::SequenceError;

/// Amino acid emitted for a codon made only of gaps.
pub const GAP_AMINO_ACID: char = '-';

/// Amino acid emitted for codons that are not in the table (ambiguity codes, partial gaps).
pub const UNKNOWN_AMINO_ACID: char = 'X';

/// The codon made only of gap characters.
pub const GAP_CODON: &str = "---";

/// Nucleotide order used to enumerate the 64 codons (NCBI order: TTT, TTC, TTA, TTG, TCT, ...).
pub const BASES: [char; 4] = ['T', 'C', 'A', 'G'];

const STANDARD_NCBIEAA: &str = "FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

/// The standard genetic code (NCBI table 1), plus the gap codon.
pub static STANDARD: LazyLock<GeneticCode> =
    LazyLock::new(|| GeneticCode::new(STANDARD_NCBIEAA));

/// A genetic code table for translating codons to amino acids.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    /// 64 sense/stop codons and the gap codon
    codon_table: HashMap<String, char>,
}

impl GeneticCode {
    /// Builds a table from a 64-character NCBI amino acid string.
    fn new(ncbieaa: &str) -> Self {
        let mut codon_table: HashMap<String, char> = HashMap::with_capacity(65);
        let mut amino_acids = ncbieaa.chars();

        for &b1 in &BASES {
            for &b2 in &BASES {
                for &b3 in &BASES {
                    let aa = amino_acids.next().unwrap_or(UNKNOWN_AMINO_ACID);
                    codon_table.insert([b1, b2, b3].iter().collect(), aa);
                }
            }
        }
        codon_table.insert(GAP_CODON.to_string(), GAP_AMINO_ACID);

        Self { codon_table }
    }

    /// Translates a single codon.
    ///
    /// Lookup is case-insensitive and `U` is read as `T`. Anything that is
    /// not one of the 64 codons or the gap codon becomes `X`.
    pub fn translate_codon(&self, codon: &str) -> char {
        let normalized: String = codon
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'U' => 'T',
                other => other,
            })
            .collect();

        self.codon_table
            .get(&normalized)
            .copied()
            .unwrap_or(UNKNOWN_AMINO_ACID)
    }

    /// Translates a nucleotide string codon by codon.
    ///
    /// The length (in characters) must be a multiple of 3.
    pub fn translate(&self, sequence: &str) -> Result<String, SequenceError> {
        let chars: Vec<char> = sequence.chars().collect();
        if chars.len() % 3 != 0 {
            return Err(SequenceError::NotCodonAligned { len: chars.len() });
        }

        Ok(chars
            .chunks_exact(3)
            .map(|codon| self.translate_codon(&codon.iter().collect::<String>()))
            .collect())
    }
}

/// Translates with the standard genetic code.
pub fn translate(sequence: &str) -> Result<String, SequenceError> {
    STANDARD.translate(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMINO_ACIDS: [char; 20] = [
        'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I', 'L', 'K', 'M', 'F', 'P', 'S', 'T', 'W',
        'Y', 'V',
    ];

    const STOP_CODONS: [&str; 3] = ["TGA", "TAG", "TAA"];

    #[test]
    fn test_standard_code_translation() {
        assert_eq!(STANDARD.translate_codon("ATG"), 'M');
        assert_eq!(STANDARD.translate_codon("TTT"), 'F');
        assert_eq!(STANDARD.translate_codon("GGG"), 'G');
        for stop in STOP_CODONS {
            assert_eq!(STANDARD.translate_codon(stop), '*');
        }
    }

    #[test]
    fn test_table_covers_all_codons() {
        let mut seen = std::collections::HashSet::new();
        for &b1 in &BASES {
            for &b2 in &BASES {
                for &b3 in &BASES {
                    let codon: String = [b1, b2, b3].iter().collect();
                    let aa = STANDARD.translate_codon(&codon);
                    assert_ne!(aa, UNKNOWN_AMINO_ACID, "{codon} missing");
                    seen.insert(aa);
                }
            }
        }
        for aa in AMINO_ACIDS {
            assert!(seen.contains(&aa), "{aa} never produced");
        }
    }

    #[test]
    fn test_gap_codon() {
        assert_eq!(STANDARD.translate_codon("---"), '-');
        // Partial gaps are not in the table
        assert_eq!(STANDARD.translate_codon("A--"), 'X');
    }

    #[test]
    fn test_case_and_rna() {
        assert_eq!(STANDARD.translate_codon("atg"), 'M');
        assert_eq!(STANDARD.translate_codon("AuG"), 'M');
        assert_eq!(STANDARD.translate_codon("NNN"), 'X');
    }

    #[test]
    fn test_translate_sequence() {
        assert_eq!(translate("ATGTTTTAG").unwrap(), "MF*");
        assert_eq!(translate("ATG---AAA").unwrap(), "M-K");
        assert_eq!(translate("").unwrap(), "");
    }

    #[test]
    fn test_translate_rejects_partial_codon() {
        let result = translate("ATGA");
        assert!(matches!(
            result,
            Err(SequenceError::NotCodonAligned { len: 4 })
        ));
    }
}
