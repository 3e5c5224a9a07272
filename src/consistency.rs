//! Cross-strategy column consistency.
//!
//! A column is consistent when every alignment places the same residues of
//! the same input sequences in it, i.e. when the column of every ungapped
//! coordinate matrix is identical to the column of the first matrix.

use thiserror::Error;

use crate::coords::{ungapped_position_matrix, UngappedMatrix};
use crate::fasta::{parse_fasta_str_as, FastaError};
use crate::model::{Alignment, SequenceError, SequenceKind};

/// Errors raised before any column is compared.
#[derive(Error, Debug)]
pub enum ConsistencyError {
    #[error("At least 2 alignments are needed to compare columns (got {0})")]
    TooFewAlignments(usize),

    #[error("Alignment {index} has no rows")]
    EmptyMatrix { index: usize },

    #[error("Alignment {index} has rows of different lengths")]
    RaggedAlignment { index: usize },

    #[error("Alignment {index} has {found} rows, expected {expected}")]
    RowCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Alignment {index} has {found} columns, expected {expected}")]
    ColumnCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("Alignment {index} row {row} is '{found}', expected '{expected}'")]
    RowOrderMismatch {
        index: usize,
        row: usize,
        expected: String,
        found: String,
    },

    #[error("Could not read alignment {index}: {source}")]
    Fasta {
        index: usize,
        #[source]
        source: FastaError,
    },

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// One flag per column, true when the column is consistent.
pub type ConsistencyVector = Vec<bool>;

/// Checks that all matrices share the first matrix's shape.
fn check_shapes(matrices: &[UngappedMatrix]) -> Result<(usize, usize), ConsistencyError> {
    if matrices.len() < 2 {
        return Err(ConsistencyError::TooFewAlignments(matrices.len()));
    }

    let expected_rows = matrices[0].row_count();
    let expected_cols = matrices[0].column_count();

    for (index, matrix) in matrices.iter().enumerate() {
        if matrix.row_count() == 0 {
            return Err(ConsistencyError::EmptyMatrix { index });
        }
        if !matrix.is_rectangular() {
            return Err(ConsistencyError::RaggedAlignment { index });
        }
        if matrix.row_count() != expected_rows {
            return Err(ConsistencyError::RowCountMismatch {
                index,
                expected: expected_rows,
                found: matrix.row_count(),
            });
        }
        if matrix.column_count() != expected_cols {
            return Err(ConsistencyError::ColumnCountMismatch {
                index,
                expected: expected_cols,
                found: matrix.column_count(),
            });
        }
    }

    Ok((expected_rows, expected_cols))
}

/// Classifies each column of the first matrix against all the others.
///
/// Matrices must have the same number of rows and columns; mismatched
/// shapes are reported instead of being padded or truncated.
pub fn consistent_positions(
    matrices: &[UngappedMatrix],
) -> Result<ConsistencyVector, ConsistencyError> {
    let (n_rows, n_cols) = check_shapes(matrices)?;
    let reference = matrices[0].rows();
    let others = &matrices[1..];

    Ok((0..n_cols)
        .map(|col| {
            // A single differing row in any matrix makes the column inconsistent
            others.iter().all(|other| {
                let other = other.rows();
                (0..n_rows).all(|row| reference[row][col] == other[row][col])
            })
        })
        .collect())
}

/// Checks that every alignment lists the same identifiers in the same order.
fn check_row_order(alignments: &[Alignment]) -> Result<(), ConsistencyError> {
    let Some((first, rest)) = alignments.split_first() else {
        return Ok(());
    };
    let expected = first.ids();
    for (offset, alignment) in rest.iter().enumerate() {
        let index = offset + 1;
        let found = alignment.ids();
        if found.len() != expected.len() {
            return Err(ConsistencyError::RowCountMismatch {
                index,
                expected: expected.len(),
                found: found.len(),
            });
        }
        if let Some(row) = (0..expected.len()).find(|&row| expected[row] != found[row]) {
            return Err(ConsistencyError::RowOrderMismatch {
                index,
                row,
                expected: expected[row].to_string(),
                found: found[row].to_string(),
            });
        }
    }
    Ok(())
}

/// Compares already parsed alignments of the same input.
pub fn alignment_consistency(
    alignments: &[Alignment],
    gap: &str,
) -> Result<ConsistencyVector, ConsistencyError> {
    if alignments.len() < 2 {
        return Err(ConsistencyError::TooFewAlignments(alignments.len()));
    }
    check_row_order(alignments)?;

    let matrices = alignments
        .iter()
        .map(|alignment| ungapped_position_matrix(alignment, gap))
        .collect::<Result<Vec<_>, _>>()?;

    consistent_positions(&matrices)
}

/// Parses FASTA alignments of the same input and compares their columns.
pub fn compute_consistency(
    alignment_texts: &[&str],
    gap: &str,
    kind: SequenceKind,
) -> Result<ConsistencyVector, ConsistencyError> {
    let alignments = alignment_texts
        .iter()
        .enumerate()
        .map(|(index, text)| {
            parse_fasta_str_as(text, kind).map_err(|source| ConsistencyError::Fasta { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    alignment_consistency(&alignments, gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[isize]]) -> UngappedMatrix {
        UngappedMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect())
    }

    #[test]
    fn test_identical_matrices_are_consistent() {
        let m = matrix(&[&[0, 1, 2, 3], &[0, -1, 1, 2]]);
        let result = consistent_positions(&[m.clone(), m.clone(), m]).unwrap();
        assert_eq!(result, vec![true, true, true, true]);
    }

    #[test]
    fn test_shifted_gap_flips_columns() {
        let m = matrix(&[&[0, 1, 2, 3], &[0, -1, 1, 2]]);
        let shifted = matrix(&[&[0, 1, 2, 3], &[0, 1, -1, 2]]);
        let result = consistent_positions(&[m.clone(), m, shifted]).unwrap();
        assert_eq!(result, vec![true, false, false, true]);
    }

    #[test]
    fn test_single_value_change_in_any_matrix() {
        let base = matrix(&[&[0, 1, 2], &[0, 1, 2], &[-1, 0, 1]]);
        for k in 0..3 {
            for row in 0..3 {
                let mut rows = base.rows().to_vec();
                rows[row][1] = 7;
                let mut matrices = vec![base.clone(), base.clone(), base.clone()];
                matrices[k] = UngappedMatrix::from_rows(rows);

                let result = consistent_positions(&matrices).unwrap();
                assert_eq!(result, vec![true, false, true], "matrix {k} row {row}");
            }
        }
    }

    #[test]
    fn test_gap_sentinels_match_each_other() {
        let m = matrix(&[&[-1, 0], &[-1, 0]]);
        assert_eq!(consistent_positions(&[m.clone(), m]).unwrap(), vec![true, true]);
    }

    #[test]
    fn test_deterministic() {
        let a = matrix(&[&[0, 1, -1], &[0, -1, 1]]);
        let b = matrix(&[&[0, -1, 1], &[0, -1, 1]]);
        let first = consistent_positions(&[a.clone(), b.clone()]).unwrap();
        let second = consistent_positions(&[a, b]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let a = matrix(&[&[0, 1, 2]]);
        let wider = matrix(&[&[0, 1, 2, -1]]);
        let taller = matrix(&[&[0, 1, 2], &[0, 1, 2]]);

        assert!(matches!(
            consistent_positions(&[a.clone(), wider]),
            Err(ConsistencyError::ColumnCountMismatch { index: 1, expected: 3, found: 4 })
        ));
        assert!(matches!(
            consistent_positions(&[a.clone(), a.clone(), taller]),
            Err(ConsistencyError::RowCountMismatch { index: 2, .. })
        ));
        assert!(matches!(
            consistent_positions(&[a]),
            Err(ConsistencyError::TooFewAlignments(1))
        ));
    }

    #[test]
    fn test_empty_and_ragged_matrices() {
        let empty = UngappedMatrix::default();
        let a = matrix(&[&[0, 1]]);
        assert!(matches!(
            consistent_positions(&[a.clone(), empty]),
            Err(ConsistencyError::EmptyMatrix { index: 1 })
        ));

        let ragged = matrix(&[&[0, 1], &[0]]);
        assert!(matches!(
            consistent_positions(&[ragged.clone(), ragged]),
            Err(ConsistencyError::RaggedAlignment { index: 0 })
        ));
    }

    #[test]
    fn test_compute_consistency_from_text() {
        let text = ">seqA\nACGT\n>seqB\nA-GT\n";
        let result = compute_consistency(&[text, text, text], "-", SequenceKind::Char).unwrap();
        assert_eq!(result, vec![true; 4]);

        let shifted = ">seqA\nACGT\n>seqB\nAG-T\n";
        let result = compute_consistency(&[text, text, shifted], "-", SequenceKind::Char).unwrap();
        assert_eq!(result, vec![true, false, false, true]);
    }

    #[test]
    fn test_compute_consistency_missing_alignment() {
        let text = ">seqA\nACGT\n";
        let result = compute_consistency(&[text, "", text], "-", SequenceKind::Char);
        assert!(matches!(
            result,
            Err(ConsistencyError::Fasta { index: 1, source: FastaError::EmptyFile })
        ));
    }

    #[test]
    fn test_compute_consistency_row_order() {
        let a = ">x\nAC\n>y\nAC\n";
        let b = ">y\nAC\n>x\nAC\n";
        let result = compute_consistency(&[a, b], "-", SequenceKind::Char);
        assert!(matches!(
            result,
            Err(ConsistencyError::RowOrderMismatch { index: 1, row: 0, .. })
        ));
    }

    #[test]
    fn test_compute_consistency_codons() {
        let a = ">c1\nATGAAACCC\n>c2\nATG---CCC\n";
        let b = ">c1\nATGAAACCC\n>c2\n---ATGCCC\n";
        let result = compute_consistency(&[a, b], "---", SequenceKind::Codon).unwrap();
        assert_eq!(result, vec![false, false, true]);

        let result = compute_consistency(&[a, b], "-", SequenceKind::Codon);
        assert!(matches!(result, Err(ConsistencyError::Sequence(_))));
    }
}
