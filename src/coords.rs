//! Ungapped coordinates of an alignment.
//!
//! Each aligned column is mapped to the index of the residue it holds in its
//! own ungapped row, so that alignments of the same input can be compared
//! column by column regardless of where each one placed its gaps.

use crate::model::{Alignment, SequenceError, SiteSequence};

/// Per row and column, the 0-based ungapped residue index or
/// [`GAP_POSITION`](crate::model::GAP_POSITION).
///
/// Rows are kept in the alignment's row order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UngappedMatrix {
    rows: Vec<Vec<isize>>,
}

impl UngappedMatrix {
    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<Vec<isize>>) -> Self {
        Self { rows }
    }

    /// Builds the matrix of an alignment, one row per sequence.
    pub fn from_alignment(alignment: &Alignment, gap: &str) -> Result<Self, SequenceError> {
        let rows = alignment
            .iter()
            .map(|seq| seq.ungapped_position_slice(gap))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the first row (0 for an empty matrix).
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// True when every row has the same width.
    pub fn is_rectangular(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().all(|row| row.len() == width)
    }

    pub fn rows(&self) -> &[Vec<isize>] {
        &self.rows
    }
}

/// Builds the ungapped coordinate matrix of an alignment.
pub fn ungapped_position_matrix(
    alignment: &Alignment,
    gap: &str,
) -> Result<UngappedMatrix, SequenceError> {
    UngappedMatrix::from_alignment(alignment, gap)
}

/// Row and column of every non-gap site, row by row.
///
/// The two vectors have equal length; entry `k` of each is one site.
pub fn ungapped_coords(
    alignment: &Alignment,
    gap: &str,
) -> Result<(Vec<usize>, Vec<usize>), SequenceError> {
    let mut row_coords = Vec::new();
    let mut col_coords = Vec::new();
    for (row, seq) in alignment.iter().enumerate() {
        let cols = seq.ungapped_coords(gap)?;
        row_coords.extend(std::iter::repeat(row).take(cols.len()));
        col_coords.extend(cols);
    }
    Ok((row_coords, col_coords))
}
