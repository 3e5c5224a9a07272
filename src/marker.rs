//! Marked alignment output.
//!
//! The reference alignment is written as FASTA, preceded by a synthetic
//! marker row holding one symbol per column.

use crate::fasta::{push_alignment, push_record};
use crate::model::{Alignment, CaseMode};

/// Identifier and symbols of the marker row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub marker_id: String,
    pub consistent: char,
    pub inconsistent: char,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            marker_id: "marker".to_string(),
            consistent: 'C',
            inconsistent: 'N',
        }
    }
}

impl MarkerStyle {
    /// The marker row content for a consistency vector.
    pub fn marker_row(&self, consistent: &[bool]) -> String {
        consistent
            .iter()
            .map(|&c| if c { self.consistent } else { self.inconsistent })
            .collect()
    }
}

/// Renders the marked alignment as FASTA text.
///
/// `case` is applied to the reference rows before they are written.
pub fn render_marked_alignment(
    mut alignment: Alignment,
    consistent: &[bool],
    style: &MarkerStyle,
    case: CaseMode,
) -> String {
    alignment.apply_case(case);
    let mut out = String::new();
    push_record(&mut out, &style.marker_id, "", &style.marker_row(consistent));
    push_alignment(&mut out, &alignment);
    out
}
