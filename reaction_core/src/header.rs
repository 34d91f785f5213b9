//! # Header Location
//!
//! Finds the header row of a table by keyword heuristics. A row matches a
//! keyword set when every keyword occurs, case-insensitively, as a substring
//! of at least one of its cells. Column order, extra columns and label
//! decorations ("FX kN", "L/C No.") therefore do not matter.
//!
//! Data rows that happen to contain all the keywords will match too. That
//! is accepted: header rows come first in every export seen so far.

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, RawGrid};
use crate::settings::TableLayout;

/// Which keyword set located the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordMatch {
    Primary,
    Fallback,
}

/// A located header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLocation {
    /// 0-based grid row index of the header
    pub row: usize,
    pub matched: KeywordMatch,
}

/// Check whether every keyword appears in some cell of the row.
pub fn row_matches(row: &[Cell], keywords: &[String]) -> bool {
    let cells: Vec<String> = row.iter().map(|c| c.display_text().to_uppercase()).collect();
    keywords.iter().all(|keyword| {
        let keyword = keyword.to_uppercase();
        cells.iter().any(|cell| cell.contains(&keyword))
    })
}

fn first_matching_row(grid: &RawGrid, keywords: &[String]) -> Option<usize> {
    grid.rows().position(|row| row_matches(row, keywords))
}

/// Locate the first row matching `primary`, else the first matching `fallback`.
///
/// An empty fallback set disables the second pass.
///
/// # Example
///
/// ```rust
/// use reaction_core::grid::{Cell, RawGrid};
/// use reaction_core::header::{locate_header, KeywordMatch};
///
/// let grid = RawGrid::new(vec![
///     vec![Cell::text("Reactions report")],
///     vec![Cell::text("Node"), Cell::text("Fx kN")],
/// ]);
/// let primary = vec!["NODE".to_string(), "L/C".to_string(), "FX".to_string()];
/// let fallback = vec!["NODE".to_string(), "FX".to_string()];
///
/// let found = locate_header(&grid, &primary, &fallback).unwrap();
/// assert_eq!(found.row, 1);
/// assert_eq!(found.matched, KeywordMatch::Fallback);
/// ```
pub fn locate_header(
    grid: &RawGrid,
    primary: &[String],
    fallback: &[String],
) -> Option<HeaderLocation> {
    if let Some(row) = first_matching_row(grid, primary) {
        return Some(HeaderLocation {
            row,
            matched: KeywordMatch::Primary,
        });
    }

    if fallback.is_empty() {
        return None;
    }

    first_matching_row(grid, fallback).map(|row| HeaderLocation {
        row,
        matched: KeywordMatch::Fallback,
    })
}

/// Locate a table's header using its configured keyword sets
pub fn locate_table(grid: &RawGrid, layout: &TableLayout) -> Option<HeaderLocation> {
    locate_header(grid, &layout.primary_keywords, &layout.fallback_keywords)
}
