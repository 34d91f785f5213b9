//! # Record Extraction
//!
//! Turns the rows under a located header into typed records:
//!
//! - [`extract_reactions`] - one [`ReactionRecord`] per node/load-case row
//! - [`extract_load_cases`] - the [`LoadCaseInfo`] name lookup
//!
//! Reaction exports print the node number once per block of load cases and
//! leave the cell blank on the following rows (merged cells). Blank node
//! cells therefore inherit the last node number seen above them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::{LoadCaseColumns, ReactionColumns};
use crate::errors::{ReactionError, ReactionResult};
use crate::grid::{Cell, RawGrid};

/// Global force axis of a reaction component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "FX")]
    Fx,
    #[serde(rename = "FY")]
    Fy,
    #[serde(rename = "FZ")]
    Fz,
}

impl Axis {
    /// All axes in report order
    pub const ALL: [Axis; 3] = [Axis::Fx, Axis::Fy, Axis::Fz];

    pub fn label(&self) -> &'static str {
        match self {
            Axis::Fx => "FX",
            Axis::Fy => "FY",
            Axis::Fz => "FZ",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One support reaction: a node under one load case.
///
/// `load_case` is always present; rows without one never become records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub node: i64,
    pub load_case: i64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub fz: Option<f64>,
}

impl ReactionRecord {
    /// Force component along an axis
    pub fn force(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Fx => self.fx,
            Axis::Fy => self.fy,
            Axis::Fz => self.fz,
        }
    }
}

/// Load-case number to name lookup.
///
/// Later insertions for the same load case replace earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadCaseInfo {
    names: BTreeMap<i64, String>,
}

impl LoadCaseInfo {
    pub fn new() -> Self {
        LoadCaseInfo::default()
    }

    pub fn insert(&mut self, load_case: i64, name: impl Into<String>) {
        self.names.insert(load_case, name.into());
    }

    /// Name from the load-case table, if it had one
    pub fn name(&self, load_case: i64) -> Option<&str> {
        self.names.get(&load_case).map(String::as_str)
    }

    /// Name from the table, or `"{prefix}{load_case}"` when absent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reaction_core::extract::LoadCaseInfo;
    ///
    /// let mut info = LoadCaseInfo::new();
    /// info.insert(1, "DEAD");
    /// assert_eq!(info.label(1, "LC "), "DEAD");
    /// assert_eq!(info.label(7, "LC "), "LC 7");
    /// ```
    pub fn label(&self, load_case: i64, prefix: &str) -> String {
        match self.name(load_case) {
            Some(name) => name.to_string(),
            None => format!("{}{}", prefix, load_case),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.names.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Truncate a numeric cell value to an integer id (toward zero).
fn to_integer(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

fn integer_cell(cell: &Cell) -> Option<i64> {
    cell.as_number().and_then(to_integer)
}

/// Forward-fill state of the node column
enum NodeFill {
    Unset,
    Node(i64),
    Invalid(String),
}

/// Extract reaction records from the rows under the reactions header.
///
/// Rows start `spacer_rows + 1` below `header_row`. Rows whose L/C cell is
/// blank or not numeric are dropped (separators, totals). Forces that are
/// blank or not numeric become `None`.
///
/// # Returns
///
/// * `Ok(records)` - Records in sheet order
/// * `Err(ReactionError::InvalidData)` - A row with a load case has no usable node number
pub fn extract_reactions(
    grid: &RawGrid,
    header_row: usize,
    columns: &ReactionColumns,
    spacer_rows: usize,
) -> ReactionResult<Vec<ReactionRecord>> {
    let first_row = header_row + 1 + spacer_rows;
    let mut fill = NodeFill::Unset;
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in first_row..grid.len() {
        let node_cell = grid.cell(row, columns.node);
        if !node_cell.is_blank() {
            fill = match integer_cell(node_cell) {
                Some(node) => NodeFill::Node(node),
                None => NodeFill::Invalid(node_cell.display_text()),
            };
        }

        let Some(load_case) = integer_cell(grid.cell(row, columns.load_case)) else {
            dropped += 1;
            continue;
        };

        let node = match &fill {
            NodeFill::Node(node) => *node,
            NodeFill::Unset => {
                return Err(ReactionError::invalid_data(
                    grid.sheet_row(row),
                    "Node",
                    "",
                    "no node number on or above this row",
                ))
            }
            NodeFill::Invalid(text) => {
                return Err(ReactionError::invalid_data(
                    grid.sheet_row(row),
                    "Node",
                    text.clone(),
                    "node is not a number",
                ))
            }
        };

        records.push(ReactionRecord {
            node,
            load_case,
            fx: grid.cell(row, columns.fx).as_number(),
            fy: grid.cell(row, columns.fy).as_number(),
            fz: grid.cell(row, columns.fz).as_number(),
        });
    }

    log::debug!(
        "Extracted {} reaction records ({} rows without a load case dropped)",
        records.len(),
        dropped
    );
    Ok(records)
}

/// Extract load-case names from the rows under the load-case header.
///
/// Rows without a numeric L/C or with a blank name are skipped.
pub fn extract_load_cases(
    grid: &RawGrid,
    header_row: usize,
    columns: &LoadCaseColumns,
    spacer_rows: usize,
) -> LoadCaseInfo {
    let mut info = LoadCaseInfo::new();

    for row in (header_row + 1 + spacer_rows)..grid.len() {
        let Some(load_case) = integer_cell(grid.cell(row, columns.load_case)) else {
            continue;
        };
        let name_cell = grid.cell(row, columns.name);
        if name_cell.is_blank() {
            continue;
        }
        info.insert(load_case, name_cell.display_text().trim());
    }

    log::debug!("Extracted {} load case names", info.len());
    info
}
