//! # Column Mapping
//!
//! Binds semantic columns (Node, L/C, FX, ...) to source columns of a
//! located header row by case-insensitive substring match on the labels.
//!
//! Labels are scanned left to right and each semantic column takes the
//! first label that matches it. A single label is classified into at most
//! one semantic column, tested in declaration order, so `"Node L/C"` is a
//! Node column and never also the L/C column.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ReactionError, ReactionResult};
use crate::grid::Cell;

/// A semantic column of either table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Node,
    LoadCase,
    Fx,
    Fy,
    Fz,
    Name,
}

impl ColumnRole {
    /// Columns of the reactions table, in classification order
    pub const REACTIONS: [ColumnRole; 5] = [
        ColumnRole::Node,
        ColumnRole::LoadCase,
        ColumnRole::Fx,
        ColumnRole::Fy,
        ColumnRole::Fz,
    ];

    /// Columns of the load-case table, in classification order
    pub const LOAD_CASES: [ColumnRole; 2] = [ColumnRole::LoadCase, ColumnRole::Name];

    /// Uppercase substrings any of which identifies the column
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Node => &["NODE"],
            ColumnRole::LoadCase => &["L/C", "LOAD"],
            ColumnRole::Fx => &["FX"],
            ColumnRole::Fy => &["FY"],
            ColumnRole::Fz => &["FZ"],
            ColumnRole::Name => &["NAME"],
        }
    }

    /// Label used in messages and reports
    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::Node => "Node",
            ColumnRole::LoadCase => "L/C",
            ColumnRole::Fx => "FX",
            ColumnRole::Fy => "FY",
            ColumnRole::Fz => "FZ",
            ColumnRole::Name => "Name",
        }
    }

    fn matches(&self, upper_label: &str) -> bool {
        self.patterns().iter().any(|p| upper_label.contains(p))
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify one header label into the first role (of `roles`) it matches.
pub fn classify(label: &str, roles: &[ColumnRole]) -> Option<ColumnRole> {
    let upper = label.to_uppercase();
    roles.iter().copied().find(|role| role.matches(&upper))
}

/// Bound source column index per role, in `roles` order.
///
/// Returns the bindings on success or the roles left unbound.
pub fn bind_columns(
    header: &[Cell],
    roles: &[ColumnRole],
) -> Result<Vec<(ColumnRole, usize)>, Vec<ColumnRole>> {
    let mut bound: Vec<Option<usize>> = vec![None; roles.len()];

    for (index, cell) in header.iter().enumerate() {
        let Some(role) = classify(&cell.display_text(), roles) else {
            continue;
        };
        if let Some(slot) = roles.iter().position(|r| *r == role) {
            // First match wins
            bound[slot].get_or_insert(index);
        }
    }

    let missing: Vec<ColumnRole> = roles
        .iter()
        .zip(&bound)
        .filter(|(_, b)| b.is_none())
        .map(|(r, _)| *r)
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    Ok(roles.iter().copied().zip(bound.into_iter().flatten()).collect())
}

fn missing_columns_error(table: &str, header: &[Cell], missing: &[ColumnRole]) -> ReactionError {
    ReactionError::MissingColumns {
        table: table.to_string(),
        missing: missing.iter().map(|r| r.label().to_string()).collect(),
        found: header
            .iter()
            .filter(|c| !c.is_blank())
            .map(Cell::display_text)
            .collect(),
    }
}

fn column_of(bindings: &[(ColumnRole, usize)], role: ColumnRole) -> ReactionResult<usize> {
    bindings
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, i)| *i)
        .ok_or_else(|| ReactionError::Internal {
            message: format!("column {} bound but not recorded", role),
        })
}

/// Source column indices of the reactions table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionColumns {
    pub node: usize,
    pub load_case: usize,
    pub fx: usize,
    pub fy: usize,
    pub fz: usize,
}

impl ReactionColumns {
    /// Resolve all five reaction columns from a header row.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reaction_core::columns::ReactionColumns;
    /// use reaction_core::grid::Cell;
    ///
    /// let header: Vec<Cell> = ["Node", "L/C", "Fx kN", "Fy kN", "Fz kN"]
    ///     .iter()
    ///     .map(|l| Cell::text(*l))
    ///     .collect();
    /// let cols = ReactionColumns::resolve(&header).unwrap();
    /// assert_eq!((cols.node, cols.fz), (0, 4));
    /// ```
    pub fn resolve(header: &[Cell]) -> ReactionResult<Self> {
        let bindings = bind_columns(header, &ColumnRole::REACTIONS)
            .map_err(|missing| missing_columns_error("Reactions", header, &missing))?;

        Ok(ReactionColumns {
            node: column_of(&bindings, ColumnRole::Node)?,
            load_case: column_of(&bindings, ColumnRole::LoadCase)?,
            fx: column_of(&bindings, ColumnRole::Fx)?,
            fy: column_of(&bindings, ColumnRole::Fy)?,
            fz: column_of(&bindings, ColumnRole::Fz)?,
        })
    }
}

/// Source column indices of the load-case table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadCaseColumns {
    pub load_case: usize,
    pub name: usize,
}

impl LoadCaseColumns {
    /// Resolve the L/C and Name columns from a header row
    pub fn resolve(header: &[Cell]) -> ReactionResult<Self> {
        let bindings = bind_columns(header, &ColumnRole::LOAD_CASES)
            .map_err(|missing| missing_columns_error("Load cases", header, &missing))?;

        Ok(LoadCaseColumns {
            load_case: column_of(&bindings, ColumnRole::LoadCase)?,
            name: column_of(&bindings, ColumnRole::Name)?,
        })
    }
}
