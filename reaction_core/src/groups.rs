//! # Support Group Definitions
//!
//! Parses the free-text support group definition typed by the user:
//!
//! ```text
//! P1: 1, 2, 3; P2: 4, 5
//! ```
//!
//! Entries are separated by `;`, the name ends at the first `:`, and node
//! numbers are comma-separated integers. Parsing is all-or-nothing: one bad
//! entry rejects the whole definition, since an analysis always runs
//! against the complete group set.
//!
//! The additional dead-load list (`"3, 4"`) is parsed leniently instead;
//! tokens that are not plain integers are ignored.

use serde::{Deserialize, Serialize};

use crate::errors::{ReactionError, ReactionResult};

/// A named set of nodes reported as one physical support.
///
/// Node order is kept as typed and duplicates are not removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportGroup {
    pub name: String,
    pub nodes: Vec<i64>,
}

impl SupportGroup {
    pub fn new(name: impl Into<String>, nodes: Vec<i64>) -> Self {
        SupportGroup {
            name: name.into(),
            nodes,
        }
    }
}

fn parse_entry(entry: &str) -> ReactionResult<SupportGroup> {
    let trimmed = entry.trim();
    let (name, node_list) = trimmed
        .split_once(':')
        .ok_or_else(|| ReactionError::group_parse(trimmed, "expected 'Name: node, node, ...'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ReactionError::group_parse(trimmed, "support name is empty"));
    }

    let nodes = node_list
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<i64>().map_err(|_| {
                let reason = format!("'{}' is not an integer node number", token);
                ReactionError::group_parse(trimmed, reason)
            })
        })
        .collect::<ReactionResult<Vec<i64>>>()?;

    Ok(SupportGroup::new(name, nodes))
}

/// Parse a complete support group definition.
///
/// Blank entries (e.g. after a trailing `;`) are skipped. Repeating a name
/// replaces the earlier node list but keeps the group where it first appeared.
///
/// # Example
///
/// ```rust
/// use reaction_core::groups::parse_support_groups;
///
/// let groups = parse_support_groups("P1:1,2,3; P2:4,5").unwrap();
/// assert_eq!(groups[0].name, "P1");
/// assert_eq!(groups[1].nodes, vec![4, 5]);
///
/// assert!(parse_support_groups("P1 1,2").is_err());
/// ```
pub fn parse_support_groups(definition: &str) -> ReactionResult<Vec<SupportGroup>> {
    let mut groups: Vec<SupportGroup> = Vec::new();

    for entry in definition.split(';') {
        if entry.trim().is_empty() {
            continue;
        }
        let group = parse_entry(entry)?;
        match groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => {
                log::warn!(
                    "Support '{}' defined more than once; using the last definition",
                    group.name
                );
                existing.nodes = group.nodes;
            }
            None => groups.push(group),
        }
    }

    Ok(groups)
}

/// Parse the comma-separated dead-load L/C list, dropping invalid tokens.
///
/// # Example
///
/// ```rust
/// use reaction_core::groups::parse_dead_load_cases;
///
/// assert_eq!(parse_dead_load_cases("3, 4, x, -5, 6.0"), vec![3, 4]);
/// ```
pub fn parse_dead_load_cases(text: &str) -> Vec<i64> {
    let mut cases = Vec::new();
    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let parsed = if token.bytes().all(|b| b.is_ascii_digit()) {
            token.parse::<i64>().ok()
        } else {
            None
        };
        match parsed {
            Some(load_case) => cases.push(load_case),
            None => log::debug!("Ignoring dead load token '{}'", token),
        }
    }
    cases
}
