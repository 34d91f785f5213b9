//! # Reaction Aggregation
//!
//! Computes, for each support group:
//!
//! - the per-node maximum-magnitude reaction per axis, with its load case
//! - the group's overall maximum per axis (signed, attributed)
//! - the maximum magnitude per axis within each load case
//! - optionally, the sum over chosen dead-load L/Cs of those per-load-case maxima
//!
//! ## Tie-breaking
//!
//! Equal magnitudes never displace an earlier candidate. Within one node the
//! first record in sheet order wins; across nodes the first node in the
//! group's node list wins.
//!
//! ## Failure isolation
//!
//! A non-finite force value degrades the node/axis or load-case/axis entry
//! it appears in to null. A dead-load sum that overflows degrades only that
//! axis of the sum. The rest of the group and every other group are still
//! computed, and each degraded entry is reported in
//! [`SupportAnalysis::warnings`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::{ReactionError, ReactionResult};
use crate::extract::{Axis, LoadCaseInfo, ReactionRecord};
use crate::groups::SupportGroup;

/// One value per force axis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSet<T> {
    #[serde(rename = "FX")]
    pub fx: T,
    #[serde(rename = "FY")]
    pub fy: T,
    #[serde(rename = "FZ")]
    pub fz: T,
}

impl<T> AxisSet<T> {
    /// Build by evaluating `f` for FX, FY, FZ in order
    pub fn from_fn(mut f: impl FnMut(Axis) -> T) -> Self {
        AxisSet {
            fx: f(Axis::Fx),
            fy: f(Axis::Fy),
            fz: f(Axis::Fz),
        }
    }

    pub fn get(&self, axis: Axis) -> &T {
        match axis {
            Axis::Fx => &self.fx,
            Axis::Fy => &self.fy,
            Axis::Fz => &self.fz,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Fx => &mut self.fx,
            Axis::Fy => &mut self.fy,
            Axis::Fz => &mut self.fz,
        }
    }

    /// Iterate (axis, value) in FX, FY, FZ order
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &T)> {
        Axis::ALL.into_iter().map(move |axis| (axis, self.get(axis)))
    }
}

/// An extreme reaction value with the load case it came from.
///
/// All fields are `None` together when there was no data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaxEntry {
    /// Signed force value
    pub value: Option<f64>,
    pub load_case: Option<i64>,
    pub load_case_name: Option<String>,
}

impl MaxEntry {
    /// The "no data" entry
    pub fn empty() -> Self {
        MaxEntry::default()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Absolute value, if any
    pub fn magnitude(&self) -> Option<f64> {
        self.value.map(f64::abs)
    }
}

/// Maximum magnitudes of one load case across a group's nodes (sign dropped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerLoadCaseMax {
    pub load_case_name: String,
    #[serde(rename = "FX")]
    pub fx: Option<f64>,
    #[serde(rename = "FY")]
    pub fy: Option<f64>,
    #[serde(rename = "FZ")]
    pub fz: Option<f64>,
}

impl PerLoadCaseMax {
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Fx => self.fx,
            Axis::Fy => self.fy,
            Axis::Fz => self.fz,
        }
    }
}

/// Per-axis maxima of one node of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMax {
    pub node: i64,
    pub max: AxisSet<MaxEntry>,
}

/// Aggregated reactions of one support group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SupportResult {
    /// One entry per position of the group's node list
    pub node_max: Vec<NodeMax>,

    /// Largest-magnitude signed value per axis across all nodes
    pub overall_max: AxisSet<MaxEntry>,

    /// Per load case, ascending by load case number
    pub per_load_case_max: BTreeMap<i64, PerLoadCaseMax>,

    /// Present only when a dead-load L/C list was supplied
    pub dead_load_sum: Option<AxisSet<Option<f64>>>,
}

impl SupportResult {
    /// True when the group produced no data at all
    pub fn is_empty(&self) -> bool {
        self.node_max.is_empty()
            && self.per_load_case_max.is_empty()
            && self.dead_load_sum.is_none()
    }
}

/// Result for one support group together with what went wrong computing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportAnalysis {
    pub group: SupportGroup,
    pub result: SupportResult,
    pub warnings: Vec<String>,
}

fn check_finite(value: f64, calculation: impl FnOnce() -> String) -> ReactionResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ReactionError::calculation_failed(
            calculation(),
            format!("non-finite value {}", value),
        ))
    }
}

/// Largest magnitude among present values; `None` if all are absent.
fn max_magnitude(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.map(f64::abs).fold(None, |best, v| match best {
        Some(b) if b >= v => Some(b),
        _ => Some(v),
    })
}

/// Aggregates reaction records for support groups.
///
/// Holds only borrowed, immutable inputs; every method is a pure function
/// of them, so repeated runs give identical results.
///
/// # Example
///
/// ```rust
/// use reaction_core::aggregate::Aggregator;
/// use reaction_core::extract::{Axis, LoadCaseInfo, ReactionRecord};
/// use reaction_core::groups::SupportGroup;
///
/// let records = vec![
///     ReactionRecord { node: 1, load_case: 1, fx: Some(-10.0), fy: None, fz: None },
///     ReactionRecord { node: 1, load_case: 2, fx: Some(5.0), fy: None, fz: None },
///     ReactionRecord { node: 2, load_case: 1, fx: Some(3.0), fy: None, fz: None },
/// ];
/// let load_cases = LoadCaseInfo::new();
/// let aggregator = Aggregator::new(&records, &load_cases);
///
/// let analysis = aggregator.analyze_group(&SupportGroup::new("P1", vec![1, 2]), &[]);
/// let fx = analysis.result.overall_max.get(Axis::Fx);
/// assert_eq!(fx.value, Some(-10.0));
/// assert_eq!(fx.load_case_name.as_deref(), Some("LC 1"));
/// ```
pub struct Aggregator<'a> {
    records: &'a [ReactionRecord],
    load_cases: &'a LoadCaseInfo,
    label_prefix: String,
}

impl<'a> Aggregator<'a> {
    pub fn new(records: &'a [ReactionRecord], load_cases: &'a LoadCaseInfo) -> Self {
        Aggregator {
            records,
            load_cases,
            label_prefix: "LC ".to_string(),
        }
    }

    /// Set the prefix of synthesized load-case labels (builder pattern)
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    fn label(&self, load_case: i64) -> String {
        self.load_cases.label(load_case, &self.label_prefix)
    }

    /// Records of one node, in record order
    pub fn node_records(&self, node: i64) -> Vec<&'a ReactionRecord> {
        self.records.iter().filter(|r| r.node == node).collect()
    }

    /// Record with the largest |force| along `axis`, first occurrence on ties.
    ///
    /// # Returns
    ///
    /// * `Ok(MaxEntry)` - Attributed maximum, or the empty entry if no record has a value
    /// * `Err(ReactionError::CalculationFailed)` - A value is not finite
    pub fn axis_max(&self, records: &[&ReactionRecord], axis: Axis) -> ReactionResult<MaxEntry> {
        let mut best: Option<(f64, &ReactionRecord)> = None;

        for &record in records {
            let Some(value) = record.force(axis) else {
                continue;
            };
            check_finite(value, || {
                format!("{} max at node {} L/C {}", axis, record.node, record.load_case)
            })?;
            if best.map_or(true, |(b, _)| value.abs() > b.abs()) {
                best = Some((value, record));
            }
        }

        Ok(match best {
            Some((value, record)) => MaxEntry {
                value: Some(value),
                load_case: Some(record.load_case),
                load_case_name: Some(self.label(record.load_case)),
            },
            None => MaxEntry::empty(),
        })
    }

    /// Records of any of the given nodes, in record order
    pub fn group_records(&self, nodes: &[i64]) -> Vec<&'a ReactionRecord> {
        let members: HashSet<i64> = nodes.iter().copied().collect();
        self.records.iter().filter(|r| members.contains(&r.node)).collect()
    }

    /// Largest |force| along `axis` among records of one load case.
    pub fn load_case_axis_max(
        &self,
        records: &[&ReactionRecord],
        axis: Axis,
    ) -> ReactionResult<Option<f64>> {
        let mut values = Vec::with_capacity(records.len());
        for record in records {
            if let Some(value) = record.force(axis) {
                values.push(check_finite(value, || {
                    format!("{} max at node {} L/C {}", axis, record.node, record.load_case)
                })?);
            }
        }
        Ok(max_magnitude(values.into_iter()))
    }

    /// Per-load-case maxima over the records of the given nodes.
    ///
    /// An axis that cannot be computed for a load case is reported as `None`
    /// and described in `warnings`.
    pub fn per_load_case_max(
        &self,
        nodes: &[i64],
        warnings: &mut Vec<String>,
    ) -> BTreeMap<i64, PerLoadCaseMax> {
        let mut partitions: BTreeMap<i64, Vec<&ReactionRecord>> = BTreeMap::new();
        for record in self.group_records(nodes) {
            partitions.entry(record.load_case).or_default().push(record);
        }

        partitions
            .into_iter()
            .map(|(load_case, records)| {
                let maxima = AxisSet::from_fn(|axis| {
                    self.load_case_axis_max(&records, axis).unwrap_or_else(|e| {
                        log::warn!("L/C {}: {}", load_case, e);
                        warnings.push(e.to_string());
                        None
                    })
                });
                let entry = PerLoadCaseMax {
                    load_case_name: self.label(load_case),
                    fx: maxima.fx,
                    fy: maxima.fy,
                    fz: maxima.fz,
                };
                (load_case, entry)
            })
            .collect()
    }

    /// Sum of per-load-case maxima over the dead-load L/Cs, `None` per axis when zero.
    ///
    /// Load cases with no data for the group contribute 0. A load case listed
    /// twice is counted twice. An axis whose sum overflows is `None` and
    /// described in `warnings`.
    pub fn dead_load_sum(
        &self,
        per_load_case: &BTreeMap<i64, PerLoadCaseMax>,
        dead_load_cases: &[i64],
        warnings: &mut Vec<String>,
    ) -> AxisSet<Option<f64>> {
        AxisSet::from_fn(|axis| {
            let total: f64 = dead_load_cases
                .iter()
                .filter_map(|lc| per_load_case.get(lc))
                .filter_map(|max| max.get(axis))
                .sum();
            match check_finite(total, || format!("{} dead load sum", axis)) {
                Ok(total) if total != 0.0 => Some(total),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("{}", e);
                    warnings.push(e.to_string());
                    None
                }
            }
        })
    }

    fn compute(
        &self,
        group: &SupportGroup,
        dead_load_cases: &[i64],
        warnings: &mut Vec<String>,
    ) -> SupportResult {
        let mut node_max = Vec::with_capacity(group.nodes.len());
        let mut overall: AxisSet<MaxEntry> = AxisSet::default();

        for &node in &group.nodes {
            let records = self.node_records(node);
            if records.is_empty() {
                log::debug!("Support '{}': node {} has no reactions", group.name, node);
            }

            let max = AxisSet::from_fn(|axis| {
                self.axis_max(&records, axis).unwrap_or_else(|e| {
                    log::warn!("Support '{}': node {}: {}", group.name, node, e);
                    warnings.push(e.to_string());
                    MaxEntry::empty()
                })
            });

            for (axis, entry) in max.iter() {
                let Some(magnitude) = entry.magnitude() else {
                    continue;
                };
                let current = overall.get_mut(axis);
                // Strict comparison keeps the first of equal magnitudes
                if current.magnitude().map_or(true, |m| magnitude > m) {
                    *current = entry.clone();
                }
            }

            node_max.push(NodeMax { node, max });
        }

        let per_load_case_max = self.per_load_case_max(&group.nodes, warnings);
        let dead_load_sum = if dead_load_cases.is_empty() {
            None
        } else {
            Some(self.dead_load_sum(&per_load_case_max, dead_load_cases, warnings))
        };

        SupportResult {
            node_max,
            overall_max: overall,
            per_load_case_max,
            dead_load_sum,
        }
    }

    /// Aggregate one support group. Never fails; see the module docs.
    pub fn analyze_group(&self, group: &SupportGroup, dead_load_cases: &[i64]) -> SupportAnalysis {
        let mut warnings = Vec::new();
        let result = self.compute(group, dead_load_cases, &mut warnings);

        SupportAnalysis {
            group: group.clone(),
            result,
            warnings,
        }
    }

    /// Aggregate every group, in the order given
    pub fn analyze(
        &self,
        groups: &[SupportGroup],
        dead_load_cases: &[i64],
    ) -> Vec<SupportAnalysis> {
        groups
            .iter()
            .map(|group| self.analyze_group(group, dead_load_cases))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(
        node: i64,
        load_case: i64,
        fx: Option<f64>,
        fy: Option<f64>,
        fz: Option<f64>,
    ) -> ReactionRecord {
        ReactionRecord {
            node,
            load_case,
            fx,
            fy,
            fz,
        }
    }

    fn fx_only(node: i64, load_case: i64, fx: f64) -> ReactionRecord {
        rec(node, load_case, Some(fx), None, None)
    }

    #[test]
    fn test_overall_max_keeps_sign_and_load_case() {
        let records = vec![fx_only(1, 1, -10.0), fx_only(1, 2, 5.0), fx_only(2, 1, 3.0)];
        let mut names = LoadCaseInfo::new();
        names.insert(1, "DEAD");
        let aggregator = Aggregator::new(&records, &names);

        let analysis = aggregator.analyze_group(&SupportGroup::new("P1", vec![1, 2]), &[]);
        let fx = analysis.result.overall_max.get(Axis::Fx);
        assert_eq!(fx.value, Some(-10.0));
        assert_eq!(fx.load_case, Some(1));
        assert_eq!(fx.load_case_name.as_deref(), Some("DEAD"));
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_node_tie_first_record_wins() {
        let records = vec![fx_only(1, 1, 5.0), fx_only(1, 2, -5.0)];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let node = aggregator.node_records(1);
        let entry = aggregator.axis_max(&node, Axis::Fx).unwrap();
        assert_eq!(entry.value, Some(5.0));
        assert_eq!(entry.load_case, Some(1));
    }

    #[test]
    fn test_group_tie_first_node_wins() {
        let records = vec![fx_only(2, 7, -8.0), fx_only(1, 3, 8.0)];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let analysis = aggregator.analyze_group(&SupportGroup::new("P", vec![1, 2]), &[]);
        let fx = analysis.result.overall_max.get(Axis::Fx);
        assert_eq!(fx.value, Some(8.0));
        assert_eq!(fx.load_case, Some(3));

        let analysis = aggregator.analyze_group(&SupportGroup::new("P", vec![2, 1]), &[]);
        assert_eq!(analysis.result.overall_max.get(Axis::Fx).value, Some(-8.0));
    }

    #[test]
    fn test_missing_axis_is_empty_entry() {
        let records = vec![rec(1, 1, Some(1.0), None, Some(2.0))];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1, 99]), &[]).result;
        assert_eq!(result.overall_max.fy, MaxEntry::empty());
        assert_eq!(result.node_max.len(), 2);
        assert_eq!(result.node_max[1].node, 99);
        assert!(result.node_max[1].max.fx.is_empty());
    }

    #[test]
    fn test_per_load_case_drops_sign() {
        let records = vec![fx_only(1, 1, -10.0), fx_only(2, 1, 7.0), fx_only(3, 1, 50.0)];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1, 2]), &[]).result;
        let lc1 = &result.per_load_case_max[&1];
        assert_eq!(lc1.fx, Some(10.0));
        assert_eq!(lc1.fy, None);
        assert_eq!(lc1.load_case_name, "LC 1");
    }

    #[test]
    fn test_per_load_case_sorted_and_deduplicated_nodes() {
        let records = vec![fx_only(1, 5, 1.0), fx_only(1, 2, 2.0), fx_only(1, 9, -3.0)];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1, 1]), &[]).result;
        let keys: Vec<i64> = result.per_load_case_max.keys().copied().collect();
        assert_eq!(keys, vec![2, 5, 9]);
        assert_eq!(result.per_load_case_max[&9].fx, Some(3.0));
        // Duplicated node appears twice in the node breakdown
        assert_eq!(result.node_max.len(), 2);
    }

    #[test]
    fn test_dead_load_sum() {
        let records = vec![fx_only(1, 3, -2.0), fx_only(1, 5, 100.0)];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1]), &[3, 4]).result;
        let sums = result.dead_load_sum.unwrap();
        assert_eq!(sums.fx, Some(2.0));
        assert_eq!(sums.fy, None);

        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1]), &[4, 6]).result;
        assert_eq!(result.dead_load_sum.unwrap(), AxisSet::default());

        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1]), &[]).result;
        assert!(result.dead_load_sum.is_none());
    }

    #[test]
    fn test_dead_load_repeated_case_counts_twice() {
        let records = vec![fx_only(1, 3, 2.5)];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);
        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1]), &[3, 3]).result;
        assert_eq!(result.dead_load_sum.unwrap().fx, Some(5.0));
    }

    #[test]
    fn test_non_finite_value_degrades_to_empty() {
        let records = vec![
            rec(1, 1, Some(f64::NAN), Some(4.0), None),
            rec(2, 1, Some(3.0), Some(1.0), None),
        ];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let analysis = aggregator.analyze_group(&SupportGroup::new("P", vec![1, 2]), &[]);
        let node1 = &analysis.result.node_max[0];
        assert!(node1.max.fx.is_empty());
        assert_eq!(node1.max.fy.value, Some(4.0));
        assert_eq!(analysis.result.overall_max.fx.value, Some(3.0));

        let lc1 = &analysis.result.per_load_case_max[&1];
        assert_eq!(lc1.fx, None);
        assert_eq!(lc1.fy, Some(4.0));
        assert_eq!(analysis.warnings.len(), 2);
    }

    #[test]
    fn test_dead_load_overflow_degrades_only_that_axis() {
        let records = vec![
            rec(1, 1, Some(f64::MAX), Some(10.0), None),
            rec(1, 2, Some(f64::MAX), Some(-4.0), None),
            rec(2, 1, Some(3.0), None, None),
        ];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names);

        let results = aggregator.analyze(
            &[SupportGroup::new("Big", vec![1]), SupportGroup::new("Small", vec![2])],
            &[1, 2],
        );
        let big = &results[0];
        let sums = big.result.dead_load_sum.as_ref().unwrap();
        assert_eq!(sums.fx, None);
        assert_eq!(sums.fy, Some(14.0));
        assert_eq!(big.result.overall_max.fx.value, Some(f64::MAX));
        assert_eq!(big.result.overall_max.fy.value, Some(10.0));
        assert_eq!(big.result.per_load_case_max.len(), 2);
        assert!(!big.result.is_empty());
        assert_eq!(big.warnings.len(), 1);
        assert!(big.warnings[0].contains("FX dead load sum"));

        assert_eq!(results[1].result.overall_max.fx.value, Some(3.0));
        assert_eq!(results[1].result.dead_load_sum.as_ref().unwrap().fx, Some(3.0));
        assert!(results[1].warnings.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            rec(1, 1, Some(-1.5), Some(2.0), Some(0.0)),
            rec(1, 2, Some(1.5), Some(-2.0), Some(0.1)),
            rec(2, 1, Some(0.3), None, Some(-7.0)),
        ];
        let mut names = LoadCaseInfo::new();
        names.insert(2, "LIVE");
        let groups = vec![SupportGroup::new("A", vec![1, 2]), SupportGroup::new("B", vec![2])];
        let aggregator = Aggregator::new(&records, &names);

        let first = serde_json::to_string(&aggregator.analyze(&groups, &[1, 2])).unwrap();
        let second = serde_json::to_string(&aggregator.analyze(&groups, &[1, 2])).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_label_prefix() {
        let records = vec![fx_only(1, 4, 1.0)];
        let names = LoadCaseInfo::new();
        let aggregator = Aggregator::new(&records, &names).with_label_prefix("Case ");
        let result = aggregator.analyze_group(&SupportGroup::new("P", vec![1]), &[]).result;
        assert_eq!(result.overall_max.fx.load_case_name.as_deref(), Some("Case 4"));
        assert_eq!(result.per_load_case_max[&4].load_case_name, "Case 4");
    }

    #[test]
    fn test_serialized_axis_keys() {
        let set = AxisSet {
            fx: Some(1.0),
            fy: None,
            fz: Some(2.0),
        };
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"FX":1.0,"FY":null,"FZ":2.0}"#);
    }
}
