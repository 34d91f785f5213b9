//! # Report Assembly
//!
//! Shapes an [`Analysis`] into flat, presentation-ready rows: one overall
//! row per axis, one row per load case, plus the metadata and diagnostics a
//! reader needs to trust the numbers. Front ends render this structure as
//! text, tables or JSON without touching the aggregation types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{AxisSet, NodeMax, SupportAnalysis};
use crate::errors::ReactionResult;
use crate::extract::Axis;
use crate::pipeline::{Analysis, Diagnostics};

/// Where the analyzed data came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Workbook path or upload name
    pub source: String,
    pub sheet: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
}

impl ReportMetadata {
    /// Metadata stamped with the current time
    pub fn new(source: impl Into<String>, sheet: Option<String>) -> Self {
        ReportMetadata {
            source: source.into(),
            sheet,
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Overall maximum of one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallRow {
    pub axis: Axis,
    pub value: Option<f64>,
    pub load_case: Option<i64>,
    pub load_case_name: Option<String>,
}

/// Maximum magnitudes within one load case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCaseRow {
    pub load_case: i64,
    pub load_case_name: String,
    #[serde(rename = "FX")]
    pub fx: Option<f64>,
    #[serde(rename = "FY")]
    pub fy: Option<f64>,
    #[serde(rename = "FZ")]
    pub fz: Option<f64>,
}

/// Everything reported for one support group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportReport {
    pub name: String,
    pub nodes: Vec<i64>,
    /// FX, FY, FZ in that order
    pub overall_max: Vec<OverallRow>,
    pub dead_load_sum: Option<AxisSet<Option<f64>>>,
    pub per_load_case_max: Vec<LoadCaseRow>,
    pub node_max: Vec<NodeMax>,
    pub warnings: Vec<String>,
}

impl SupportReport {
    fn from_analysis(analysis: &SupportAnalysis) -> Self {
        let result = &analysis.result;

        let overall_max = result
            .overall_max
            .iter()
            .map(|(axis, entry)| OverallRow {
                axis,
                value: entry.value,
                load_case: entry.load_case,
                load_case_name: entry.load_case_name.clone(),
            })
            .collect();

        let per_load_case_max = result
            .per_load_case_max
            .iter()
            .map(|(load_case, max)| LoadCaseRow {
                load_case: *load_case,
                load_case_name: max.load_case_name.clone(),
                fx: max.fx,
                fy: max.fy,
                fz: max.fz,
            })
            .collect();

        SupportReport {
            name: analysis.group.name.clone(),
            nodes: analysis.group.nodes.clone(),
            overall_max,
            dead_load_sum: result.dead_load_sum.clone(),
            per_load_case_max,
            node_max: result.node_max.clone(),
            warnings: analysis.warnings.clone(),
        }
    }
}

/// Presentation-ready result of one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub diagnostics: Diagnostics,
    pub dead_load_cases: Vec<i64>,
    pub supports: Vec<SupportReport>,
}

impl AnalysisReport {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> ReactionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Assemble the report for an analysis, groups in definition order.
pub fn assemble(analysis: &Analysis, metadata: ReportMetadata) -> AnalysisReport {
    AnalysisReport {
        metadata,
        diagnostics: analysis.diagnostics.clone(),
        dead_load_cases: analysis.dead_load_cases.clone(),
        supports: analysis.supports.iter().map(SupportReport::from_analysis).collect(),
    }
}

impl Analysis {
    /// Hand the analysis to the report assembler
    pub fn into_report(self, metadata: ReportMetadata) -> AnalysisReport {
        assemble(&self, metadata)
    }
}

/// Format an optional force for tables; absent values print as `-`.
pub fn format_force(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{LoadCaseInfo, ReactionRecord};
    use crate::pipeline::Extraction;
    use crate::settings::AnalysisSettings;

    fn record(node: i64, load_case: i64, fx: f64, fy: f64) -> ReactionRecord {
        ReactionRecord {
            node,
            load_case,
            fx: Some(fx),
            fy: Some(fy),
            fz: None,
        }
    }

    fn sample_analysis(dead_load: &str) -> Analysis {
        let mut load_cases = LoadCaseInfo::new();
        load_cases.insert(1, "DEAD");
        let extraction = Extraction {
            records: vec![
                record(1, 2, 4.0, -50.0),
                record(1, 1, -6.0, 20.0),
                record(2, 1, 1.0, 30.0),
            ],
            load_cases,
            diagnostics: Diagnostics::default(),
        };
        extraction
            .analyze("A: 1, 2; B: 2", dead_load, &AnalysisSettings::default())
            .unwrap()
    }

    #[test]
    fn test_assemble_rows() {
        let metadata = ReportMetadata::new("run.xlsx", Some("Reactions".to_string()));
        let report = sample_analysis("1").into_report(metadata);

        assert_eq!(report.supports.len(), 2);
        let a = &report.supports[0];
        assert_eq!(a.name, "A");
        assert_eq!(a.nodes, vec![1, 2]);

        let axes: Vec<Axis> = a.overall_max.iter().map(|r| r.axis).collect();
        assert_eq!(axes, vec![Axis::Fx, Axis::Fy, Axis::Fz]);
        assert_eq!(a.overall_max[0].value, Some(-6.0));
        assert_eq!(a.overall_max[0].load_case_name.as_deref(), Some("DEAD"));
        assert_eq!(a.overall_max[1].value, Some(-50.0));
        assert_eq!(a.overall_max[2].value, None);

        let cases: Vec<i64> = a.per_load_case_max.iter().map(|r| r.load_case).collect();
        assert_eq!(cases, vec![1, 2]);
        assert_eq!(a.per_load_case_max[0].fy, Some(30.0));
        assert_eq!(a.per_load_case_max[1].load_case_name, "LC 2");

        let sums = a.dead_load_sum.as_ref().unwrap();
        assert_eq!(sums.fx, Some(6.0));
        assert_eq!(sums.fy, Some(30.0));
        assert_eq!(sums.fz, None);
        assert_eq!(report.dead_load_cases, vec![1]);
    }

    #[test]
    fn test_no_dead_load_section_without_list() {
        let report = sample_analysis("").into_report(ReportMetadata::new("run.xlsx", None));
        assert!(report.supports.iter().all(|s| s.dead_load_sum.is_none()));
    }

    #[test]
    fn test_report_json() {
        let report = sample_analysis("1, 2").into_report(ReportMetadata::new("run.xlsx", None));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"overall_max\""));
        assert!(json.contains("\"FX\""));

        let roundtrip: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.supports, report.supports);
    }

    #[test]
    fn test_format_force() {
        assert_eq!(format_force(Some(-12.3456), 2), "-12.35");
        assert_eq!(format_force(None, 2), "-");
    }
}
