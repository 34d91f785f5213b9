//! # Analysis Pipeline
//!
//! Runs grid → header location → column mapping → record extraction →
//! aggregation for one request. Takes already-loaded grid data and the
//! user's text inputs as plain arguments and keeps no state between calls.
//!
//! ## Error policy
//!
//! | Failure                                   | Outcome                           |
//! |-------------------------------------------|-----------------------------------|
//! | Reactions header not found                | `HeaderNotFound`, fatal           |
//! | Reaction columns unresolved               | `MissingColumns`, fatal           |
//! | Load-case header/columns not found        | warning, `"LC {n}"` labels        |
//! | Support group definition invalid          | `GroupParse`, no group analyzed   |
//! | Dead-load token invalid                   | token ignored                     |
//! | Non-finite value or dead-load overflow    | null entry plus group warning     |
//!
//! ## Example
//!
//! ```rust
//! use reaction_core::grid::{Cell, RawGrid};
//! use reaction_core::pipeline::analyze_grid;
//! use reaction_core::settings::AnalysisSettings;
//!
//! let t = |s: &str| Cell::text(s);
//! let n = Cell::Number;
//! let grid = RawGrid::new(vec![
//!     vec![t("Node"), t("L/C"), t("Fx kN"), t("Fy kN"), t("Fz kN")],
//!     vec![Cell::Empty, Cell::Empty, t("kN"), t("kN"), t("kN")],
//!     vec![n(1.0), n(1.0), n(-10.0), n(20.0), n(0.5)],
//!     vec![Cell::Empty, n(2.0), n(5.0), n(-30.0), n(0.1)],
//! ]);
//!
//! let analysis = analyze_grid(&grid, "P1: 1", "", &AnalysisSettings::default()).unwrap();
//! let fy = &analysis.supports[0].result.overall_max.fy;
//! assert_eq!(fy.value, Some(-30.0));
//! assert_eq!(fy.load_case_name.as_deref(), Some("LC 2"));
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregator, SupportAnalysis};
use crate::columns::{LoadCaseColumns, ReactionColumns};
use crate::errors::{ReactionError, ReactionResult};
use crate::extract::{extract_load_cases, extract_reactions, LoadCaseInfo, ReactionRecord};
use crate::grid::RawGrid;
use crate::groups::{parse_dead_load_cases, parse_support_groups, SupportGroup};
use crate::header::{locate_table, KeywordMatch};
use crate::settings::AnalysisSettings;

/// Where a table was found, in spreadsheet terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLocation {
    /// 1-based sheet row of the header
    pub sheet_row: usize,
    pub matched: KeywordMatch,
}

/// What the extraction stage found, for display alongside results
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub reactions_table: Option<TableLocation>,
    pub load_case_table: Option<TableLocation>,
    pub record_count: usize,
    pub load_case_count: usize,
    /// Non-fatal problems, in the order they occurred
    pub warnings: Vec<String>,
}

/// Typed records extracted from one grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub records: Vec<ReactionRecord>,
    pub load_cases: LoadCaseInfo,
    pub diagnostics: Diagnostics,
}

/// Complete output of one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub diagnostics: Diagnostics,
    pub load_cases: LoadCaseInfo,
    pub groups: Vec<SupportGroup>,
    pub dead_load_cases: Vec<i64>,
    pub supports: Vec<SupportAnalysis>,
}

fn load_case_names(
    grid: &RawGrid,
    settings: &AnalysisSettings,
    diagnostics: &mut Diagnostics,
) -> LoadCaseInfo {
    let layout = &settings.load_cases;
    let Some(location) = locate_table(grid, layout) else {
        let warning = "Load case table not found; using default load case names".to_string();
        log::warn!("{}", warning);
        diagnostics.warnings.push(warning);
        return LoadCaseInfo::new();
    };

    diagnostics.load_case_table = Some(TableLocation {
        sheet_row: grid.sheet_row(location.row),
        matched: location.matched,
    });
    log::info!("Load case table found in row {}", grid.sheet_row(location.row));

    let header = grid.row(location.row).unwrap_or_default();
    match LoadCaseColumns::resolve(header) {
        Ok(columns) => extract_load_cases(grid, location.row, &columns, layout.spacer_rows),
        Err(e) => {
            let warning = format!("{}; using default load case names", e);
            log::warn!("{}", warning);
            diagnostics.warnings.push(warning);
            LoadCaseInfo::new()
        }
    }
}

/// Locate both tables and extract their records.
///
/// # Returns
///
/// * `Ok(Extraction)` - Reaction records and load-case names
/// * `Err(ReactionError::HeaderNotFound)` - No reactions header row
/// * `Err(ReactionError::MissingColumns)` - Reactions header lacks required columns
/// * `Err(ReactionError::InvalidData)` - A reaction row has no usable node number
pub fn extract(grid: &RawGrid, settings: &AnalysisSettings) -> ReactionResult<Extraction> {
    settings.validate()?;

    let layout = &settings.reactions;
    let location = locate_table(grid, layout)
        .ok_or_else(|| ReactionError::header_not_found("Reactions", &layout.primary_keywords))?;

    if location.matched == KeywordMatch::Fallback {
        log::warn!(
            "Reactions header matched only the fallback keywords {:?}",
            layout.fallback_keywords
        );
    }
    log::info!("Reactions table found in row {}", grid.sheet_row(location.row));

    let header = grid.row(location.row).unwrap_or_default();
    let columns = ReactionColumns::resolve(header)?;
    let records = extract_reactions(grid, location.row, &columns, layout.spacer_rows)?;

    let mut diagnostics = Diagnostics {
        reactions_table: Some(TableLocation {
            sheet_row: grid.sheet_row(location.row),
            matched: location.matched,
        }),
        record_count: records.len(),
        ..Diagnostics::default()
    };

    let load_cases = load_case_names(grid, settings, &mut diagnostics);
    diagnostics.load_case_count = load_cases.len();

    Ok(Extraction {
        records,
        load_cases,
        diagnostics,
    })
}

impl Extraction {
    /// Aggregate the extracted records for a group definition.
    ///
    /// The group definition is parsed as a whole before anything is
    /// aggregated; an invalid or empty definition analyzes nothing.
    pub fn analyze(
        &self,
        group_definition: &str,
        dead_load_text: &str,
        settings: &AnalysisSettings,
    ) -> ReactionResult<Analysis> {
        let groups = parse_support_groups(group_definition)?;
        if groups.is_empty() {
            return Err(ReactionError::NoSupportGroups);
        }
        let dead_load_cases = parse_dead_load_cases(dead_load_text);

        log::info!(
            "Analyzing {} support groups over {} reaction records",
            groups.len(),
            self.records.len()
        );

        let supports = Aggregator::new(&self.records, &self.load_cases)
            .with_label_prefix(settings.load_case_label_prefix.clone())
            .analyze(&groups, &dead_load_cases);

        Ok(Analysis {
            diagnostics: self.diagnostics.clone(),
            load_cases: self.load_cases.clone(),
            groups,
            dead_load_cases,
            supports,
        })
    }
}

/// Extract and analyze in one call.
pub fn analyze_grid(
    grid: &RawGrid,
    group_definition: &str,
    dead_load_text: &str,
    settings: &AnalysisSettings,
) -> ReactionResult<Analysis> {
    extract(grid, settings)?.analyze(group_definition, dead_load_text, settings)
}
