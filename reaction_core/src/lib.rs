//! # reaction_core - Support Reaction Analysis Engine
//!
//! `reaction_core` reads the support reaction table of a structural analysis
//! export, normalizes it into typed records, and reports the governing
//! reactions of user-defined support groups. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **Schema-tolerant**: Tables are found by header keywords, not fixed positions
//! - **Rich Errors**: Structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use reaction_core::{analyze_grid, read_sheet, AnalysisSettings, ReportMetadata};
//!
//! let path = Path::new("reactions.xlsx");
//! let sheet = read_sheet(path, None)?;
//! let settings = AnalysisSettings::default();
//! let analysis = analyze_grid(&sheet.grid, "P1: 1, 2, 3; P2: 4, 5", "3, 4", &settings)?;
//!
//! let report = analysis.into_report(ReportMetadata::new("reactions.xlsx", Some(sheet.sheet)));
//! println!("{}", report.to_json()?);
//! # Ok::<(), reaction_core::ReactionError>(())
//! ```
//!
//! ## Modules
//!
//! - [`grid`] - Worksheet loading into an unheadered cell grid
//! - [`header`] - Keyword-based header row location
//! - [`columns`] - Header label to semantic column binding
//! - [`extract`] - Reaction records and load-case names
//! - [`groups`] - Support group and dead-load list parsing
//! - [`aggregate`] - Per-group maxima and dead-load sums
//! - [`report`] - Presentation-ready report structure
//! - [`pipeline`] - End-to-end analysis entry point
//! - [`settings`] - Keyword sets and table layout configuration
//! - [`errors`] - Structured error types

pub mod aggregate;
pub mod columns;
pub mod errors;
pub mod extract;
pub mod grid;
pub mod groups;
pub mod header;
pub mod pipeline;
pub mod report;
pub mod settings;

// Re-export commonly used types at crate root for convenience
pub use aggregate::{Aggregator, AxisSet, MaxEntry, PerLoadCaseMax, SupportAnalysis, SupportResult};
pub use errors::{ReactionError, ReactionResult};
pub use extract::{Axis, LoadCaseInfo, ReactionRecord};
pub use grid::{list_sheets, read_sheet, Cell, RawGrid, SheetGrid};
pub use groups::{parse_dead_load_cases, parse_support_groups, SupportGroup};
pub use pipeline::{analyze_grid, extract, Analysis, Diagnostics, Extraction};
pub use report::{AnalysisReport, ReportMetadata};
pub use settings::AnalysisSettings;
