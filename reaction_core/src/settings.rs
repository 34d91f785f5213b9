//! # Analysis Settings
//!
//! Keyword sets and layout knobs for locating the two tables in an export.
//! The defaults describe the usual reactions export (a units row under the
//! reactions header, load-case rows directly under theirs). Exports from
//! other tools can be handled by loading a JSON settings file instead.
//!
//! ## JSON Format
//!
//! Every field is optional; missing fields take their default.
//!
//! ```json
//! {
//!   "reactions": {
//!     "primary_keywords": ["NODE", "L/C", "FX", "FY", "FZ"],
//!     "fallback_keywords": ["NODE", "FX"],
//!     "spacer_rows": 1
//!   },
//!   "load_cases": {
//!     "primary_keywords": ["L/C", "TYPE", "NAME"],
//!     "fallback_keywords": ["L/C", "NAME"],
//!     "spacer_rows": 0
//!   },
//!   "load_case_label_prefix": "LC "
//! }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ReactionError, ReactionResult};

/// How to find one table and where its data rows begin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    /// Keywords that must all appear (as substrings) somewhere in the header row
    pub primary_keywords: Vec<String>,

    /// Looser keyword set tried when no row matches the primary set
    pub fallback_keywords: Vec<String>,

    /// Rows directly under the header that are skipped unconditionally (units rows)
    pub spacer_rows: usize,
}

impl TableLayout {
    fn from_keywords(primary: &[&str], fallback: &[&str], spacer_rows: usize) -> Self {
        TableLayout {
            primary_keywords: primary.iter().map(|k| k.to_string()).collect(),
            fallback_keywords: fallback.iter().map(|k| k.to_string()).collect(),
            spacer_rows,
        }
    }

    /// Layout of the support reactions table
    pub fn reactions() -> Self {
        TableLayout::from_keywords(&["NODE", "L/C", "FX", "FY", "FZ"], &["NODE", "FX"], 1)
    }

    /// Layout of the load-case name table
    pub fn load_cases() -> Self {
        TableLayout::from_keywords(&["L/C", "TYPE", "NAME"], &["L/C", "NAME"], 0)
    }

    fn validate(&self, field: &str) -> ReactionResult<()> {
        if self.primary_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ReactionError::invalid_input(
                format!("{}.primary_keywords", field),
                format!("{:?}", self.primary_keywords),
                "At least one non-empty keyword is required",
            ));
        }
        Ok(())
    }
}

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Support reactions table layout
    pub reactions: TableLayout,

    /// Load-case name table layout
    pub load_cases: TableLayout,

    /// Prefix of the label used for load cases without a name ("LC " gives "LC 7")
    pub load_case_label_prefix: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            reactions: TableLayout::reactions(),
            load_cases: TableLayout::load_cases(),
            load_case_label_prefix: "LC ".to_string(),
        }
    }
}

impl AnalysisSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> ReactionResult<Self> {
        let mut file = File::open(path).map_err(|e| {
            ReactionError::file_error("open", path.display().to_string(), e.to_string())
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            ReactionError::file_error("read", path.display().to_string(), e.to_string())
        })?;

        let settings: AnalysisSettings =
            serde_json::from_str(&contents).map_err(|e| ReactionError::SerializationError {
                reason: format!("Invalid JSON in {}: {}", path.display(), e),
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings.
    pub fn validate(&self) -> ReactionResult<()> {
        self.reactions.validate("reactions")?;
        self.load_cases.validate("load_cases")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.reactions.primary_keywords, vec!["NODE", "L/C", "FX", "FY", "FZ"]);
        assert_eq!(settings.reactions.fallback_keywords, vec!["NODE", "FX"]);
        assert_eq!(settings.reactions.spacer_rows, 1);
        assert_eq!(settings.load_cases.primary_keywords, vec!["L/C", "TYPE", "NAME"]);
        assert_eq!(settings.load_cases.spacer_rows, 0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "load_case_label_prefix": "Case " }"#;
        let settings: AnalysisSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.load_case_label_prefix, "Case ");
        assert_eq!(settings.reactions, TableLayout::reactions());
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut settings = AnalysisSettings::default();
        settings.reactions.primary_keywords = vec![" ".to_string()];
        let err = settings.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_load_missing_file() {
        let err = AnalysisSettings::load(Path::new("no/such/settings.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir()
            .join(format!("reaction_settings_{}.json", std::process::id()));
        let json = r#"{
            "reactions": {
                "primary_keywords": ["JOINT", "FX"],
                "fallback_keywords": [],
                "spacer_rows": 0
            }
        }"#;
        std::fs::write(&path, json).unwrap();

        let settings = AnalysisSettings::load(&path).unwrap();
        assert_eq!(settings.reactions.primary_keywords, vec!["JOINT", "FX"]);
        assert_eq!(settings.reactions.spacer_rows, 0);
        assert_eq!(settings.load_cases, TableLayout::load_cases());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_malformed_json() {
        let path = std::env::temp_dir()
            .join(format!("reaction_settings_bad_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "reactions": 3 }"#).unwrap();

        let err = AnalysisSettings::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
        assert!(err.to_string().contains("Invalid JSON"));

        std::fs::remove_file(&path).ok();
    }
}
