//! # Raw Grid
//!
//! One worksheet loaded as an unheadered 2-D grid of cells. Nothing about
//! the table layout is assumed here; locating headers and columns is left
//! to [`crate::header`] and [`crate::columns`].
//!
//! Workbooks are read with calamine, so xlsx, xlsm, xlsb, xls and ods files
//! are all accepted.
//!
//! ## Example
//!
//! ```rust
//! use reaction_core::grid::{Cell, RawGrid};
//!
//! let grid = RawGrid::new(vec![
//!     vec![Cell::text("Node"), Cell::text("L/C")],
//!     vec![Cell::Number(1.0), Cell::Number(101.0)],
//! ]);
//!
//! assert_eq!(grid.len(), 2);
//! assert_eq!(grid.cell(1, 1).as_number(), Some(101.0));
//! assert!(grid.cell(5, 5).is_blank());
//! ```

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};

use crate::errors::{ReactionError, ReactionResult};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Create a text cell
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text of the cell, as a user would read it in the sheet.
    pub fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
        }
    }

    /// Lenient numeric coercion.
    ///
    /// Numbers pass through, text is trimmed and parsed. Anything else,
    /// including non-finite results, is `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(v) => *v,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(_) | Data::DateTimeIso(_) | Data::DurationIso(_) => {
                Cell::Text(data.to_string())
            }
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// Ordered rows of cells with a stable 0-based row index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,

    /// Absolute (row, column) of grid cell (0, 0) within the sheet.
    ///
    /// calamine ranges start at the first used cell, not at A1.
    origin: (u32, u32),
}

impl RawGrid {
    /// Build a grid whose first cell is the sheet's A1
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        RawGrid {
            rows,
            origin: (0, 0),
        }
    }

    /// Set the absolute sheet position of the first grid cell (builder pattern)
    pub fn with_origin(mut self, row: u32, column: u32) -> Self {
        self.origin = (row, column);
        self
    }

    /// Convert a calamine range into a grid
    pub fn from_range(range: &Range<Data>) -> Self {
        let rows = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        let (row, column) = range.start().unwrap_or((0, 0));
        RawGrid::new(rows).with_origin(row, column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Get a row by grid index
    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Get a cell; positions outside the grid read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    /// 1-based sheet row number for a grid row index, as shown in a spreadsheet UI
    pub fn sheet_row(&self, index: usize) -> usize {
        self.origin.0 as usize + index + 1
    }

    /// Display text of the first `count` rows, used as a diagnostic when no
    /// table could be located.
    pub fn preview(&self, count: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(count)
            .map(|row| row.iter().map(Cell::display_text).collect())
            .collect()
    }
}

/// A worksheet grid together with the name of the sheet it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetGrid {
    pub sheet: String,
    pub grid: RawGrid,
}

fn open_error(path: &Path, e: impl std::fmt::Display) -> ReactionError {
    ReactionError::file_error("open workbook", path.display().to_string(), e.to_string())
}

/// List sheet names in workbook order.
pub fn list_sheets(path: &Path) -> ReactionResult<Vec<String>> {
    let workbook = open_workbook_auto(path)
        .map_err(|e| open_error(path, e))?;
    Ok(workbook.sheet_names())
}

/// Read one sheet of a workbook into a [`RawGrid`].
///
/// With `sheet = None` the first sheet is read.
///
/// # Returns
///
/// * `Ok(SheetGrid)` - The sheet name and its cells
/// * `Err(ReactionError::SheetNotFound)` - The named sheet does not exist
/// * `Err(ReactionError::FileError)` - The workbook could not be opened or read
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> ReactionResult<SheetGrid> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| open_error(path, e))?;

    let available = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) if available.iter().any(|s| s == name) => name.to_string(),
        Some(name) => {
            return Err(ReactionError::SheetNotFound {
                sheet: name.to_string(),
                available,
            })
        }
        None => available.first().cloned().ok_or_else(|| {
            ReactionError::file_error(
                "read workbook",
                path.display().to_string(),
                "workbook has no sheets",
            )
        })?,
    };

    if available.len() > 1 {
        log::info!("Workbook has {} sheets, reading '{}'", available.len(), sheet_name);
    }

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        ReactionError::file_error(
            format!("read sheet '{}'", sheet_name),
            path.display().to_string(),
            e.to_string(),
        )
    })?;

    let grid = RawGrid::from_range(&range);
    log::info!(
        "Read sheet '{}': {} rows x {} columns",
        sheet_name,
        range.height(),
        range.width()
    );

    Ok(SheetGrid {
        sheet: sheet_name,
        grid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_number_coercion() {
        assert_eq!(Cell::Number(-12.5).as_number(), Some(-12.5));
        assert_eq!(Cell::text(" 42 ").as_number(), Some(42.0));
        assert_eq!(Cell::text("1e3").as_number(), Some(1000.0));
        assert_eq!(Cell::text("kN").as_number(), None);
        assert_eq!(Cell::text("NaN").as_number(), None);
        assert_eq!(Cell::Bool(true).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn test_blank_cells() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::text("   ").is_blank());
        assert!(!Cell::Number(0.0).is_blank());
        assert!(!Cell::text("0").is_blank());
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Cell::Number(3.0).display_text(), "3");
        assert_eq!(Cell::Number(2.5).display_text(), "2.5");
        assert_eq!(Cell::Bool(false).display_text(), "FALSE");
        assert_eq!(Cell::Empty.display_text(), "");
    }

    #[test]
    fn test_from_calamine_range() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Node".to_string()));
        range.set_value((2, 2), Data::String(String::new()));
        range.set_value((3, 1), Data::Int(7));
        range.set_value((3, 2), Data::Float(-1.25));

        let grid = RawGrid::from_range(&range);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell(0, 0), &Cell::text("Node"));
        assert_eq!(grid.cell(0, 1), &Cell::Empty);
        assert_eq!(grid.cell(1, 0), &Cell::Number(7.0));
        assert_eq!(grid.cell(1, 1), &Cell::Number(-1.25));
        // Range started at sheet row 3 (0-based 2)
        assert_eq!(grid.sheet_row(0), 3);
    }

    #[test]
    fn test_out_of_range_cells_are_empty() {
        let grid = RawGrid::new(vec![vec![Cell::Number(1.0)]]);
        assert!(grid.cell(0, 3).is_blank());
        assert!(grid.cell(9, 0).is_blank());
        assert!(grid.row(1).is_none());
    }

    #[test]
    fn test_preview() {
        let grid = RawGrid::new(vec![
            vec![Cell::text("a"), Cell::Number(1.0)],
            vec![Cell::text("b")],
            vec![Cell::text("c")],
        ]);
        let preview = grid.preview(2);
        assert_eq!(preview, vec![vec!["a".to_string(), "1".to_string()], vec!["b".to_string()]]);
    }

    fn write_two_sheet_workbook(path: &Path) {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let summary = workbook.add_worksheet();
        summary.set_name("Summary").unwrap();
        summary.write_string(0, 0, "Job").unwrap();

        let reactions = workbook.add_worksheet();
        reactions.set_name("Reactions").unwrap();
        reactions.write_string(0, 0, "Run date").unwrap();
        let date = ExcelDateTime::from_ymd(2024, 3, 15).unwrap();
        let format = Format::new().set_num_format("yyyy-mm-dd");
        reactions.write_datetime_with_format(1, 0, &date, &format).unwrap();
        reactions.write_number(2, 0, 42.0).unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_read_sheet_from_workbook() {
        let path = std::env::temp_dir().join(format!("reaction_grid_{}.xlsx", std::process::id()));
        write_two_sheet_workbook(&path);

        assert_eq!(list_sheets(&path).unwrap(), vec!["Summary", "Reactions"]);

        let first = read_sheet(&path, None).unwrap();
        assert_eq!(first.sheet, "Summary");
        assert_eq!(first.grid.cell(0, 0), &Cell::text("Job"));

        let named = read_sheet(&path, Some("Reactions")).unwrap();
        assert_eq!(named.sheet, "Reactions");
        assert!(matches!(named.grid.cell(1, 0), Cell::Text(_)));
        assert_eq!(named.grid.cell(2, 0), &Cell::Number(42.0));

        match read_sheet(&path, Some("Nope")).unwrap_err() {
            ReactionError::SheetNotFound { sheet, available } => {
                assert_eq!(sheet, "Nope");
                assert_eq!(available, vec!["Summary", "Reactions"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_workbook_is_file_error() {
        let err = read_sheet(Path::new("does/not/exist.xlsx"), None).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
