//! Tabular input and output.
//!
//! Input is read into an in-memory [`Table`] from CSV or a workbook sheet,
//! the required columns are resolved through a [`ColumnMapping`], and the
//! joined records are written back as CSV or xlsx.

mod columns;
mod reader;
mod writer;

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::LocateError;

pub use columns::{extract_incidents, ColumnMapping, InvalidRowPolicy, ResolvedColumns};
pub use reader::{list_sheets, read_table};
pub use writer::write_enriched;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric value, parsing text cells
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// Render a number the way a spreadsheet shows it: integers without `.0`
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Header row plus data rows. Rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }

    /// True when every cell of the row is empty, as in trailing workbook rows
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map_or(true, |cells| cells.iter().all(Cell::is_empty))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    /// Zero-based position
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl SheetSelector {
    /// Integers select by position, anything else by name
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<usize>() {
            Ok(i) => SheetSelector::Index(i),
            Err(_) => SheetSelector::Name(s.to_string()),
        }
    }

    /// Pick a sheet name from the available ones
    pub fn select<'a>(&self, sheets: &'a [String]) -> Result<&'a str, LocateError> {
        let found = match self {
            SheetSelector::Index(i) => sheets.get(*i),
            SheetSelector::Name(name) => sheets.iter().find(|s| *s == name),
        };
        found.map(String::as_str).ok_or_else(|| LocateError::SheetNotFound {
            selector: self.to_string(),
            available: sheets.to_vec(),
        })
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(i) => write!(f, "#{i}"),
            SheetSelector::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Supported tabular file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, LocateError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(TableFormat::Workbook),
            _ => Err(LocateError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-100.3), "-100.3");
        assert_eq!(format_number(20.5), "20.5");
    }

    #[test]
    fn test_cell_as_f64() {
        assert_eq!(Cell::Text(" 20.5 ".into()).as_f64(), Some(20.5));
        assert_eq!(Cell::Number(3.0).as_f64(), Some(3.0));
        assert_eq!(Cell::Text("n/a".into()).as_f64(), None);
        assert_eq!(Cell::Empty.as_f64(), None);
    }

    #[test]
    fn test_sheet_selector() {
        let sheets = vec!["Resumen".to_string(), "Accidentes".to_string()];
        assert_eq!(SheetSelector::parse("1").select(&sheets).unwrap(), "Accidentes");
        assert_eq!(
            SheetSelector::parse("Resumen").select(&sheets).unwrap(),
            "Resumen"
        );
        assert!(matches!(
            SheetSelector::Index(5).select(&sheets),
            Err(LocateError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a.CSV")).unwrap(), TableFormat::Csv);
        assert_eq!(
            TableFormat::from_path(Path::new("a.xlsx")).unwrap(),
            TableFormat::Workbook
        );
        assert!(TableFormat::from_path(Path::new("a.txt")).is_err());
    }
}
