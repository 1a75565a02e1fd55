use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, info};

use super::{Cell, SheetSelector, Table, TableFormat};

/// Sheet names in a workbook. A CSV file is a single sheet named after the file.
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => Ok(vec![path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string()]),
        TableFormat::Workbook => {
            let workbook = open_workbook_auto(path)
                .with_context(|| format!("Failed to open workbook {}", path.display()))?;
            Ok(workbook.sheet_names().to_vec())
        }
    }
}

/// Read the selected sheet into a table. The first row is the header.
pub fn read_table(path: &Path, sheet: &SheetSelector) -> Result<Table> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => read_csv(path)?,
        TableFormat::Workbook => read_workbook(path, sheet)?,
    };

    info!(
        "Read {} rows with columns [{}] from {}",
        table.len(),
        table.headers.join(", "),
        path.display()
    );
    Ok(table)
}

fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table::new(headers, rows))
}

fn read_workbook(path: &Path, sheet: &SheetSelector) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let sheets = workbook.sheet_names().to_vec();
    let name = sheet.select(&sheets)?.to_string();
    debug!("Reading sheet '{}' of {}", name, path.display());

    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("Failed to read sheet '{}'", name))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| data_to_cell(c).to_string()).collect(),
        None => return Ok(Table::default()),
    };

    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    Ok(Table::new(headers, rows))
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}
