//! Resolution of the required input columns and extraction of incidents.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{Cell, Table};
use crate::error::LocateError;
use crate::models::{IncidentRecord, ID_COLUMN, LAT_COLUMN, LON_COLUMN};

/// Canonical input columns, in resolution order
pub const REQUIRED_COLUMNS: [&str; 3] = [ID_COLUMN, LAT_COLUMN, LON_COLUMN];

/// Alternative headers accepted for each canonical column (case-insensitive)
pub fn aliases(canonical: &str) -> &'static [&'static str] {
    match canonical {
        ID_COLUMN => &["IDAccidente", "ID_EVENTO", "ID", "FOLIO"],
        LAT_COLUMN => &["LAT", "LATITUDE", "Y"],
        LON_COLUMN => &["LON", "LNG", "LONG", "LONGITUDE", "X"],
        _ => &[],
    }
}

/// Explicit mapping from canonical column name to source header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    map: HashMap<String, String>,
}

/// Positions of the required columns in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub id: usize,
    pub lat: usize,
    pub lon: usize,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, canonical: impl Into<String>, source: impl Into<String>) {
        self.map.insert(canonical.into(), source.into());
    }

    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.map.get(canonical).map(String::as_str)
    }

    /// Overlay another mapping on this one; entries in `other` win
    pub fn merge(&mut self, other: &ColumnMapping) {
        for (k, v) in &other.map {
            self.map.insert(k.clone(), v.clone());
        }
    }

    /// Parse `CANONICAL=SOURCE`
    pub fn parse_pair(s: &str) -> Result<(String, String), String> {
        let (canonical, source) = s
            .split_once('=')
            .ok_or_else(|| format!("expected CANONICAL=SOURCE, got '{s}'"))?;
        let canonical = canonical.trim();
        if !REQUIRED_COLUMNS.contains(&canonical) {
            return Err(format!(
                "unknown column '{canonical}', expected one of {}",
                REQUIRED_COLUMNS.join(", ")
            ));
        }
        Ok((canonical.to_string(), source.trim().to_string()))
    }

    /// Locate one canonical column in `headers`.
    ///
    /// An explicit mapping is authoritative; otherwise the canonical name and
    /// then its aliases are tried.
    pub fn find(&self, headers: &[String], canonical: &str) -> Option<usize> {
        if let Some(source) = self.get(canonical) {
            return headers.iter().position(|h| h == source);
        }

        if let Some(i) = headers.iter().position(|h| h == canonical) {
            return Some(i);
        }

        std::iter::once(canonical)
            .chain(aliases(canonical).iter().copied())
            .find_map(|alias| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(alias)))
    }

    /// Canonical columns that cannot be located
    pub fn missing(&self, headers: &[String]) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.find(headers, c).is_none())
            .collect()
    }

    pub fn resolve(&self, table: &Table) -> Result<ResolvedColumns, LocateError> {
        let find = |canonical: &str| {
            self.find(&table.headers, canonical)
                .ok_or_else(|| LocateError::MissingColumn {
                    canonical: self.get(canonical).unwrap_or(canonical).to_string(),
                    available: table.headers.clone(),
                })
        };

        let resolved = ResolvedColumns {
            id: find(ID_COLUMN)?,
            lat: find(LAT_COLUMN)?,
            lon: find(LON_COLUMN)?,
        };
        debug!(
            "Resolved columns: {} -> '{}', {} -> '{}', {} -> '{}'",
            ID_COLUMN,
            table.headers[resolved.id],
            LAT_COLUMN,
            table.headers[resolved.lat],
            LON_COLUMN,
            table.headers[resolved.lon]
        );
        Ok(resolved)
    }
}

/// What to do with a row whose coordinates do not parse as numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    /// Abort the run
    #[default]
    Fail,
    /// Drop the row with a warning
    Skip,
}

impl FromStr for InvalidRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(InvalidRowPolicy::Fail),
            "skip" => Ok(InvalidRowPolicy::Skip),
            other => Err(format!("expected 'fail' or 'skip', got '{other}'")),
        }
    }
}

/// Build incident records from the resolved columns.
///
/// Rows with every cell blank are ignored. A row holding any data must
/// carry valid coordinates or go through `policy`. Returns the records and the number of rows
/// skipped for invalid coordinates.
pub fn extract_incidents(
    table: &Table,
    columns: &ResolvedColumns,
    policy: InvalidRowPolicy,
) -> Result<(Vec<IncidentRecord>, usize), LocateError> {
    let mut incidents = Vec::with_capacity(table.len());
    let mut skipped = 0;

    for i in 0..table.len() {
        // Spreadsheet row number, counting the header
        let row = i + 2;
        if table.is_blank_row(i) {
            debug!("Row {} is blank, ignoring", row);
            continue;
        }

        let id = table.cell(i, columns.id);
        let lat = table.cell(i, columns.lat);
        let lon = table.cell(i, columns.lon);

        let parsed = parse_coordinate(table, row, columns.lat, lat)
            .and_then(|lat| Ok((lat, parse_coordinate(table, row, columns.lon, lon)?)));

        match parsed {
            Ok((lat, lon)) => incidents.push(IncidentRecord::new(id.to_string(), lat, lon)),
            Err(e) if policy == InvalidRowPolicy::Skip => {
                warn!("Skipping {}", e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok((incidents, skipped))
}

fn parse_coordinate(
    table: &Table,
    row: usize,
    column: usize,
    cell: &Cell,
) -> Result<f64, LocateError> {
    cell.as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LocateError::InvalidCoordinate {
            row,
            column: table.headers[column].clone(),
            value: cell.to_string(),
        })
}
