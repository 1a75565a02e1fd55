//! Incident records as read from the input table and as written back out.

use serde::{Deserialize, Serialize};

/// Canonical header for the incident identifier column.
pub const ID_COLUMN: &str = "IDEvento";
/// Canonical header for the latitude column.
pub const LAT_COLUMN: &str = "LATITUD";
/// Canonical header for the longitude column.
pub const LON_COLUMN: &str = "LONGITUD";
/// Canonical header for the joined section label.
pub const SECTION_COLUMN: &str = "SECCION";

/// A single traffic incident with its reported location.
///
/// Coordinates are in degrees in the incident CRS. The sanitizer mutates
/// `lon` in place when the sign was entered wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Opaque identifier, uniqueness is not enforced
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

impl IncidentRecord {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
        }
    }

    /// (x, y) ordering used for point geometry: x = longitude, y = latitude
    pub fn xy(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }
}

/// Output row of the spatial join.
///
/// Field order and header names are the output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(rename = "IDEvento")]
    pub id: String,
    #[serde(rename = "LATITUD")]
    pub lat: f64,
    #[serde(rename = "LONGITUD")]
    pub lon: f64,
    /// `None` when no region contains the incident
    #[serde(rename = "SECCION")]
    pub section: Option<String>,
}

impl EnrichedRecord {
    pub fn from_incident(incident: IncidentRecord, section: Option<String>) -> Self {
        Self {
            id: incident.id,
            lat: incident.lat,
            lon: incident.lon,
            section,
        }
    }

    /// Output headers in column order
    pub fn headers() -> [&'static str; 4] {
        [ID_COLUMN, LAT_COLUMN, LON_COLUMN, SECTION_COLUMN]
    }
}
