//! Coordinate sanitization.
//!
//! Incident coordinates are expected inside a regional bounding box with a
//! negative longitude. A positive longitude is treated as a sign-entry error
//! and flipped. Anything still outside the box afterwards is reported, never
//! altered.

use serde::Deserialize;
use tracing::{info, warn};

use crate::models::IncidentRecord;

/// Expected coordinate ranges, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoordinateBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for CoordinateBounds {
    fn default() -> Self {
        Self {
            lat_min: 19.0,
            lat_max: 22.0,
            lon_min: -102.0,
            lon_max: -99.0,
        }
    }
}

impl CoordinateBounds {
    pub fn lat_in_range(&self, lat: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat)
    }

    pub fn lon_in_range(&self, lon: f64) -> bool {
        (self.lon_min..=self.lon_max).contains(&lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Latitude => write!(f, "latitude"),
            Axis::Longitude => write!(f, "longitude"),
        }
    }
}

/// Advisory notice for a coordinate outside the expected range.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateWarning {
    pub id: String,
    pub axis: Axis,
    pub value: f64,
}

/// Result of sanitizing a single (lat, lon) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanitizedPair {
    pub lat: f64,
    pub lon: f64,
    /// Longitude sign was flipped
    pub corrected: bool,
    pub lat_out_of_range: bool,
    pub lon_out_of_range: bool,
}

/// Summary of a sanitization pass over a record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizeReport {
    /// Number of longitudes flipped from positive to negative
    pub corrections: usize,
    pub warnings: Vec<CoordinateWarning>,
}

/// Sanitize one pair. Range checks run after the sign correction.
pub fn sanitize_pair(lat: f64, lon: f64, bounds: &CoordinateBounds) -> SanitizedPair {
    let (lon, corrected) = if lon > 0.0 { (-lon, true) } else { (lon, false) };

    SanitizedPair {
        lat,
        lon,
        corrected,
        lat_out_of_range: !bounds.lat_in_range(lat),
        lon_out_of_range: !bounds.lon_in_range(lon),
    }
}

/// Sanitize every record in place and report corrections and warnings.
pub fn sanitize_records(
    records: &mut [IncidentRecord],
    bounds: &CoordinateBounds,
) -> SanitizeReport {
    let mut report = SanitizeReport::default();

    for record in records.iter_mut() {
        let pair = sanitize_pair(record.lat, record.lon, bounds);
        record.lon = pair.lon;

        if pair.corrected {
            report.corrections += 1;
        }

        if pair.lat_out_of_range {
            warn!(
                "Incident {}: latitude out of expected range: {}",
                record.id, pair.lat
            );
            report.warnings.push(CoordinateWarning {
                id: record.id.clone(),
                axis: Axis::Latitude,
                value: pair.lat,
            });
        }

        if pair.lon_out_of_range {
            warn!(
                "Incident {}: longitude out of expected range: {}",
                record.id, pair.lon
            );
            report.warnings.push(CoordinateWarning {
                id: record.id.clone(),
                axis: Axis::Longitude,
                value: pair.lon,
            });
        }
    }

    if report.corrections > 0 {
        info!(
            "Converted {} positive longitudes to negative",
            report.corrections
        );
    }

    report
}
