//! Core data models for incident location.

pub mod incident;
pub mod region;

pub use incident::{
    EnrichedRecord, IncidentRecord, ID_COLUMN, LAT_COLUMN, LON_COLUMN, SECTION_COLUMN,
};
pub use region::Region;
