//! Incident locator - associates traffic incidents with road sections
//!
//! This library provides the coordinate sanitizer, the point-in-polygon
//! join and the tabular adapters used by the `locate` binary.

pub mod config;
pub mod crs;
pub mod error;
pub mod models;
pub mod pip;
pub mod pipeline;
pub mod sanitize;
pub mod table;

pub use config::Config;
pub use error::LocateError;
pub use models::{EnrichedRecord, IncidentRecord, Region};
