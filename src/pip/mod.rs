//! Point-in-Polygon (PIP) section lookup.
//!
//! Loads road-segment polygons from a shapefile and associates incidents
//! with them using an R-tree spatial index.

mod boundary;
mod index;
mod service;

pub use boundary::{load_regions, RegionSet, DEFAULT_LABEL_FIELD};
pub use index::RegionSpatialIndex;
pub use service::{JoinSummary, SpatialAssociator};
