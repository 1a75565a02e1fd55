//! Spatial index for fast region lookups.

use geo::{Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::{info, warn};

use crate::models::Region;

/// Wrapper for R-tree indexing of regions
pub struct IndexedRegion {
    pub region: Region,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRegion {
    pub fn new(region: Region) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = region.bbox()?;
        Some(Self {
            region,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Spatial index for region polygons using R-tree
pub struct RegionSpatialIndex {
    tree: RTree<IndexedRegion>,
}

impl RegionSpatialIndex {
    /// Build spatial index from regions. Regions without coordinates are dropped.
    pub fn build(regions: Vec<Region>) -> Self {
        info!("Building spatial index for {} regions...", regions.len());

        let total = regions.len();
        let indexed: Vec<IndexedRegion> = regions
            .into_iter()
            .filter_map(IndexedRegion::new)
            .collect();

        if indexed.len() < total {
            warn!("Skipped {} regions with empty geometry", total - indexed.len());
        }

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());

        Self { tree }
    }

    /// Find all regions whose interior contains the point, in file order
    pub fn lookup(&self, x: f64, y: f64) -> Vec<&Region> {
        let point = Point::new(x, y);
        let query_envelope = AABB::from_point([x, y]);

        // Envelope intersection gives candidates, exact containment filters them
        let mut hits: Vec<&Region> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ir| ir.region.geometry.contains(&point))
            .map(|ir| &ir.region)
            .collect();
        hits.sort_by_key(|r| r.ordinal);
        hits
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
