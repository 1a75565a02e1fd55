//! Region polygons the incidents are joined against.

use geo::{BoundingRect, MultiPolygon};

/// A named road-segment polygon loaded from the reference dataset.
#[derive(Debug, Clone)]
pub struct Region {
    /// Position of the feature in its source file
    pub ordinal: usize,
    /// Section label (the `SECCION` attribute by default)
    pub label: String,
    pub geometry: MultiPolygon<f64>,
}

impl Region {
    pub fn new(ordinal: usize, label: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            ordinal,
            label: label.into(),
            geometry,
        }
    }

    /// Get the bounding box of this region as (min_x, min_y, max_x, max_y)
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}
