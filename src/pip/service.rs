//! Left spatial join of incidents against region polygons.

use tracing::{debug, info, warn};

use super::{RegionSet, RegionSpatialIndex};
use crate::crs::{CoordTransformer, Crs};
use crate::error::LocateError;
use crate::models::{EnrichedRecord, IncidentRecord, Region};

/// Counts from one join pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Incidents that fell inside more than one region
    pub ambiguous: usize,
    /// Incidents outside the domain of the region projection, also unmatched
    pub unprojectable: usize,
}

/// Associates incidents with the region containing them.
pub struct SpatialAssociator {
    index: RegionSpatialIndex,
    transformer: CoordTransformer,
}

impl SpatialAssociator {
    /// Build the associator, reconciling the incident CRS with the region CRS.
    ///
    /// Incident points are reprojected into the region CRS for testing. When
    /// the regions declare no CRS they are assumed to share the incident CRS.
    pub fn new(regions: RegionSet, incident_crs: Crs) -> Result<Self, LocateError> {
        let region_crs = match regions.crs {
            Some(crs) => crs,
            None => {
                warn!(
                    "Regions declare no CRS, assuming they are in {}",
                    incident_crs
                );
                incident_crs
            }
        };

        let transformer = CoordTransformer::new(incident_crs, region_crs)?;
        if !transformer.is_identity() {
            info!("Reprojecting incidents from {} to {}", incident_crs, region_crs);
        }

        let index = RegionSpatialIndex::build(regions.regions);
        if index.is_empty() {
            warn!("No regions to join against, every incident will be unmatched");
        }

        Ok(Self { index, transformer })
    }

    /// Join every incident, keeping those without a region.
    ///
    /// An incident that cannot be reprojected into the region CRS gets no
    /// section and is counted in [`JoinSummary::unprojectable`].
    pub fn associate(&self, incidents: Vec<IncidentRecord>) -> (Vec<EnrichedRecord>, JoinSummary) {
        self.associate_with_progress(incidents, |_, _| {})
    }

    /// Same as [`associate`](Self::associate), calling `progress` with the
    /// number of incidents processed so far and the total.
    pub fn associate_with_progress<F>(
        &self,
        incidents: Vec<IncidentRecord>,
        mut progress: F,
    ) -> (Vec<EnrichedRecord>, JoinSummary)
    where
        F: FnMut(usize, usize),
    {
        let total = incidents.len();
        let mut summary = JoinSummary {
            total,
            ..Default::default()
        };
        let mut enriched = Vec::with_capacity(total);

        for (i, incident) in incidents.into_iter().enumerate() {
            let (lon, lat) = incident.xy();
            let section = match self.transformer.transform(lon, lat) {
                Ok((x, y)) => self.section_at(&incident, x, y),
                Err(e) => {
                    warn!(
                        "Incident {}: cannot reproject ({}, {}): {}",
                        incident.id, lat, lon, e
                    );
                    summary.unprojectable += 1;
                    None
                }
            };

            match &section {
                Some(_) => summary.matched += 1,
                None => summary.unmatched += 1,
            }
            if section.as_ref().is_some_and(|(_, hits)| *hits > 1) {
                summary.ambiguous += 1;
            }

            enriched.push(EnrichedRecord::from_incident(
                incident,
                section.map(|(label, _)| label),
            ));
            progress(i + 1, total);
        }

        info!(
            "Joined {} incidents: {} matched, {} without section",
            summary.total, summary.matched, summary.unmatched
        );
        if summary.ambiguous > 0 {
            warn!(
                "{} incidents fell inside overlapping regions; \
                 the first region in file order was used",
                summary.ambiguous
            );
        }
        if summary.unprojectable > 0 {
            warn!(
                "{} incidents could not be reprojected and have no section",
                summary.unprojectable
            );
        }

        (enriched, summary)
    }

    /// Label of the region containing (x, y), already in the region CRS, and
    /// the number of regions that matched
    fn section_at(&self, incident: &IncidentRecord, x: f64, y: f64) -> Option<(String, usize)> {
        let hits: Vec<&Region> = self.index.lookup(x, y);
        if hits.len() > 1 {
            debug!(
                "Incident {} at ({}, {}) is inside {} regions",
                incident.id,
                incident.lon,
                incident.lat,
                hits.len()
            );
        }

        hits.first().map(|region| (region.label.clone(), hits.len()))
    }
}
