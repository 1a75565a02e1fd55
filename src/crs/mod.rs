//! Coordinate reference systems and reprojection.
//!
//! A CRS is identified by its EPSG code. Only the systems that show up in
//! regional road datasets are supported; `.prj` sidecar WKT is matched to one
//! of them by name.

mod prj;

use std::fmt;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::Deserialize;

use crate::error::LocateError;

pub use prj::{detect_from_wkt, read_prj};

/// WGS84 geographic (longitude/latitude in degrees)
pub const EPSG_WGS84: u32 = 4326;
/// Web Mercator
pub const EPSG_WEB_MERCATOR: u32 = 3857;
/// NAD83 geographic
pub const EPSG_NAD83: u32 = 4269;
/// Unknown datum based on GRS 1980 ellipsoid
pub const EPSG_GRS80: u32 = 4019;
/// Mexico ITRF2008 geographic
pub const EPSG_MEXICO_ITRF2008: u32 = 6365;
/// Mexico ITRF2008 / LCC (INEGI national projection)
pub const EPSG_MEXICO_ITRF2008_LCC: u32 = 6372;
/// Mexico ITRF92 geographic
pub const EPSG_MEXICO_ITRF92: u32 = 4483;
/// Mexico ITRF92 / LCC, same parameters as the ITRF2008 projection
pub const EPSG_MEXICO_ITRF92_LCC: u32 = 6362;

const GRS80_TOWGS84: &str = "+ellps=GRS80 +towgs84=0,0,0,0,0,0,0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Crs {
    pub epsg: u32,
}

impl Crs {
    pub const WGS84: Crs = Crs { epsg: EPSG_WGS84 };

    pub fn from_epsg(epsg: u32) -> Result<Self, LocateError> {
        if proj_string(epsg).is_none() {
            return Err(LocateError::UnsupportedCrs(epsg));
        }
        Ok(Self { epsg })
    }

    /// Geographic systems take degrees, projected ones take metres
    pub fn is_geographic(&self) -> bool {
        matches!(
            self.epsg,
            EPSG_WGS84 | EPSG_NAD83 | EPSG_GRS80 | EPSG_MEXICO_ITRF2008 | EPSG_MEXICO_ITRF92
        )
    }

    pub fn proj_string(&self) -> Option<String> {
        proj_string(self.epsg)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::WGS84
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// proj4 definition for a supported EPSG code
pub fn proj_string(epsg: u32) -> Option<String> {
    let s = match epsg {
        EPSG_WGS84 => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
        EPSG_NAD83 | EPSG_MEXICO_ITRF2008 | EPSG_MEXICO_ITRF92 => {
            format!("+proj=longlat {GRS80_TOWGS84} +no_defs")
        }
        EPSG_GRS80 => "+proj=longlat +ellps=GRS80 +no_defs".to_string(),
        EPSG_WEB_MERCATOR => {
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"
                .to_string()
        }
        EPSG_MEXICO_ITRF2008_LCC | EPSG_MEXICO_ITRF92_LCC => format!(
            "+proj=lcc +lat_0=12 +lon_0=-102 +lat_1=17.5 +lat_2=29.5 +x_0=2500000 +y_0=0 {GRS80_TOWGS84} +units=m +no_defs"
        ),
        // WGS84 / UTM north and south
        32601..=32660 => format!(
            "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
            epsg - 32600
        ),
        32701..=32760 => format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            epsg - 32700
        ),
        // NAD83 / UTM
        26901..=26923 => format!(
            "+proj=utm +zone={} {GRS80_TOWGS84} +units=m +no_defs",
            epsg - 26900
        ),
        _ => return None,
    };
    Some(s)
}

/// Reprojects coordinates between two CRS.
pub struct CoordTransformer {
    source: Crs,
    target: Crs,
    /// `None` when source and target are the same system
    projs: Option<(Proj, Proj)>,
}

impl fmt::Debug for CoordTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordTransformer")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl CoordTransformer {
    pub fn new(source: Crs, target: Crs) -> Result<Self, LocateError> {
        if source == target {
            return Ok(Self {
                source,
                target,
                projs: None,
            });
        }

        let source_proj = build_proj(source)?;
        let target_proj = build_proj(target)?;

        Ok(Self {
            source,
            target,
            projs: Some((source_proj, target_proj)),
        })
    }

    pub fn is_identity(&self) -> bool {
        self.projs.is_none()
    }

    /// Transform an (x, y) pair. Geographic input and output are in degrees.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), LocateError> {
        let Some((source_proj, target_proj)) = &self.projs else {
            return Ok((x, y));
        };

        let mut point = if self.source.is_geographic() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(source_proj, target_proj, &mut point).map_err(|e| {
            LocateError::Projection(format!("{} -> {}: {e:?}", self.source, self.target))
        })?;

        if self.target.is_geographic() {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

fn build_proj(crs: Crs) -> Result<Proj, LocateError> {
    let definition = crs
        .proj_string()
        .ok_or(LocateError::UnsupportedCrs(crs.epsg))?;
    Proj::from_proj_string(&definition)
        .map_err(|e| LocateError::Projection(format!("invalid projection {crs}: {e:?}")))
}
