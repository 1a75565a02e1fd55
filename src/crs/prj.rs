//! Detection of a supported CRS from `.prj` WKT.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::{
    proj_string, Crs, EPSG_GRS80, EPSG_MEXICO_ITRF2008, EPSG_MEXICO_ITRF2008_LCC,
    EPSG_MEXICO_ITRF92, EPSG_MEXICO_ITRF92_LCC, EPSG_NAD83, EPSG_WEB_MERCATOR, EPSG_WGS84,
};
use crate::error::LocateError;

/// Read the `.prj` sidecar next to a shapefile.
///
/// `Ok(None)` means there is no sidecar. A sidecar that names a system this
/// crate cannot reproject is an error.
pub fn read_prj(shp_path: &Path) -> Result<Option<Crs>> {
    let prj_path = shp_path.with_extension("prj");
    if !prj_path.exists() {
        return Ok(None);
    }

    let wkt = fs::read_to_string(&prj_path)
        .with_context(|| format!("Failed to read {}", prj_path.display()))?;
    let crs = detect_from_wkt(&wkt).ok_or_else(|| LocateError::UnrecognizedPrj {
        path: prj_path.display().to_string(),
    })?;
    debug!("{} resolved to {}", prj_path.display(), crs);
    Ok(Some(crs))
}

/// Match WKT to a supported EPSG code.
///
/// An explicit outer `AUTHORITY["EPSG", ...]` wins; ESRI-style WKT carries
/// none, so names are matched after that.
pub fn detect_from_wkt(wkt: &str) -> Option<Crs> {
    let wkt = wkt.trim_start_matches('\u{feff}').trim();
    let authority = Regex::new(r#"AUTHORITY\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#).ok()?;
    // The outermost authority closes the WKT, so it is the last one
    if let Some(epsg) = authority
        .captures_iter(wkt)
        .last()
        .and_then(|c| c[1].parse::<u32>().ok())
    {
        if proj_string(epsg).is_some() {
            return Some(Crs { epsg });
        }
    }

    let normalized = wkt.to_ascii_uppercase().replace(' ', "_");

    if normalized.starts_with("PROJCS") {
        return detect_projected(&normalized);
    }

    if is_itrf2008(&normalized) {
        Some(Crs { epsg: EPSG_MEXICO_ITRF2008 })
    } else if is_itrf92(&normalized) {
        Some(Crs { epsg: EPSG_MEXICO_ITRF92 })
    } else if normalized.contains("NAD83") || normalized.contains("NORTH_AMERICAN_1983") {
        Some(Crs { epsg: EPSG_NAD83 })
    } else if ["WGS84", "WGS_1984", "WGS_84"]
        .iter()
        .any(|name| normalized.contains(name))
    {
        Some(Crs { epsg: EPSG_WGS84 })
    } else if normalized.contains("GRS_1980") {
        Some(Crs { epsg: EPSG_GRS80 })
    } else {
        None
    }
}

fn detect_projected(normalized: &str) -> Option<Crs> {
    if ["WEB_MERCATOR", "PSEUDO-MERCATOR", "PSEUDO_MERCATOR"]
        .iter()
        .any(|name| normalized.contains(name))
    {
        return Some(Crs { epsg: EPSG_WEB_MERCATOR });
    }

    let utm = Regex::new(r"UTM_ZONE_(\d{1,2})([NS])").ok()?;
    if let Some(caps) = utm.captures(normalized) {
        let zone: u32 = caps[1].parse().ok()?;
        let north = &caps[2] == "N";
        let nad83 = normalized.contains("NAD83") || normalized.contains("NORTH_AMERICAN_1983");

        let epsg = match (nad83, north) {
            (true, true) => 26900 + zone,
            (false, true) => 32600 + zone,
            (false, false) => 32700 + zone,
            (true, false) => return None,
        };
        return proj_string(epsg).map(|_| Crs { epsg });
    }

    let lcc = normalized.contains("LAMBERT_CONFORMAL_CONIC") || normalized.contains("_LCC");
    if lcc && is_itrf2008(normalized) {
        return Some(Crs { epsg: EPSG_MEXICO_ITRF2008_LCC });
    }
    if lcc && is_itrf92(normalized) {
        return Some(Crs { epsg: EPSG_MEXICO_ITRF92_LCC });
    }

    None
}

fn is_itrf2008(normalized: &str) -> bool {
    normalized.contains("ITRF2008") || normalized.contains("ITRF_2008")
}

fn is_itrf92(normalized: &str) -> bool {
    normalized.contains("ITRF92") || normalized.contains("ITRF_1992")
}
