//! Region polygon extraction from a shapefile.

use std::path::Path;

use anyhow::{Context, Result};
use geo::MultiPolygon;
use shapefile::dbase::{FieldValue, Record};
use shapefile::Shape;
use tracing::{debug, info, warn};

use crate::crs::{read_prj, Crs};
use crate::error::LocateError;
use crate::models::Region;
use crate::table::format_number;

/// Default attribute holding the section label
pub const DEFAULT_LABEL_FIELD: &str = "SECCION";

/// Regions loaded from one source, with the CRS their coordinates are in.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    /// `None` when the source did not declare one
    pub crs: Option<Crs>,
}

impl RegionSet {
    pub fn new(regions: Vec<Region>, crs: Option<Crs>) -> Self {
        Self { regions, crs }
    }

}

/// Load region polygons from a shapefile.
///
/// Every feature must be a polygon carrying `label_field`. `crs_override`
/// takes precedence over the `.prj` sidecar, which is then only compared
/// against it. Without an override an unrecognised sidecar is an error.
pub fn load_regions(
    path: &Path,
    label_field: &str,
    crs_override: Option<Crs>,
) -> Result<RegionSet> {
    info!("Loading regions from {}", path.display());

    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile {}", path.display()))?;

    let mut regions = Vec::new();

    for (ordinal, item) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = item.with_context(|| {
            format!("Failed to read feature {ordinal} of {}", path.display())
        })?;

        let geometry = shape_to_multipolygon(ordinal, shape)?;
        let label = record_label(ordinal, &record, label_field)?;
        regions.push(Region::new(ordinal, label, geometry));
    }

    let crs = match crs_override {
        Some(configured) => {
            match read_prj(path) {
                Ok(Some(declared)) if declared != configured => warn!(
                    "Regions declare {} but configuration says {}; using {}",
                    declared, configured, configured
                ),
                Err(e) => debug!("Ignoring .prj in favour of {}: {:#}", configured, e),
                _ => {}
            }
            Some(configured)
        }
        None => read_prj(path)?,
    };
    match crs {
        Some(crs) => info!("Loaded {} regions in {}", regions.len(), crs),
        None => info!("Loaded {} regions (no CRS declared)", regions.len()),
    }

    Ok(RegionSet::new(regions, crs))
}

fn shape_to_multipolygon(
    ordinal: usize,
    shape: Shape,
) -> Result<MultiPolygon<f64>, LocateError> {
    match shape {
        Shape::Polygon(polygon) => Ok(MultiPolygon::from(polygon)),
        Shape::PolygonM(polygon) => Ok(MultiPolygon::from(polygon)),
        Shape::PolygonZ(polygon) => Ok(MultiPolygon::from(polygon)),
        other => Err(LocateError::UnsupportedGeometry {
            ordinal,
            shape: format!("{:?}", other.shapetype()),
        }),
    }
}

fn record_label(
    ordinal: usize,
    record: &Record,
    label_field: &str,
) -> Result<String, LocateError> {
    let value = record
        .get(label_field)
        .ok_or_else(|| LocateError::MissingField {
            ordinal,
            field: label_field.to_string(),
        })?;

    match field_to_string(value) {
        Some(label) => Ok(label),
        None => {
            warn!("Feature {} has an empty {} value", ordinal, label_field);
            debug!("Raw value: {:?}", value);
            Ok(String::new())
        }
    }
}

/// Render a dBase attribute as text, `None` for null or unsupported values
pub fn field_to_string(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(format_number(*n)),
        FieldValue::Float(Some(n)) => Some(format_number(f64::from(*n))),
        FieldValue::Integer(n) => Some(n.to_string()),
        FieldValue::Double(n) => Some(format_number(*n)),
        FieldValue::Memo(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::dbase::TableWriterBuilder;
    use shapefile::{Point, Polygon, PolygonRing};

    const ESRI_UTM14: &str = r#"PROJCS["WGS_1984_UTM_Zone_14N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],UNIT["Meter",1.0]]"#;

    const ESRI_ALBERS: &str = r#"PROJCS["North_America_Albers_Equal_Area_Conic",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Albers"],UNIT["Meter",1.0]]"#;

    fn label_record(label: &str) -> Record {
        let mut record = Record::default();
        record.insert(
            DEFAULT_LABEL_FIELD.to_string(),
            FieldValue::Character(Some(label.to_string())),
        );
        record
    }

    fn table_builder() -> TableWriterBuilder {
        TableWriterBuilder::new().add_character_field(DEFAULT_LABEL_FIELD.try_into().unwrap(), 20)
    }

    /// Clockwise square with its lower left corner at (x, y)
    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, y),
            Point::new(x, y + size),
            Point::new(x + size, y + size),
            Point::new(x + size, y),
            Point::new(x, y),
        ]))
    }

    fn write_sections(path: &Path) {
        let mut writer = shapefile::Writer::from_path(path, table_builder()).unwrap();
        writer
            .write_shape_and_record(&square(-101.0, 20.0, 1.0), &label_record("A"))
            .unwrap();
        writer
            .write_shape_and_record(&square(-100.0, 19.0, 1.0), &label_record("B"))
            .unwrap();
    }

    #[test]
    fn test_load_regions_from_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.shp");
        write_sections(&path);
        std::fs::write(dir.path().join("map.prj"), ESRI_UTM14).unwrap();

        let set = load_regions(&path, DEFAULT_LABEL_FIELD, None).unwrap();

        let labels: Vec<(usize, &str)> = set
            .regions
            .iter()
            .map(|r| (r.ordinal, r.label.as_str()))
            .collect();
        assert_eq!(labels, vec![(0, "A"), (1, "B")]);
        assert_eq!(set.crs, Some(Crs { epsg: 32614 }));

        assert_eq!(set.regions[0].bbox(), Some((-101.0, 20.0, -100.0, 21.0)));
    }

    #[test]
    fn test_load_regions_without_prj() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.shp");
        write_sections(&path);

        let set = load_regions(&path, DEFAULT_LABEL_FIELD, None).unwrap();
        assert_eq!(set.regions.len(), 2);
        assert_eq!(set.crs, None);
    }

    #[test]
    fn test_unrecognized_prj_needs_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.shp");
        write_sections(&path);
        std::fs::write(dir.path().join("map.prj"), ESRI_ALBERS).unwrap();

        let err = load_regions(&path, DEFAULT_LABEL_FIELD, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LocateError>(),
            Some(LocateError::UnrecognizedPrj { .. })
        ));

        let set = load_regions(&path, DEFAULT_LABEL_FIELD, Some(Crs::WGS84)).unwrap();
        assert_eq!(set.crs, Some(Crs::WGS84));
    }

    #[test]
    fn test_override_replaces_declared_crs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.shp");
        write_sections(&path);
        std::fs::write(dir.path().join("map.prj"), ESRI_UTM14).unwrap();

        let set = load_regions(&path, DEFAULT_LABEL_FIELD, Some(Crs::WGS84)).unwrap();
        assert_eq!(set.crs, Some(Crs::WGS84));
    }

    #[test]
    fn test_missing_label_attribute_in_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.shp");
        write_sections(&path);

        let err = load_regions(&path, "NOMBRE", None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LocateError>(),
            Some(LocateError::MissingField { ordinal: 0, .. })
        ));
    }

    #[test]
    fn test_point_shapefile_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.shp");
        {
            let mut writer = shapefile::Writer::from_path(&path, table_builder()).unwrap();
            writer
                .write_shape_and_record(&Point::new(-100.5, 20.5), &label_record("A"))
                .unwrap();
        }

        let err = load_regions(&path, DEFAULT_LABEL_FIELD, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LocateError>(),
            Some(LocateError::UnsupportedGeometry { ordinal: 0, .. })
        ));
    }

    #[test]
    fn test_shape_to_multipolygon() {
        let polygon = shape_to_multipolygon(4, Shape::Polygon(square(0.0, 0.0, 2.0))).unwrap();
        assert_eq!(polygon.0.len(), 1);
        assert_eq!(polygon.0[0].exterior().0.len(), 5);

        let err = shape_to_multipolygon(4, Shape::Point(Point::new(1.0, 1.0))).unwrap_err();
        assert!(matches!(
            err,
            LocateError::UnsupportedGeometry { ordinal: 4, .. }
        ));
    }

    #[test]
    fn test_character_label_is_trimmed() {
        let value = FieldValue::Character(Some("QRO-57 ".to_string()));
        assert_eq!(field_to_string(&value), Some("QRO-57".to_string()));
    }

    #[test]
    fn test_numeric_label_drops_fraction() {
        assert_eq!(
            field_to_string(&FieldValue::Numeric(Some(12.0))),
            Some("12".to_string())
        );
        assert_eq!(field_to_string(&FieldValue::Integer(7)), Some("7".to_string()));
    }

    #[test]
    fn test_null_label() {
        assert_eq!(field_to_string(&FieldValue::Character(None)), None);
    }

    #[test]
    fn test_missing_label_field() {
        let mut record = Record::default();
        record.insert("NOMBRE".to_string(), FieldValue::Character(Some("x".into())));
        let err = record_label(3, &record, "SECCION").unwrap_err();
        assert!(matches!(err, LocateError::MissingField { ordinal: 3, .. }));
    }
}
