use std::fs;
use std::path::Path;

use geo::{polygon, MultiPolygon};

use incident_locator::crs::Crs;
use incident_locator::pip::RegionSet;
use incident_locator::pipeline::{run_with_progress, run_with_regions};
use incident_locator::table::InvalidRowPolicy;
use incident_locator::{Config, LocateError, Region};

fn square(ordinal: usize, label: &str, min_lon: f64, min_lat: f64, size: f64) -> Region {
    let poly = polygon![
        (x: min_lon, y: min_lat),
        (x: min_lon + size, y: min_lat),
        (x: min_lon + size, y: min_lat + size),
        (x: min_lon, y: min_lat + size),
        (x: min_lon, y: min_lat),
    ];
    Region::new(ordinal, label, MultiPolygon::new(vec![poly]))
}

fn regions() -> RegionSet {
    RegionSet::new(
        vec![
            square(0, "A", -101.0, 20.0, 1.0),
            square(1, "B", -100.0, 19.0, 1.0),
        ],
        Some(Crs::WGS84),
    )
}

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

#[test]
fn test_sign_fix_and_join() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accidentes.csv");
    let output = dir.path().join("resultados.csv");
    write(
        &input,
        "IDEvento,LATITUD,LONGITUD,DESCRIPCION\n\
         1,20.5,100.3,choque\n\
         2,25.0,-100.0,volcadura\n\
         3,19.5,-99.5,atropello\n\
         3,21.5,-101.5,choque\n",
    );

    let report = run_with_regions(&Config::default(), &input, &output, regions()).unwrap();

    assert_eq!(report.sanitize.corrections, 1);
    assert_eq!(report.sanitize.warnings.len(), 1);
    assert_eq!(report.join.total, 4);
    assert_eq!(report.join.matched, 2);
    assert_eq!(report.join.unmatched, 2);

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "IDEvento,LATITUD,LONGITUD,SECCION\n\
         1,20.5,-100.3,A\n\
         2,25.0,-100.0,\n\
         3,19.5,-99.5,B\n\
         3,21.5,-101.5,\n"
    );
}

#[test]
fn test_aliased_columns_and_empty_regions() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accidentes.csv");
    let output = dir.path().join("resultados.csv");
    write(&input, "LONGITUDE,IDAccidente,LAT\n-100.5,10,20.5\n-100.6,11,20.6\n");

    let report = run_with_regions(
        &Config::default(),
        &input,
        &output,
        RegionSet::new(vec![], Some(Crs::WGS84)),
    )
    .unwrap();

    assert_eq!(report.join.total, 2);
    assert_eq!(report.join.unmatched, 2);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "IDEvento,LATITUD,LONGITUD,SECCION\n10,20.5,-100.5,\n11,20.6,-100.6,\n"
    );
}

#[test]
fn test_invalid_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accidentes.csv");
    let output = dir.path().join("resultados.csv");
    write(&input, "IDEvento,LATITUD,LONGITUD\n1,20.5,-100.5\n2,sin dato,-100.1\n");

    let err = run_with_regions(&Config::default(), &input, &output, regions()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LocateError>(),
        Some(LocateError::InvalidCoordinate { row: 3, .. })
    ));
    assert!(!output.exists());

    let mut config = Config::default();
    config.input.on_invalid = InvalidRowPolicy::Skip;
    let report = run_with_regions(&config, &input, &output, regions()).unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.join.total, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "IDEvento,LATITUD,LONGITUD,SECCION\n1,20.5,-100.5,A\n"
    );
}

#[test]
fn test_missing_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accidentes.csv");
    let output = dir.path().join("resultados.csv");
    write(&input, "Clave,LATITUD,LONGITUD\n1,20.5,-100.5\n");

    let err = run_with_regions(&Config::default(), &input, &output, regions()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LocateError>(),
        Some(LocateError::MissingColumn { .. })
    ));

    let mut config = Config::default();
    config.input.columns.insert("IDEvento", "Clave");
    run_with_regions(&config, &input, &output, regions()).unwrap();
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "IDEvento,LATITUD,LONGITUD,SECCION\n1,20.5,-100.5,A\n"
    );
}

#[test]
fn test_row_without_coordinates_is_not_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accidentes.csv");
    let output = dir.path().join("resultados.csv");
    write(
        &input,
        "IDEvento,LATITUD,LONGITUD,DESCRIPCION
         1,20.5,-100.3,choque
         ,,,volcadura
         ,,,
",
    );

    let err = run_with_regions(&Config::default(), &input, &output, regions()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LocateError>(),
        Some(LocateError::InvalidCoordinate { row: 3, .. })
    ));
    assert!(!output.exists());

    let mut config = Config::default();
    config.input.on_invalid = InvalidRowPolicy::Skip;
    let report = run_with_regions(&config, &input, &output, regions()).unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.join.total, 1);
}

#[test]
fn test_progress_and_report_from_one_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accidentes.csv");
    let output = dir.path().join("resultados.csv");
    write(
        &input,
        "IDEvento,LATITUD,LONGITUD
1,20.5,-100.3
2,x,-100.1
3,19.5,-99.5
",
    );

    let mut config = Config::default();
    config.input.on_invalid = InvalidRowPolicy::Skip;
    let mut seen = Vec::new();
    let report = run_with_progress(&config, &input, &output, regions(), |done, total| {
        seen.push((done, total))
    })
    .unwrap();

    assert_eq!(seen, vec![(1, 2), (2, 2)]);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.join.matched, 2);
    assert_eq!(report.join.unprojectable, 0);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "IDEvento,LATITUD,LONGITUD,SECCION
1,20.5,-100.3,A
3,19.5,-99.5,B
"
    );
}
