//! Domain errors raised by the library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("column '{canonical}' not found; available columns: {}", .available.join(", "))]
    MissingColumn {
        canonical: String,
        available: Vec<String>,
    },

    #[error("row {row}: column '{column}' has a non-numeric value '{value}'")]
    InvalidCoordinate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("sheet {selector} not found; available sheets: {}", .available.join(", "))]
    SheetNotFound {
        selector: String,
        available: Vec<String>,
    },

    #[error("feature {ordinal} has no '{field}' attribute")]
    MissingField { ordinal: usize, field: String },

    #[error("feature {ordinal} is not a polygon ({shape})")]
    UnsupportedGeometry { ordinal: usize, shape: String },

    #[error("EPSG:{0} is not supported")]
    UnsupportedCrs(u32),

    #[error("{path} does not describe a supported coordinate system; set regions.crs")]
    UnrecognizedPrj { path: String },

    #[error("reprojection failed: {0}")]
    Projection(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}
