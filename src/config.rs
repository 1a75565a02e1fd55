use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::crs::Crs;
use crate::pip::DEFAULT_LABEL_FIELD;
use crate::sanitize::CoordinateBounds;
use crate::table::{ColumnMapping, InvalidRowPolicy, SheetSelector};

/// Run options. Every field has a default, so an empty file is valid.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub regions: RegionsConfig,
    pub incidents: IncidentsConfig,
    pub bounds: CoordinateBounds,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct InputConfig {
    pub sheet: SheetSelector,
    pub columns: ColumnMapping,
    pub on_invalid: InvalidRowPolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RegionsConfig {
    pub path: PathBuf,
    pub label_field: String,
    /// Overrides the CRS declared by the `.prj` sidecar
    pub crs: Option<Crs>,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./buffersQRO/map.shp"),
            label_field: DEFAULT_LABEL_FIELD.to_string(),
            crs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct IncidentsConfig {
    pub crs: Crs,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
