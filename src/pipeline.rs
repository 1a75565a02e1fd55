//! The batch run: read incidents, sanitize, join against regions, write.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{EnrichedRecord, IncidentRecord};
use crate::pip::{load_regions, JoinSummary, RegionSet, SpatialAssociator};
use crate::sanitize::{sanitize_records, SanitizeReport};
use crate::table::{extract_incidents, read_table, write_enriched};

/// What happened during a run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Rows dropped for unparsable coordinates
    pub skipped: usize,
    pub sanitize: SanitizeReport,
    pub join: JoinSummary,
}

/// Read the configured sheet and build incident records
pub fn load_incidents(config: &Config, input: &Path) -> Result<(Vec<IncidentRecord>, usize)> {
    let table = read_table(input, &config.input.sheet)
        .with_context(|| format!("Failed to read incidents from {}", input.display()))?;
    let columns = config.input.columns.resolve(&table)?;
    let (incidents, skipped) = extract_incidents(&table, &columns, config.input.on_invalid)?;

    if skipped > 0 {
        warn!("Skipped {} rows with invalid coordinates", skipped);
    }
    Ok((incidents, skipped))
}

/// Load the region shapefile, applying the configured CRS override
pub fn load_region_set(config: &Config) -> Result<RegionSet> {
    load_regions(
        &config.regions.path,
        &config.regions.label_field,
        config.regions.crs,
    )
}

/// Sanitize incidents and join them against the regions.
///
/// `skipped` is the number of input rows already dropped by
/// [`load_incidents`], carried into the report.
pub fn process<F>(
    config: &Config,
    mut incidents: Vec<IncidentRecord>,
    skipped: usize,
    regions: RegionSet,
    progress: F,
) -> Result<(Vec<EnrichedRecord>, RunReport)>
where
    F: FnMut(usize, usize),
{
    let sanitize = sanitize_records(&mut incidents, &config.bounds);

    let associator = SpatialAssociator::new(regions, config.incidents.crs)?;
    let (enriched, join) = associator.associate_with_progress(incidents, progress);

    Ok((
        enriched,
        RunReport {
            skipped,
            sanitize,
            join,
        },
    ))
}

/// Run against regions already in memory, reporting join progress
pub fn run_with_progress<F>(
    config: &Config,
    input: &Path,
    output: &Path,
    regions: RegionSet,
    progress: F,
) -> Result<RunReport>
where
    F: FnMut(usize, usize),
{
    let (incidents, skipped) = load_incidents(config, input)?;
    let (enriched, report) = process(config, incidents, skipped, regions, progress)?;

    write_enriched(output, &enriched)?;
    info!("Results saved to {}", output.display());
    Ok(report)
}

/// Run against regions already in memory
pub fn run_with_regions(
    config: &Config,
    input: &Path,
    output: &Path,
    regions: RegionSet,
) -> Result<RunReport> {
    run_with_progress(config, input, output, regions, |_, _| {})
}

/// Full run using the configured region shapefile
pub fn run(config: &Config, input: &Path, output: &Path) -> Result<RunReport> {
    let regions = load_region_set(config)?;
    run_with_regions(config, input, output, regions)
}
