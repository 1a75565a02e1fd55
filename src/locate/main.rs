//! Incident locator.
//!
//! Reads an incident spreadsheet, repairs coordinate signs, joins each
//! incident to the road section containing it and writes the result.

mod interactive;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use incident_locator::crs::Crs;
use incident_locator::pipeline::{load_region_set, run_with_progress};
use incident_locator::table::{ColumnMapping, InvalidRowPolicy, SheetSelector};
use incident_locator::Config;

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Associate traffic incidents with road sections")]
#[command(after_help = "Example: locate accidentes.xlsx resultados.xlsx")]
struct Args {
    /// Input spreadsheet with incident data (.xlsx, .xls, .ods or .csv)
    input: PathBuf,

    /// Output file for the results (.xlsx or .csv)
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Road section shapefile
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Attribute holding the section label
    #[arg(long)]
    label_field: Option<String>,

    /// EPSG code of the region shapefile, overriding its .prj
    #[arg(long)]
    regions_crs: Option<u32>,

    /// Sheet to read, by name or zero-based index
    #[arg(long)]
    sheet: Option<String>,

    /// Map a required column to a source column, e.g. IDEvento=Folio
    #[arg(long = "map", value_parser = ColumnMapping::parse_pair)]
    mappings: Vec<(String, String)>,

    /// What to do with rows whose coordinates are not numbers (fail or skip)
    #[arg(long)]
    on_invalid: Option<InvalidRowPolicy>,

    /// Prompt for the sheet and for columns that cannot be resolved
    #[arg(short, long)]
    interactive: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args)?;

    info!("Incident Locator");
    info!("Input: {}", args.input.display());

    if args.interactive {
        interactive::choose_sheet(&args.input, &mut config)?;
        interactive::choose_columns(&args.input, &mut config)?;
    }

    let regions = load_region_set(&config)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let report = run_with_progress(&config, &args.input, &args.output, regions, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("Join complete");

    info!(
        "Done: {} incidents, {} with section, {} without",
        report.join.total, report.join.matched, report.join.unmatched
    );
    if report.skipped > 0 {
        info!("{} input rows skipped for invalid coordinates", report.skipped);
    }
    if report.sanitize.corrections > 0 || !report.sanitize.warnings.is_empty() {
        info!(
            "{} longitude signs corrected, {} coordinates out of range",
            report.sanitize.corrections,
            report.sanitize.warnings.len()
        );
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(path) = &args.regions {
        config.regions.path = path.clone();
    }
    if let Some(field) = &args.label_field {
        config.regions.label_field = field.clone();
    }
    if let Some(epsg) = args.regions_crs {
        config.regions.crs = Some(Crs::from_epsg(epsg)?);
    }
    if let Some(sheet) = &args.sheet {
        config.input.sheet = SheetSelector::parse(sheet);
    }
    for (canonical, source) in &args.mappings {
        config.input.columns.insert(canonical.clone(), source.clone());
    }
    if let Some(policy) = args.on_invalid {
        config.input.on_invalid = policy;
    }
    Ok(())
}
