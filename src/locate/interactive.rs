//! Terminal prompts for sheet and column selection.
//!
//! Layered on top of the configuration: only the choices the configuration
//! leaves open are asked for.

use std::path::Path;

use anyhow::Result;
use dialoguer::Select;

use incident_locator::table::{list_sheets, read_table, ColumnMapping, SheetSelector};
use incident_locator::Config;

/// Ask for the sheet when the workbook has more than one
pub fn choose_sheet(input: &Path, config: &mut Config) -> Result<()> {
    let sheets = list_sheets(input)?;
    if sheets.len() <= 1 {
        return Ok(());
    }

    let default = config.input.sheet.select(&sheets).map_or(0, |name| {
        sheets.iter().position(|s| s == name).unwrap_or(0)
    });

    let selection = Select::new()
        .with_prompt("Select the sheet to process")
        .items(&sheets)
        .default(default)
        .interact()?;

    config.input.sheet = SheetSelector::Index(selection);
    Ok(())
}

/// Ask for every required column that cannot be resolved
pub fn choose_columns(input: &Path, config: &mut Config) -> Result<()> {
    let table = read_table(input, &config.input.sheet)?;
    let missing = config.input.columns.missing(&table.headers);

    let mut chosen = ColumnMapping::new();
    for canonical in missing {
        let selection = Select::new()
            .with_prompt(format!(
                "Column '{canonical}' not found. Select the column to use for '{canonical}'"
            ))
            .items(&table.headers)
            .default(0)
            .interact()?;
        chosen.insert(canonical, table.headers[selection].clone());
    }

    config.input.columns.merge(&chosen);
    Ok(())
}
