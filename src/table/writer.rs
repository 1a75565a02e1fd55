use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use tracing::info;

use super::TableFormat;
use crate::models::EnrichedRecord;

/// Write the joined records with the four output columns
pub fn write_enriched(path: &Path, records: &[EnrichedRecord]) -> Result<()> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => write_csv(path, records)?,
        TableFormat::Workbook => write_xlsx(path, records)?,
    }

    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

fn write_csv(path: &Path, records: &[EnrichedRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    // Header written explicitly so an empty result still has one
    writer.write_record(EnrichedRecord::headers())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_xlsx(path: &Path, records: &[EnrichedRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in EnrichedRecord::headers().iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &record.id)?;
        worksheet.write_number(row, 1, record.lat)?;
        worksheet.write_number(row, 2, record.lon)?;
        if let Some(section) = &record.section {
            worksheet.write_string(row, 3, section)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
