use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::DailyDealFlow;

/// Write `records` as CSV with a header row named after the table columns.
pub fn write_csv<W: Write>(records: &[DailyDealFlow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv(records: &[DailyDealFlow], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(records, file)?;
    info!("💾 Exported {} rows to {}", records.len(), path.display());
    Ok(())
}
