// 📄 CSV export - an assembled Table written locally instead of uploaded

use crate::table::Table;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Write header + rows as CSV. Rows may differ in length from the header.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    for row in table.values() {
        wtr.write_record(&row).context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn export_csv(table: &Table, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    write_csv(table, file)
}

// ============================================================================
// TESTS
// ============================================================================
