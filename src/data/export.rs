use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::NormalizedSounding;

// ---------------------------------------------------------------------------
// CSV export of a normalized sounding
// ---------------------------------------------------------------------------

/// Name of the derived column appended after the schema columns.
pub const REFERENCE_DEPTH_COLUMN: &str = "referenceDepth";

/// Write all schema columns plus `referenceDepth`, one row per sample.
pub fn write_csv<W: Write>(sounding: &NormalizedSounding, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = sounding.raw().column_names().to_vec();
    header.push(REFERENCE_DEPTH_COLUMN);
    writer.write_record(&header).context("writing CSV header")?;

    for (row_no, (row, z)) in sounding
        .raw()
        .rows
        .iter()
        .zip(sounding.reference_depth())
        .enumerate()
    {
        let record = row.iter().chain(std::iter::once(z)).map(|v| v.to_string());
        writer
            .write_record(record)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Write a sounding to a CSV file at `path`.
pub fn write_csv_file(sounding: &NormalizedSounding, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(sounding, file)
}
