//! Tab-separated serialization of merged batch tables.

use std::path::Path;

use crate::batch::MergedDataset;
use crate::error::Result;

/// Write a merged dataset as tab-separated text: a header row of series
/// keys, then one row per position. Missing values (the NaN padding)
/// serialize as the `NaN` token.
pub fn write_merged(dataset: &MergedDataset, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;

    writer.write_record(dataset.series().iter().map(|s| s.key.as_bytes()))?;

    for row in 0..dataset.max_len() {
        let record: Vec<String> = dataset
            .series()
            .iter()
            .map(|s| s.values.get(row).copied().unwrap_or(f64::NAN).to_string())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
