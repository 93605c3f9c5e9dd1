//! Analyzed snapshot.
//!
//! A full overwrite of the current run's rows with risk columns attached.
//! Unlike the raw store it never accumulates: each run replaces the file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use clipscout_common::{VideoRecord, ANALYZED_COLUMNS};

use crate::error::StoreResult;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Write the analyzed snapshot, overwriting any previous one. The path is
/// forced to a `.csv` extension so a bare name still lands somewhere a
/// spreadsheet will open.
pub fn write_snapshot(path: &Path, records: &[VideoRecord]) -> StoreResult<PathBuf> {
    let path = if path.extension().and_then(|e| e.to_str()) == Some("csv") {
        path.to_path_buf()
    } else {
        path.with_extension("csv")
    };

    let mut file = File::create(&path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(ANALYZED_COLUMNS)?;
    for record in records {
        writer.write_record(ANALYZED_COLUMNS.iter().map(|col| record.cell(col)))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "analyzed snapshot written");
    Ok(path)
}
