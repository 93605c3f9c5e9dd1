//! Append-only raw store.
//!
//! One CSV file accumulating rows across runs. `video_url` is the unique
//! key: rows already present (or repeated within a batch) are dropped before
//! writing. The header written at creation time is frozen; later appends
//! serialize each record against whatever header the file actually has, so
//! a store created by an older build keeps its column order.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use clipscout_common::{VideoRecord, RAW_COLUMNS};

use crate::error::{StoreError, StoreResult};

/// Excel needs this to read UTF-8 CSVs correctly.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    pub appended: usize,
    pub duplicates: usize,
}

pub struct RawStore {
    path: PathBuf,
}

impl RawStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a batch, dropping rows whose `video_url` is already stored or
    /// repeats within the batch. An all-duplicate batch leaves the file
    /// byte-for-byte untouched.
    pub fn append(&self, records: &[VideoRecord]) -> StoreResult<AppendOutcome> {
        let existing = self.read_existing()?;

        let (header, mut seen) = match existing {
            Some((header, urls)) => (header, urls),
            None => (
                RAW_COLUMNS.iter().map(|c| c.to_string()).collect(),
                HashSet::new(),
            ),
        };

        let mut fresh: Vec<&VideoRecord> = Vec::new();
        for record in records {
            if seen.insert(record.video_url.clone()) {
                fresh.push(record);
            } else {
                debug!(url = %record.video_url, "duplicate row dropped");
            }
        }

        let outcome = AppendOutcome {
            appended: fresh.len(),
            duplicates: records.len() - fresh.len(),
        };
        if fresh.is_empty() {
            return Ok(outcome);
        }

        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if is_new {
            file.write_all(UTF8_BOM)?;
        }

        let mut writer = csv::Writer::from_writer(file);
        if is_new {
            writer.write_record(&header)?;
        }
        for record in &fresh {
            writer.write_record(header.iter().map(|col| record.cell(col)))?;
        }
        writer.flush()?;

        info!(
            path = %self.path.display(),
            appended = outcome.appended,
            duplicates = outcome.duplicates,
            "raw store updated"
        );
        Ok(outcome)
    }

    /// Header and known `video_url` set of the existing store, or `None` if
    /// the file does not exist yet. A file that exists but cannot be parsed
    /// is fatal: appending blind would corrupt accumulated data.
    fn read_existing(&self) -> StoreResult<Option<(Vec<String>, HashSet<String>)>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(&self.path)?;
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        let mut reader = csv::Reader::from_reader(Cursor::new(body.to_vec()));
        let header: Vec<String> = reader
            .headers()
            .map_err(|e| self.decode_err(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        let url_index = header
            .iter()
            .position(|c| c == "video_url")
            .ok_or_else(|| self.decode_err("missing video_url column".to_string()))?;

        let mut urls = HashSet::new();
        for row in reader.records() {
            let row = row.map_err(|e| self.decode_err(e.to_string()))?;
            if let Some(url) = row.get(url_index) {
                urls.insert(url.to_string());
            }
        }
        Ok(Some((header, urls)))
    }

    fn decode_err(&self, message: String) -> StoreError {
        StoreError::Decode {
            path: self.path.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use clipscout_common::SourceType;
    use tempfile::tempdir;

    use super::*;

    fn record(url: &str) -> VideoRecord {
        VideoRecord {
            source_type: SourceType::Hashtag,
            source_value: "test".into(),
            video_url: url.into(),
            caption_raw: "a caption".into(),
            transcript_raw: String::new(),
            overlay_text_raw: String::new(),
            face_detected: false,
            face_dominant_emotion: None,
            face_emotion_score: 0.0,
            visual_brightness: Some(120.5),
            visual_blur: None,
            caption_risk: None,
            overlay_risk: None,
            transcript_risk: None,
        }
    }

    #[test]
    fn creates_store_with_bom_and_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let store = RawStore::new(&path);

        let outcome = store.append(&[record("https://t/video/1")]).unwrap();
        assert_eq!(outcome.appended, 1);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.starts_with("source_type,source_value,video_url"));
        assert!(text.contains("https://t/video/1"));
    }

    #[test]
    fn dedups_across_runs_and_within_a_batch() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path().join("raw.csv"));

        store
            .append(&[record("https://t/video/1"), record("https://t/video/2")])
            .unwrap();
        let outcome = store
            .append(&[
                record("https://t/video/2"),
                record("https://t/video/3"),
                record("https://t/video/3"),
            ])
            .unwrap();

        assert_eq!(outcome, AppendOutcome { appended: 1, duplicates: 2 });

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.matches("/video/3").count(), 1);
    }

    #[test]
    fn all_duplicate_batch_leaves_the_file_untouched() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path().join("raw.csv"));

        store.append(&[record("https://t/video/1")]).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let outcome = store.append(&[record("https://t/video/1")]).unwrap();
        assert_eq!(outcome, AppendOutcome { appended: 0, duplicates: 1 });
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn empty_batch_does_not_create_a_file() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path().join("raw.csv"));
        store.append(&[]).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn appends_follow_the_existing_header_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        // store written by an older build: reordered, with a retired column
        std::fs::write(
            &path,
            "video_url,caption_raw,legacy_notes\nhttps://t/video/1,old,kept\n",
        )
        .unwrap();

        let store = RawStore::new(&path);
        let outcome = store.append(&[record("https://t/video/2")]).unwrap();
        assert_eq!(outcome.appended, 1);

        let text = std::fs::read_to_string(&path).unwrap();
        let last = text.lines().last().unwrap();
        // url first per the existing header, empty cell for the retired column
        assert_eq!(last, "https://t/video/2,a caption,");
    }

    #[test]
    fn unparseable_store_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "no_url_column_here\nvalue\n").unwrap();

        let store = RawStore::new(&path);
        let err = store.append(&[record("https://t/video/1")]).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }
}
