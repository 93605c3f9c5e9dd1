//! End-to-end run against an in-memory page and a stub classifier. No
//! sidecar, no network, no media tools.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use image::RgbImage;
use tempfile::TempDir;

use clipscout::{Harvester, HarvestRequest};
use clipscout_common::SourceType;
use clipscout_extract::{
    EmotionReading, ExtractorSet, FaceAnalyzer, OcrEngine, PageDriver, Transcriber,
    DEFAULT_CAPTION_SELECTORS,
};
use clipscout_risk::{RiskModel, RiskResult, RiskScorer};
use clipscout_store::RawStore;

struct MockPage {
    listing_links: Vec<String>,
    navigated: Mutex<Vec<String>>,
}

impl MockPage {
    fn with_candidates(n: usize) -> Self {
        Self {
            listing_links: (1..=n)
                .map(|i| format!("https://www.tiktok.com/@a/video/{i}"))
                .collect(),
            navigated: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigated.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn inner_text(&self, _selector: &str, _timeout_ms: u64) -> Result<Option<String>> {
        Ok(Some("a caption with real words".to_string()))
    }

    async fn scroll(&self, _dy: i64) -> Result<()> {
        Ok(())
    }

    async fn links(&self, _pattern: &str) -> Result<Vec<String>> {
        Ok(self.listing_links.clone())
    }

    async fn current_url(&self) -> Result<String> {
        Ok("https://www.tiktok.com/tag/test".to_string())
    }
}

struct NoOcr;

#[async_trait]
impl OcrEngine for NoOcr {
    async fn read_text(&self, _frame: &RgbImage) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

struct NoFace;

impl FaceAnalyzer for NoFace {
    fn analyze(&self, _frame: &RgbImage) -> Result<Option<EmotionReading>> {
        Ok(None)
    }
}

struct FixedModel(f64);

impl RiskModel for FixedModel {
    fn classify(&self, texts: &[&str]) -> RiskResult<Vec<f64>> {
        Ok(vec![self.0; texts.len()])
    }
}

fn harvester<'a>(page: &'a MockPage, dir: &TempDir) -> Harvester<'a> {
    let work_dir = dir.path().to_path_buf();
    Harvester {
        page,
        extractors: ExtractorSet {
            http: reqwest::Client::new(),
            // no resolver endpoints: media signals degrade to defaults
            resolver_endpoints: Vec::new(),
            transcriber: Transcriber::new(Vec::new(), &work_dir),
            ocr: Box::new(NoOcr),
            face: Box::new(NoFace),
            caption_selectors: DEFAULT_CAPTION_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            caption_wait_ms: 10,
            work_dir,
        },
        raw_store: RawStore::new(dir.path().join("raw.csv")),
        scorer: RiskScorer::with_model(Arc::new(FixedModel(0.42)), 16),
        snapshot_path: dir.path().join("analyzed.csv"),
        ready_timeout_secs: 5,
    }
}

fn request(limit: usize, analyze: bool) -> HarvestRequest {
    HarvestRequest {
        source_type: SourceType::Hashtag,
        query: "test".to_string(),
        limit,
        analyze,
    }
}

#[tokio::test(start_paused = true)]
async fn limit_caps_processing_and_snapshot_carries_risk_columns() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::with_candidates(5);
    let h = harvester(&page, &dir);

    let stats = h.run(&request(3, true)).await.unwrap();

    assert_eq!(stats.links_found, 3);
    assert_eq!(stats.videos_processed, 3);
    assert_eq!(stats.rows_appended, 3);
    assert_eq!(stats.analyzed_rows, 3);

    // listing page plus exactly three video pages
    let navigated = page.navigated.lock().unwrap().clone();
    assert_eq!(navigated.len(), 4);
    assert_eq!(navigated[0], "https://www.tiktok.com/tag/test");

    let snapshot = std::fs::read(dir.path().join("analyzed.csv")).unwrap();
    assert!(snapshot.starts_with(&[0xEF, 0xBB, 0xBF]));
    let text = String::from_utf8(snapshot[3..].to_vec()).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.ends_with("caption_risk,overlay_risk,transcript_risk"));
    assert_eq!(text.lines().count(), 4);
    // eligible caption scored, empty overlay/transcript gated to 0
    assert!(text.contains("0.42"));
}

#[tokio::test(start_paused = true)]
async fn rerunning_the_same_query_appends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::with_candidates(3);
    let h = harvester(&page, &dir);

    let first = h.run(&request(3, false)).await.unwrap();
    assert_eq!(first.rows_appended, 3);

    let second = h.run(&request(3, false)).await.unwrap();
    assert_eq!(second.rows_appended, 0);
    assert_eq!(second.duplicates_dropped, 3);

    let raw = std::fs::read_to_string(dir.path().join("raw.csv")).unwrap();
    assert_eq!(raw.lines().count(), 4);
}

#[tokio::test(start_paused = true)]
async fn empty_listing_ends_cleanly_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::with_candidates(0);
    let h = harvester(&page, &dir);

    let stats = h.run(&request(3, true)).await.unwrap();
    assert_eq!(stats.links_found, 0);
    assert_eq!(stats.videos_processed, 0);
    assert!(!dir.path().join("raw.csv").exists());
    assert!(!dir.path().join("analyzed.csv").exists());
}
