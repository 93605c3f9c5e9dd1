//! The end-to-end run: listing page → links → per-video extraction →
//! raw store append → optional risk pass and analyzed snapshot.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use clipscout_common::{SourceType, VideoRecord};
use clipscout_extract::{assemble_record, ExtractorSet, PageDriver};
use clipscout_risk::{add_risk_columns, RiskScorer};
use clipscout_store::{write_snapshot, RawStore};

use crate::collector::{collect_video_links, wait_until_ready};
use crate::stats::RunStats;

/// Scroll distance per nudge, pixels. Two nudges load enough of the listing
/// grid to satisfy any realistic per-run limit.
const SCROLL_STEP: i64 = 8_000;
const SCROLL_ROUNDS: usize = 2;
const SCROLL_SETTLE: Duration = Duration::from_secs(2);

pub struct HarvestRequest {
    pub source_type: SourceType,
    pub query: String,
    pub limit: usize,
    pub analyze: bool,
}

pub struct Harvester<'a> {
    pub page: &'a dyn PageDriver,
    pub extractors: ExtractorSet,
    pub raw_store: RawStore,
    pub scorer: RiskScorer,
    pub snapshot_path: PathBuf,
    pub ready_timeout_secs: u64,
}

impl Harvester<'_> {
    pub async fn run(&self, request: &HarvestRequest) -> Result<RunStats> {
        let mut stats = RunStats::default();

        let listing_url = listing_url(request.source_type, &request.query);
        info!(url = %listing_url, limit = request.limit, "opening listing page");
        self.page.navigate(&listing_url).await?;
        wait_until_ready(self.page, self.ready_timeout_secs).await;

        for _ in 0..SCROLL_ROUNDS {
            if let Err(e) = self.page.scroll(SCROLL_STEP).await {
                warn!(error = %e, "scroll failed, collecting what is visible");
                break;
            }
            tokio::time::sleep(SCROLL_SETTLE).await;
        }

        let links = collect_video_links(self.page, request.limit).await;
        stats.links_found = links.len() as u32;
        if links.is_empty() {
            info!(query = %request.query, "no video links found");
            return Ok(stats);
        }

        let mut records: Vec<VideoRecord> = Vec::with_capacity(links.len());
        for url in &links {
            if let Err(e) = self.page.navigate(url).await {
                warn!(url, error = %e, "video page unreachable, skipping");
                stats.videos_skipped += 1;
                continue;
            }
            let record = assemble_record(
                self.page,
                &self.extractors,
                request.source_type,
                &request.query,
                url,
            )
            .await;
            records.push(record);
            stats.videos_processed += 1;
        }

        let outcome = self.raw_store.append(&records)?;
        stats.rows_appended = outcome.appended as u32;
        stats.duplicates_dropped = outcome.duplicates as u32;

        if request.analyze && !records.is_empty() {
            add_risk_columns(&self.scorer, &mut records).await?;
            let written = write_snapshot(&self.snapshot_path, &records)?;
            stats.analyzed_rows = records.len() as u32;
            info!(path = %written.display(), "analysis complete");
        }

        Ok(stats)
    }
}

fn listing_url(source_type: SourceType, query: &str) -> String {
    match source_type {
        SourceType::Hashtag => format!("https://www.tiktok.com/tag/{query}"),
        SourceType::User => format!("https://www.tiktok.com/@{query}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_urls_per_mode() {
        assert_eq!(
            listing_url(SourceType::Hashtag, "studyhacks"),
            "https://www.tiktok.com/tag/studyhacks"
        );
        assert_eq!(
            listing_url(SourceType::User, "somecreator"),
            "https://www.tiktok.com/@somecreator"
        );
    }
}
