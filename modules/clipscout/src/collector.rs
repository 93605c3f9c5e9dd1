//! Link collection from a listing page.
//!
//! The listing page is behind bot checks, so readiness is polled instead of
//! assumed: at most one probe per second until either the page looks usable
//! or the wait budget runs out. A timed-out wait is not fatal, collection
//! just proceeds against whatever the page currently shows.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use clipscout_extract::PageDriver;

/// Substrings of the current URL that mean a challenge page, not content.
const CHALLENGE_MARKERS: &[&str] = &["verify", "captcha"];

/// Href substring that identifies a video page link.
pub const VIDEO_LINK_PATTERN: &str = "/video/";

/// Poll until the page is past any challenge interstitial and actually shows
/// video links, waiting at most `timeout_secs`. Probe errors are treated as
/// "not ready yet", not failures.
pub async fn wait_until_ready(page: &dyn PageDriver, timeout_secs: u64) {
    for elapsed in 0..timeout_secs {
        if is_ready(page).await {
            debug!(elapsed, "listing page ready");
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    warn!(
        timeout_secs,
        "listing page never became ready, collecting anyway"
    );
}

async fn is_ready(page: &dyn PageDriver) -> bool {
    let url = match page.current_url().await {
        Ok(url) => url,
        Err(e) => {
            debug!(error = %e, "readiness probe failed");
            return false;
        }
    };
    let lowered = url.to_lowercase();
    if CHALLENGE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return false;
    }
    match page.links(VIDEO_LINK_PATTERN).await {
        Ok(links) => !links.is_empty(),
        Err(e) => {
            debug!(error = %e, "link probe failed");
            false
        }
    }
}

/// Collect up to `limit` video links in first-seen order, duplicates
/// dropped. A locator failure yields an empty list rather than an error so
/// the run can end with a clean "nothing found".
pub async fn collect_video_links(page: &dyn PageDriver, limit: usize) -> Vec<String> {
    let hrefs = match page.links(VIDEO_LINK_PATTERN).await {
        Ok(hrefs) => hrefs,
        Err(e) => {
            warn!(error = %e, "link collection failed");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for href in hrefs {
        if seen.insert(href.clone()) {
            links.push(href);
            if links.len() == limit {
                break;
            }
        }
    }
    links
}
