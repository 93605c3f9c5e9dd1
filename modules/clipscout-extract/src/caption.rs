//! Caption text from the video page, first matching selector wins.

use tracing::debug;

use clipscout_common::{clean_text, Extraction};

use crate::page::PageDriver;

/// Selectors tried in order for the video description element.
pub const DEFAULT_CAPTION_SELECTORS: &[&str] = &[
    r#"[data-e2e="browse-video-desc"]"#,
    r#"[data-e2e="video-desc"]"#,
    r#"h1[data-e2e="browse-video-desc"]"#,
    r#"h1[data-e2e="video-desc"]"#,
];

pub async fn extract_caption(
    page: &dyn PageDriver,
    selectors: &[String],
    wait_ms: u64,
) -> Extraction<String> {
    for selector in selectors {
        match page.inner_text(selector, wait_ms).await {
            Ok(Some(text)) => {
                let cleaned = clean_text(&text);
                if !cleaned.is_empty() {
                    return Extraction::Ok(cleaned);
                }
            }
            Ok(None) => {}
            Err(e) => {
                debug!(selector, error = %e, "caption selector failed, trying next");
            }
        }
    }

    Extraction::degraded(String::new(), "no caption selector matched")
}
