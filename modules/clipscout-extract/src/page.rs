//! The page capability consumed by the caption extractor and the
//! orchestrator's link collector. One trait so tests can run against an
//! in-memory page with no sidecar.

use anyhow::Result;
use async_trait::async_trait;

use pagedriver_client::PageDriverClient;

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the shared page to a URL.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Visible text of the first element matching `selector`, waiting up to
    /// `timeout_ms`. `None` when nothing matched within the wait budget.
    async fn inner_text(&self, selector: &str, timeout_ms: u64) -> Result<Option<String>>;

    /// Scroll the page by `dy` pixels.
    async fn scroll(&self, dy: i64) -> Result<()>;

    /// Hrefs containing `pattern`, in DOM order, duplicates included.
    async fn links(&self, pattern: &str) -> Result<Vec<String>>;

    /// Current page URL.
    async fn current_url(&self) -> Result<String>;
}

#[async_trait]
impl PageDriver for PageDriverClient {
    async fn navigate(&self, url: &str) -> Result<()> {
        Ok(self.navigate(url).await?)
    }

    async fn inner_text(&self, selector: &str, timeout_ms: u64) -> Result<Option<String>> {
        Ok(self.inner_text(selector, timeout_ms).await?)
    }

    async fn scroll(&self, dy: i64) -> Result<()> {
        Ok(self.scroll(dy).await?)
    }

    async fn links(&self, pattern: &str) -> Result<Vec<String>> {
        Ok(self.links(pattern).await?)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current_url().await?)
    }
}
