pub mod error;

pub use error::{PageDriverError, Result};

use std::time::Duration;

use serde::Deserialize;

/// Client for the pagedriver sidecar: a single browser page driven over
/// HTTP. The sidecar owns navigation retries, DOM access, and anti-bot
/// plumbing; this client only speaks its JSON API.
pub struct PageDriverClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinksResponse {
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: String,
}

impl PageDriverClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let mut endpoint = format!("{}/{path}", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(self.endpoint(path))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PageDriverError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    /// Start (or restart) the page session. `headless` is passed through to
    /// the browser launch.
    pub async fn start_session(&self, headless: bool) -> Result<()> {
        self.post("session", serde_json::json!({ "headless": headless }))
            .await?;
        Ok(())
    }

    /// Navigate the page to a URL and wait for load.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.post("navigate", serde_json::json!({ "url": url }))
            .await?;
        Ok(())
    }

    /// Visible text of the first element matching `selector`, waiting up to
    /// `timeout_ms` for it to appear. `Ok(None)` when nothing matched in time.
    pub async fn inner_text(&self, selector: &str, timeout_ms: u64) -> Result<Option<String>> {
        let resp = self
            .post(
                "text",
                serde_json::json!({ "selector": selector, "timeout_ms": timeout_ms }),
            )
            .await?;
        let body: TextResponse = resp.json().await?;
        Ok(body.text)
    }

    /// Scroll the page by `dy` pixels.
    pub async fn scroll(&self, dy: i64) -> Result<()> {
        self.post("scroll", serde_json::json!({ "dy": dy })).await?;
        Ok(())
    }

    /// All anchor hrefs on the page whose URL contains `pattern`, in DOM
    /// order, duplicates included.
    pub async fn links(&self, pattern: &str) -> Result<Vec<String>> {
        let resp = self
            .post("links", serde_json::json!({ "pattern": pattern }))
            .await?;
        let body: LinksResponse = resp.json().await?;
        Ok(body.links)
    }

    /// Current page URL (interstitial detection during readiness waits).
    pub async fn current_url(&self) -> Result<String> {
        let resp = self
            .client
            .get(self.endpoint("url"))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PageDriverError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body: UrlResponse = resp.json().await?;
        Ok(body.url)
    }
}
