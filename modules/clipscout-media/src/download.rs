//! Resolver-endpoint video download.
//!
//! Each resolver endpoint takes a video page URL and answers JSON with a
//! playable media URL. Endpoints are tried in order; every transport or
//! parse failure is swallowed and the next endpoint tried, so the caller
//! only ever sees "a file" or "no media".

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Resolve a playable media URL for `page_url` and stream it to `dest`.
/// `None` when every endpoint failed; the caller degrades media-dependent
/// signals to their defaults. Never returns an error.
pub async fn download_video(
    client: &reqwest::Client,
    endpoints: &[String],
    page_url: &str,
    dest: &Path,
) -> Option<PathBuf> {
    for endpoint in endpoints {
        let api_url = format!("{endpoint}{page_url}");
        match try_endpoint(client, &api_url, dest).await {
            Ok(()) => return Some(dest.to_path_buf()),
            Err(reason) => {
                debug!(endpoint, %reason, "resolver endpoint failed, trying next");
                // drop any partial write before the next attempt
                let _ = tokio::fs::remove_file(dest).await;
            }
        }
    }
    None
}

async fn try_endpoint(
    client: &reqwest::Client,
    api_url: &str,
    dest: &Path,
) -> Result<(), String> {
    let resp = client.get(api_url).send().await.map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("status {}", resp.status()));
    }

    let body: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
    let play = playable_url(&body).ok_or("no playable media url in response")?;

    let media = client.get(play).send().await.map_err(|e| e.to_string())?;
    if !media.status().is_success() {
        return Err(format!("media status {}", media.status()));
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| e.to_string())?;
    let mut stream = media.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        file.write_all(&chunk).await.map_err(|e| e.to_string())?;
    }
    file.flush().await.map_err(|e| e.to_string())?;
    Ok(())
}

/// Resolver responses are `{"data": {"play": "..."}}`, with a top-level
/// `"play"` fallback for older endpoints.
fn playable_url(body: &serde_json::Value) -> Option<&str> {
    body.pointer("/data/play")
        .or_else(|| body.get("play"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}
