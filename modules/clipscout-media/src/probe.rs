//! FFprobe video information.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Video stream facts needed for frame sampling.
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    /// Total decodable frames (packet count of the first video stream).
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    nb_read_packets: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a video file. Frame count is derived from packet count, which is
/// exact for the short clips this pipeline handles.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_packets",
            "-show_entries",
            "stream=nb_read_packets,width,height",
            "-print_format",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MediaError::FfprobeFailed {
            message: "no video stream".to_string(),
        })?;

    let frame_count = stream
        .nb_read_packets
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Ok(VideoInfo {
        frame_count,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}

/// Absolute frame indices for relative positions in the clip, e.g.
/// `&[0.2, 0.5, 0.8]` of a 100-frame clip yields `[20, 50, 80]`.
pub fn sample_positions(frame_count: u64, fractions: &[f64]) -> Vec<u64> {
    fractions
        .iter()
        .map(|f| ((frame_count as f64) * f) as u64)
        .collect()
}
