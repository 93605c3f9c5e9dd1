//! Sampled frame access behind a seam, so the frame-sampling extractors run
//! against synthetic frames in tests.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::OnceCell;

use clipscout_media::{decode_frame, probe_video, VideoInfo};

#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Total decodable frames.
    async fn frame_count(&self) -> Result<u64>;

    /// Decoded RGB frame at an absolute index.
    async fn rgb_frame(&self, index: u64) -> Result<RgbImage>;
}

/// Frame source over a downloaded media file. The probe result is cached so
/// the overlay and face extractors share one ffprobe run.
pub struct MediaFrames {
    video: PathBuf,
    info: OnceCell<VideoInfo>,
}

impl MediaFrames {
    pub fn new(video: &Path) -> Self {
        Self {
            video: video.to_path_buf(),
            info: OnceCell::new(),
        }
    }

    pub async fn info(&self) -> Result<&VideoInfo> {
        Ok(self
            .info
            .get_or_try_init(|| probe_video(&self.video))
            .await?)
    }
}

#[async_trait]
impl FrameSource for MediaFrames {
    async fn frame_count(&self) -> Result<u64> {
        Ok(self.info().await?.frame_count)
    }

    async fn rgb_frame(&self, index: u64) -> Result<RgbImage> {
        Ok(decode_frame(&self.video, index).await?)
    }
}
