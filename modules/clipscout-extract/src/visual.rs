//! Visual atmosphere: mean brightness and Laplacian-variance blur over every
//! decodable frame, streamed so whole-clip passes stay at one frame of
//! memory.

use std::path::Path;

use clipscout_common::Extraction;
use clipscout_media::{probe_video, GrayFrame, GrayFrames};

/// Whole-clip brightness/blur aggregate. Both absent when no frame decoded;
/// zero is a valid reading and never stands in for absence.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSignal {
    pub brightness: Option<f64>,
    pub blur: Option<f64>,
}

impl VisualSignal {
    pub fn absent() -> Self {
        Self {
            brightness: None,
            blur: None,
        }
    }
}

pub async fn extract_visual(video: &Path) -> Extraction<VisualSignal> {
    let info = match probe_video(video).await {
        Ok(i) => i,
        Err(e) => return Extraction::degraded(VisualSignal::absent(), format!("probe failed: {e}")),
    };

    let mut frames = match GrayFrames::open(video, info.width, info.height) {
        Ok(f) => f,
        Err(e) => {
            return Extraction::degraded(VisualSignal::absent(), format!("decode failed: {e}"))
        }
    };

    let mut brightness_sum = 0.0;
    let mut blur_sum = 0.0;
    let mut count = 0u64;

    loop {
        match frames.next_frame().await {
            Ok(Some(frame)) => {
                brightness_sum += frame_mean(&frame);
                blur_sum += laplacian_variance(&frame);
                count += 1;
            }
            Ok(None) => break,
            Err(e) => {
                return Extraction::degraded(
                    VisualSignal::absent(),
                    format!("frame stream failed: {e}"),
                )
            }
        }
    }

    if count == 0 {
        return Extraction::degraded(VisualSignal::absent(), "no decodable frames");
    }

    Extraction::Ok(VisualSignal {
        brightness: Some(round2(brightness_sum / count as f64)),
        blur: Some(round2(blur_sum / count as f64)),
    })
}

/// Mean grayscale intensity of one frame.
pub fn frame_mean(frame: &GrayFrame) -> f64 {
    if frame.pixels.is_empty() {
        return 0.0;
    }
    let sum: u64 = frame.pixels.iter().map(|&p| p as u64).sum();
    sum as f64 / frame.pixels.len() as f64
}

/// Population variance of the 4-neighbor Laplacian over interior pixels.
/// Sharp frames have high variance; blurry frames low.
pub fn laplacian_variance(frame: &GrayFrame) -> f64 {
    let w = frame.width as usize;
    let h = frame.height as usize;
    if w < 3 || h < 3 {
        return 0.0;
    }

    let px = |x: usize, y: usize| frame.pixels[y * w + x] as f64;

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut n = 0u64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = px(x, y - 1) + px(x, y + 1) + px(x - 1, y) + px(x + 1, y) - 4.0 * px(x, y);
            sum += lap;
            sum_sq += lap * lap;
            n += 1;
        }
    }

    let mean = sum / n as f64;
    sum_sq / n as f64 - mean * mean
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
