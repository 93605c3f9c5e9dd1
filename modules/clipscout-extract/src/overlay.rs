//! Overlay text: OCR over sampled frames with cross-frame repetition
//! filtering, so persistent on-screen captions and watermarks survive while
//! one-off OCR noise is dropped.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use clipscout_common::Extraction;
use clipscout_media::sample_positions;

use crate::frames::FrameSource;
use crate::ocr::OcrEngine;

/// Relative positions sampled for overlay text.
pub const OVERLAY_SAMPLE_FRACTIONS: &[f64] = &[0.2, 0.5, 0.8];

/// Minimum fragment length after trimming, exclusive.
const MIN_FRAGMENT_LEN: usize = 3;

/// A fragment must appear in at least this many distinct sampled frames.
const MIN_FRAME_RECURRENCE: u32 = 2;

pub async fn extract_overlay_text(
    frames: &dyn FrameSource,
    ocr: &dyn OcrEngine,
) -> Extraction<String> {
    let frame_count = match frames.frame_count().await {
        Ok(0) => return Extraction::degraded(String::new(), "no decodable frames"),
        Ok(n) => n,
        Err(e) => return Extraction::degraded(String::new(), format!("probe failed: {e}")),
    };

    let positions = sample_positions(frame_count, OVERLAY_SAMPLE_FRACTIONS);

    // Count distinct frames each fragment appears in, keeping first-seen order.
    let mut frame_counts: HashMap<String, u32> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    let mut frames_read = 0u32;

    for index in positions {
        let frame = match frames.rgb_frame(index).await {
            Ok(f) => f,
            Err(e) => {
                debug!(index, error = %e, "overlay frame decode failed, skipping");
                continue;
            }
        };

        let fragments = match ocr.read_text(&frame).await {
            Ok(f) => f,
            Err(e) => {
                debug!(index, error = %e, "OCR failed on sampled frame, skipping");
                continue;
            }
        };
        frames_read += 1;

        // Walk fragments in OCR output order so first_seen reflects first
        // distinct appearance; the per-frame set only stops a fragment from
        // corroborating itself within one frame.
        let mut in_this_frame: HashSet<String> = HashSet::new();
        for fragment in &fragments {
            let fragment = fragment.trim().to_lowercase();
            if fragment.chars().count() <= MIN_FRAGMENT_LEN {
                continue;
            }
            if !in_this_frame.insert(fragment.clone()) {
                continue;
            }
            let count = frame_counts.entry(fragment.clone()).or_insert(0);
            if *count == 0 {
                first_seen.push(fragment);
            }
            *count += 1;
        }
    }

    if frames_read == 0 {
        return Extraction::degraded(String::new(), "OCR failed on every sampled frame");
    }

    let repeated: Vec<String> = first_seen
        .into_iter()
        .filter(|t| frame_counts[t] >= MIN_FRAME_RECURRENCE)
        .collect();

    Extraction::Ok(repeated.join(" "))
}
