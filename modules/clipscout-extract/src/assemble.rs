//! Per-video record assembly.
//!
//! Runs every extractor in fixed order (caption → download → transcript →
//! overlay → face → visual) so the downloaded media is on disk before any
//! media-dependent extractor runs, and is deleted exactly once when the
//! scoped handle drops, on every exit path. Individual extractor failures
//! degrade to defaults; this function never fails a video.

use std::path::PathBuf;

use tracing::debug;

use clipscout_common::{Extraction, SourceType, VideoRecord};
use clipscout_media::{download_video, TempMedia};

use crate::caption::extract_caption;
use crate::face::{extract_face, FaceAnalyzer, FaceSignal};
use crate::frames::MediaFrames;
use crate::ocr::OcrEngine;
use crate::overlay::extract_overlay_text;
use crate::page::PageDriver;
use crate::transcript::Transcriber;
use crate::visual::{extract_visual, VisualSignal};

/// Everything the per-video pipeline needs besides the page.
pub struct ExtractorSet {
    pub http: reqwest::Client,
    pub resolver_endpoints: Vec<String>,
    pub transcriber: Transcriber,
    pub ocr: Box<dyn OcrEngine>,
    pub face: Box<dyn FaceAnalyzer>,
    pub caption_selectors: Vec<String>,
    pub caption_wait_ms: u64,
    pub work_dir: PathBuf,
}

/// Transient bundle of extractor outcomes, merged into one flat record and
/// then discarded.
pub struct FeatureSet {
    pub caption: Extraction<String>,
    pub transcript: Extraction<String>,
    pub overlay: Extraction<String>,
    pub face: Extraction<FaceSignal>,
    pub visual: Extraction<VisualSignal>,
}

impl FeatureSet {
    pub fn merge(self, source_type: SourceType, source_value: &str, url: &str) -> VideoRecord {
        let face = self.face.into_value();
        let visual = self.visual.into_value();
        VideoRecord {
            source_type,
            source_value: source_value.to_string(),
            video_url: url.to_string(),
            caption_raw: self.caption.into_value(),
            transcript_raw: self.transcript.into_value(),
            overlay_text_raw: self.overlay.into_value(),
            face_detected: face.detected,
            face_dominant_emotion: face.dominant_emotion,
            face_emotion_score: face.score,
            visual_brightness: visual.brightness,
            visual_blur: visual.blur,
            caption_risk: None,
            overlay_risk: None,
            transcript_risk: None,
        }
    }
}

/// Extract all signals for one already-navigated video page.
pub async fn assemble_record(
    page: &dyn PageDriver,
    set: &ExtractorSet,
    source_type: SourceType,
    source_value: &str,
    url: &str,
) -> VideoRecord {
    let caption = extract_caption(page, &set.caption_selectors, set.caption_wait_ms).await;
    note(url, "caption", &caption);

    // media lives exactly as long as this handle
    let media = TempMedia::reserve(&set.work_dir, "v_", "mp4");
    let video_path = download_video(&set.http, &set.resolver_endpoints, url, media.path()).await;
    if video_path.is_none() {
        debug!(url, "no playable media resolved, media signals degrade");
    }

    let (transcript, overlay, face, visual) = match &video_path {
        Some(path) => {
            let transcript = set.transcriber.extract(path).await;
            let frames = MediaFrames::new(path);
            let overlay = extract_overlay_text(&frames, set.ocr.as_ref()).await;
            let face = extract_face(&frames, set.face.as_ref()).await;
            let visual = extract_visual(path).await;
            (transcript, overlay, face, visual)
        }
        None => (
            Extraction::degraded(String::new(), "no media"),
            Extraction::degraded(String::new(), "no media"),
            Extraction::degraded(FaceSignal::absent(), "no media"),
            Extraction::degraded(VisualSignal::absent(), "no media"),
        ),
    };
    note(url, "transcript", &transcript);
    note(url, "overlay", &overlay);
    note(url, "face", &face);
    note(url, "visual", &visual);

    let features = FeatureSet {
        caption,
        transcript,
        overlay,
        face,
        visual,
    };
    features.merge(source_type, source_value, url)
}

fn note<T>(url: &str, signal: &str, outcome: &Extraction<T>) {
    if let Some(reason) = outcome.reason() {
        debug!(url, signal, reason, "signal degraded to default");
    }
}
