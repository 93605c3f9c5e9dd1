//! Face and emotion extraction over sampled frames.
//!
//! Frames are tried in fixed order; the first one with a detectable face
//! wins and the remaining samples are never decoded. "No face anywhere" is
//! a legitimate observation, not a degradation.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::debug;

use clipscout_common::Extraction;
use clipscout_media::sample_positions;

use crate::frames::FrameSource;

/// Relative positions sampled for face detection.
pub const FACE_SAMPLE_FRACTIONS: &[f64] = &[0.1, 0.3, 0.5, 0.7, 0.9];

/// Minimum detector confidence for a face box.
const FACE_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// FER+ emotion labels, in the model's output order.
const EMOTION_LABELS: &[&str] = &[
    "neutral",
    "happiness",
    "surprise",
    "sadness",
    "anger",
    "disgust",
    "fear",
    "contempt",
];

/// Dominant emotion of one detected face. `score` is the class probability
/// scaled to 0–100.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionReading {
    pub emotion: String,
    pub score: f64,
}

/// Per-video face signal, merged into the record as three columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSignal {
    pub detected: bool,
    pub dominant_emotion: Option<String>,
    pub score: f64,
}

impl FaceSignal {
    pub fn absent() -> Self {
        Self {
            detected: false,
            dominant_emotion: None,
            score: 0.0,
        }
    }
}

/// Face + emotion analysis of a single frame. `Ok(None)` means "no face in
/// this frame", which the extractor treats as "try the next sample".
pub trait FaceAnalyzer: Send + Sync {
    fn analyze(&self, frame: &RgbImage) -> Result<Option<EmotionReading>>;
}

pub async fn extract_face(
    frames: &dyn FrameSource,
    analyzer: &dyn FaceAnalyzer,
) -> Extraction<FaceSignal> {
    let frame_count = match frames.frame_count().await {
        Ok(0) => return Extraction::degraded(FaceSignal::absent(), "no decodable frames"),
        Ok(n) => n,
        Err(e) => {
            return Extraction::degraded(FaceSignal::absent(), format!("probe failed: {e}"))
        }
    };

    for index in sample_positions(frame_count, FACE_SAMPLE_FRACTIONS) {
        let frame = match frames.rgb_frame(index).await {
            Ok(f) => f,
            Err(e) => {
                debug!(index, error = %e, "face frame decode failed, skipping");
                continue;
            }
        };

        match analyzer.analyze(&frame) {
            Ok(Some(reading)) => {
                return Extraction::Ok(FaceSignal {
                    detected: true,
                    dominant_emotion: Some(reading.emotion),
                    score: round2(reading.score),
                });
            }
            Ok(None) => continue,
            Err(e) => {
                debug!(index, error = %e, "face analysis failed on frame, skipping");
                continue;
            }
        }
    }

    Extraction::Ok(FaceSignal::absent())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// ONNX-backed analyzer: face detector + FER+ emotion classifier
// ---------------------------------------------------------------------------

/// Two-stage ONNX analyzer: an UltraFace-style detector (320x240 input,
/// `scores`/`boxes` outputs with normalized corner coordinates) picks the
/// most confident face box, then a FER+ classifier (1x1x64x64 grayscale
/// input) names the dominant emotion of that crop.
pub struct OnnxFaceAnalyzer {
    detector: Mutex<Session>,
    emotion: Mutex<Session>,
    emotion_output: String,
}

impl OnnxFaceAnalyzer {
    pub fn new(detector_model: &Path, emotion_model: &Path) -> Result<Self> {
        let detector = load_session(detector_model)?;
        let emotion = load_session(emotion_model)?;
        let emotion_output = emotion
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| anyhow!("emotion model declares no outputs"))?;

        Ok(Self {
            detector: Mutex::new(detector),
            emotion: Mutex::new(emotion),
            emotion_output,
        })
    }

    /// Most confident face box in frame coordinates, if any.
    fn detect_face(&self, frame: &RgbImage) -> Result<Option<(u32, u32, u32, u32)>> {
        let resized = image::imageops::resize(frame, 320, 240, image::imageops::FilterType::Triangle);

        // HWC -> CHW, (x - 127) / 128 per the detector's training
        let mut chw = Vec::with_capacity(3 * 240 * 320);
        for c in 0..3 {
            for y in 0..240u32 {
                for x in 0..320u32 {
                    chw.push((resized.get_pixel(x, y)[c] as f32 - 127.0) / 128.0);
                }
            }
        }
        let input: Value = Tensor::from_array((vec![1usize, 3, 240, 320], chw.into_boxed_slice()))
            .map(Value::from)
            .context("detector input tensor")?;

        let mut session = self
            .detector
            .lock()
            .map_err(|_| anyhow!("detector session poisoned"))?;
        let outputs = session.run(ort::inputs![input]).context("detector run")?;

        let (_, scores) = outputs
            .get("scores")
            .ok_or_else(|| anyhow!("detector returned no scores output"))?
            .try_extract_tensor::<f32>()
            .context("extract scores")?;
        let (_, boxes) = outputs
            .get("boxes")
            .ok_or_else(|| anyhow!("detector returned no boxes output"))?
            .try_extract_tensor::<f32>()
            .context("extract boxes")?;

        // scores are (background, face) pairs per candidate box
        let candidates = scores.len() / 2;
        let mut best: Option<(f32, usize)> = None;
        for i in 0..candidates {
            let confidence = scores[2 * i + 1];
            if confidence >= FACE_CONFIDENCE_THRESHOLD
                && best.map_or(true, |(c, _)| confidence > c)
            {
                best = Some((confidence, i));
            }
        }

        let Some((_, i)) = best else { return Ok(None) };
        if boxes.len() < 4 * (i + 1) {
            return Ok(None);
        }

        let (fw, fh) = (frame.width() as f32, frame.height() as f32);
        let x1 = (boxes[4 * i].clamp(0.0, 1.0) * fw) as u32;
        let y1 = (boxes[4 * i + 1].clamp(0.0, 1.0) * fh) as u32;
        let x2 = (boxes[4 * i + 2].clamp(0.0, 1.0) * fw) as u32;
        let y2 = (boxes[4 * i + 3].clamp(0.0, 1.0) * fh) as u32;
        if x2 <= x1 + 1 || y2 <= y1 + 1 {
            return Ok(None);
        }
        Ok(Some((x1, y1, x2 - x1, y2 - y1)))
    }

    fn classify_emotion(&self, face: &image::GrayImage) -> Result<EmotionReading> {
        let resized =
            image::imageops::resize(face, 64, 64, image::imageops::FilterType::Triangle);

        // FER+ takes raw grayscale pixel values
        let data: Vec<f32> = resized.pixels().map(|p| p[0] as f32).collect();
        let input: Value = Tensor::from_array((vec![1usize, 1, 64, 64], data.into_boxed_slice()))
            .map(Value::from)
            .context("emotion input tensor")?;

        let mut session = self
            .emotion
            .lock()
            .map_err(|_| anyhow!("emotion session poisoned"))?;
        let outputs = session.run(ort::inputs![input]).context("emotion run")?;

        let (_, logits) = outputs
            .get(self.emotion_output.as_str())
            .ok_or_else(|| anyhow!("emotion model returned no output"))?
            .try_extract_tensor::<f32>()
            .context("extract emotion logits")?;

        let probs = softmax(logits);
        let (index, prob) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| anyhow!("empty emotion output"))?;

        let emotion = EMOTION_LABELS
            .get(index)
            .copied()
            .unwrap_or("unknown")
            .to_string();

        Ok(EmotionReading {
            emotion,
            score: prob as f64 * 100.0,
        })
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn analyze(&self, frame: &RgbImage) -> Result<Option<EmotionReading>> {
        let Some((x, y, w, h)) = self.detect_face(frame)? else {
            return Ok(None);
        };

        // expand the crop 10% on each side, clamped to the frame
        let pad_x = w / 10;
        let pad_y = h / 10;
        let cx = x.saturating_sub(pad_x);
        let cy = y.saturating_sub(pad_y);
        let cw = (w + 2 * pad_x).min(frame.width() - cx);
        let ch = (h + 2 * pad_y).min(frame.height() - cy);

        let crop = image::imageops::crop_imm(frame, cx, cy, cw, ch).to_image();
        let gray = image::imageops::grayscale(&crop);

        self.classify_emotion(&gray).map(Some)
    }
}

fn load_session(path: &Path) -> Result<Session> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read ONNX model {}", path.display()))?;
    Ok(Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_memory(&bytes)?)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    /// Frames numbered by their index; decoding past a cutoff fails, which
    /// must not matter once a face has been found.
    struct StubFrames {
        count: u64,
        fail_after: u64,
    }

    #[async_trait]
    impl FrameSource for StubFrames {
        async fn frame_count(&self) -> Result<u64> {
            Ok(self.count)
        }

        async fn rgb_frame(&self, index: u64) -> Result<RgbImage> {
            if index > self.fail_after {
                anyhow::bail!("decode failure at frame {index}");
            }
            let mut img = RgbImage::new(2, 2);
            img.get_pixel_mut(0, 0)[0] = index as u8;
            Ok(img)
        }
    }

    /// Sees a face only in the frame whose index matches `face_at`.
    struct StubAnalyzer {
        face_at: u8,
        calls: AtomicU32,
    }

    impl FaceAnalyzer for StubAnalyzer {
        fn analyze(&self, frame: &RgbImage) -> Result<Option<EmotionReading>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if frame.get_pixel(0, 0)[0] == self.face_at {
                Ok(Some(EmotionReading {
                    emotion: "happiness".to_string(),
                    score: 87.654,
                }))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn short_circuits_at_the_first_face_bearing_frame() {
        // 100 frames → samples at 10, 30, 50, 70, 90; face only at 50, and
        // frames after 50 cannot even be decoded.
        let frames = StubFrames {
            count: 100,
            fail_after: 50,
        };
        let analyzer = StubAnalyzer {
            face_at: 50,
            calls: AtomicU32::new(0),
        };

        let result = extract_face(&frames, &analyzer).await;
        let signal = result.into_value();
        assert!(signal.detected);
        assert_eq!(signal.dominant_emotion.as_deref(), Some("happiness"));
        assert_eq!(signal.score, 87.65);
        // only the 10/30/50 samples were analyzed
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_face_anywhere_is_a_valid_absent_observation() {
        let frames = StubFrames {
            count: 100,
            fail_after: u64::MAX,
        };
        let analyzer = StubAnalyzer {
            face_at: 255,
            calls: AtomicU32::new(0),
        };

        let result = extract_face(&frames, &analyzer).await;
        assert!(!result.is_degraded());
        assert_eq!(result.into_value(), FaceSignal::absent());
    }

    #[tokio::test]
    async fn zero_frames_degrades_to_absent() {
        let frames = StubFrames {
            count: 0,
            fail_after: u64::MAX,
        };
        let analyzer = StubAnalyzer {
            face_at: 0,
            calls: AtomicU32::new(0),
        };

        let result = extract_face(&frames, &analyzer).await;
        assert!(result.is_degraded());
        assert_eq!(result.into_value(), FaceSignal::absent());
    }

    #[test]
    fn softmax_sums_to_one_and_orders_by_logit() {
        let probs = softmax(&[1.0, 3.0, 0.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[1] > probs[0] && probs[0] > probs[2]);
    }
}
