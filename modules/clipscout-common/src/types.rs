use serde::{Deserialize, Serialize};

/// Where a video was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Hashtag,
    User,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Hashtag => write!(f, "hashtag"),
            SourceType::User => write!(f, "user"),
        }
    }
}

/// One row per video. `video_url` is the unique key across the whole store.
/// Absent signals are serialized as empty cells, never as missing columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub source_type: SourceType,
    pub source_value: String,
    pub video_url: String,
    pub caption_raw: String,
    pub transcript_raw: String,
    pub overlay_text_raw: String,
    pub face_detected: bool,
    pub face_dominant_emotion: Option<String>,
    pub face_emotion_score: f64,
    pub visual_brightness: Option<f64>,
    pub visual_blur: Option<f64>,
    pub caption_risk: Option<f64>,
    pub overlay_risk: Option<f64>,
    pub transcript_risk: Option<f64>,
}

/// Columns written on first raw-store creation, in order. Risk columns are
/// only present in the analyzed snapshot.
pub const RAW_COLUMNS: &[&str] = &[
    "source_type",
    "source_value",
    "video_url",
    "caption_raw",
    "transcript_raw",
    "overlay_text_raw",
    "face_detected",
    "face_dominant_emotion",
    "face_emotion_score",
    "visual_brightness",
    "visual_blur",
];

/// Columns of the analyzed snapshot, in order.
pub const ANALYZED_COLUMNS: &[&str] = &[
    "source_type",
    "source_value",
    "video_url",
    "caption_raw",
    "transcript_raw",
    "overlay_text_raw",
    "face_detected",
    "face_dominant_emotion",
    "face_emotion_score",
    "visual_brightness",
    "visual_blur",
    "caption_risk",
    "overlay_risk",
    "transcript_risk",
];

impl VideoRecord {
    /// Cell value for a named column. Unknown columns (e.g. columns that only
    /// exist in an older store schema) resolve to the empty marker so appends
    /// stay aligned with the existing header.
    pub fn cell(&self, column: &str) -> String {
        match column {
            "source_type" => self.source_type.to_string(),
            "source_value" => self.source_value.clone(),
            "video_url" => self.video_url.clone(),
            "caption_raw" => self.caption_raw.clone(),
            "transcript_raw" => self.transcript_raw.clone(),
            "overlay_text_raw" => self.overlay_text_raw.clone(),
            "face_detected" => self.face_detected.to_string(),
            "face_dominant_emotion" => self.face_dominant_emotion.clone().unwrap_or_default(),
            "face_emotion_score" => format_float(self.face_emotion_score),
            "visual_brightness" => self.visual_brightness.map(format_float).unwrap_or_default(),
            "visual_blur" => self.visual_blur.map(format_float).unwrap_or_default(),
            "caption_risk" => self.caption_risk.map(format_float).unwrap_or_default(),
            "overlay_risk" => self.overlay_risk.map(format_float).unwrap_or_default(),
            "transcript_risk" => self.transcript_risk.map(format_float).unwrap_or_default(),
            _ => String::new(),
        }
    }
}

fn format_float(v: f64) -> String {
    // Trailing-zero-free, so 42.50 prints as 42.5 and 0.0 as 0
    format!("{v}")
}
