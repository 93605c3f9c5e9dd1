use std::env;

/// Process-level configuration loaded from environment variables.
/// Per-run options (mode, query, limit, analyze, headless, out csv) come from
/// the CLI instead.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the page-automation sidecar.
    pub pagedriver_url: String,
    pub pagedriver_token: Option<String>,

    /// Ordered resolver endpoints tried for each video page URL. Each entry
    /// is a prefix the page URL is appended to.
    pub resolver_endpoints: Vec<String>,

    /// External transcriber invoked as `<cmd> <video_path> <out_path>`.
    /// Whitespace-separated so interpreters with a script argument work.
    pub transcriber_cmd: Vec<String>,

    /// OCR binary and language list for overlay text.
    pub ocr_cmd: String,
    pub ocr_langs: String,

    /// ONNX model paths for the face/emotion analyzer.
    pub face_detector_model: String,
    pub face_emotion_model: String,

    /// Directory holding the risk classifier (model.onnx, tokenizer.json,
    /// config.json).
    pub risk_model_dir: String,
    pub risk_batch_size: usize,
    /// Explicit risk-class index. When set, label-name resolution is skipped
    /// entirely; use this when the model's label convention is known to
    /// differ from the usual positive-class names.
    pub risk_class_index: Option<usize>,

    /// Durable raw store path.
    pub raw_store_path: String,

    /// Page readiness wait budget, seconds.
    pub ready_timeout_secs: u64,
    /// Per-selector caption wait, milliseconds.
    pub caption_wait_ms: u64,

    /// Directory for per-video temporary media files.
    pub work_dir: String,
}

impl Config {
    /// Load configuration from environment variables. Every variable has a
    /// default when unset; a set-but-malformed value fails loudly at startup.
    pub fn from_env() -> Self {
        Self {
            pagedriver_url: env_or("CLIPSCOUT_PAGEDRIVER_URL", "http://localhost:4444"),
            pagedriver_token: env::var("CLIPSCOUT_PAGEDRIVER_TOKEN").ok(),
            resolver_endpoints: env::var("CLIPSCOUT_RESOLVER_ENDPOINTS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    vec![
                        "https://tikwm.com/api/?url=".to_string(),
                        "https://api.vvmd.cc/tk/?url=".to_string(),
                    ]
                }),
            transcriber_cmd: env_or("CLIPSCOUT_TRANSCRIBER_CMD", "clipscout-transcribe")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            ocr_cmd: env_or("CLIPSCOUT_OCR_CMD", "tesseract"),
            ocr_langs: env_or("CLIPSCOUT_OCR_LANGS", "eng"),
            face_detector_model: env_or(
                "CLIPSCOUT_FACE_DETECTOR_MODEL",
                "models/face_detector.onnx",
            ),
            face_emotion_model: env_or("CLIPSCOUT_FACE_EMOTION_MODEL", "models/face_emotion.onnx"),
            risk_model_dir: env_or("CLIPSCOUT_RISK_MODEL_DIR", "risk_model"),
            risk_batch_size: env_parsed("CLIPSCOUT_RISK_BATCH_SIZE", 16),
            risk_class_index: env::var("CLIPSCOUT_RISK_CLASS_INDEX")
                .ok()
                .map(|v| v.parse().expect("CLIPSCOUT_RISK_CLASS_INDEX must be an integer")),
            raw_store_path: env_or("CLIPSCOUT_RAW_STORE", "clipscout_raw.csv"),
            ready_timeout_secs: env_parsed("CLIPSCOUT_READY_TIMEOUT_SECS", 180),
            caption_wait_ms: env_parsed("CLIPSCOUT_CAPTION_WAIT_MS", 12_000),
            work_dir: env_or("CLIPSCOUT_WORK_DIR", "."),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
