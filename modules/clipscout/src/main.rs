use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use image::RgbImage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clipscout::{Harvester, HarvestRequest};
use clipscout_common::{Config, SourceType};
use clipscout_extract::{
    EmotionReading, ExtractorSet, FaceAnalyzer, OnnxFaceAnalyzer, TesseractOcr, Transcriber,
    DEFAULT_CAPTION_SELECTORS,
};
use clipscout_risk::RiskScorer;
use clipscout_store::RawStore;
use pagedriver_client::PageDriverClient;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Hashtag,
    User,
}

impl From<Mode> for SourceType {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Hashtag => SourceType::Hashtag,
            Mode::User => SourceType::User,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "clipscout", about = "Harvest short-form videos and score their text for risk")]
struct Cli {
    /// Whether to collect from a hashtag page or a creator profile.
    #[arg(long, value_enum)]
    mode: Mode,

    /// Hashtag name (without '#') or username (without '@').
    #[arg(long)]
    query: String,

    /// Maximum number of videos to process.
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// Run the risk-scoring pass and write the analyzed snapshot (0 or 1).
    #[arg(long, default_value_t = 1)]
    analyze: u8,

    /// Run the browser headless (0 or 1).
    #[arg(long, default_value_t = 0)]
    headless: u8,

    /// Analyzed snapshot path.
    #[arg(long = "out_csv", default_value = "clipscout_analyzed.csv")]
    out_csv: PathBuf,
}

/// Stands in when the face models are not on disk: every frame reads as
/// faceless, so runs stay usable without the ONNX assets.
struct DisabledFaceAnalyzer;

impl FaceAnalyzer for DisabledFaceAnalyzer {
    fn analyze(&self, _frame: &RgbImage) -> Result<Option<EmotionReading>> {
        Ok(None)
    }
}

fn face_analyzer(config: &Config) -> Box<dyn FaceAnalyzer> {
    match OnnxFaceAnalyzer::new(
        Path::new(&config.face_detector_model),
        Path::new(&config.face_emotion_model),
    ) {
        Ok(analyzer) => Box::new(analyzer),
        Err(e) => {
            warn!(error = %e, "face models unavailable, face signals disabled");
            Box::new(DisabledFaceAnalyzer)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("clipscout=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    info!(
        mode = ?cli.mode,
        query = %cli.query,
        limit = cli.limit,
        "clipscout starting"
    );

    let page = PageDriverClient::new(&config.pagedriver_url, config.pagedriver_token.as_deref());
    page.start_session(cli.headless != 0).await?;

    let work_dir = PathBuf::from(&config.work_dir);
    let extractors = ExtractorSet {
        http: reqwest::Client::new(),
        resolver_endpoints: config.resolver_endpoints.clone(),
        transcriber: Transcriber::new(config.transcriber_cmd.clone(), &work_dir),
        ocr: Box::new(TesseractOcr::new(&config.ocr_cmd, &config.ocr_langs)),
        face: face_analyzer(&config),
        caption_selectors: DEFAULT_CAPTION_SELECTORS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        caption_wait_ms: config.caption_wait_ms,
        work_dir,
    };

    let harvester = Harvester {
        page: &page,
        extractors,
        raw_store: RawStore::new(&config.raw_store_path),
        scorer: RiskScorer::new(
            PathBuf::from(&config.risk_model_dir),
            config.risk_class_index,
            config.risk_batch_size,
        ),
        snapshot_path: cli.out_csv.clone(),
        ready_timeout_secs: config.ready_timeout_secs,
    };

    let request = HarvestRequest {
        source_type: cli.mode.into(),
        query: cli.query.clone(),
        limit: cli.limit,
        analyze: cli.analyze != 0,
    };

    let stats = harvester.run(&request).await?;
    println!("{stats}");
    Ok(())
}
