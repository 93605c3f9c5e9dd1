pub mod assemble;
pub mod caption;
pub mod face;
pub mod frames;
pub mod ocr;
pub mod overlay;
pub mod page;
pub mod transcript;
pub mod visual;

pub use assemble::{assemble_record, ExtractorSet, FeatureSet};
pub use caption::{extract_caption, DEFAULT_CAPTION_SELECTORS};
pub use face::{extract_face, EmotionReading, FaceAnalyzer, FaceSignal, OnnxFaceAnalyzer};
pub use frames::{FrameSource, MediaFrames};
pub use ocr::{OcrEngine, TesseractOcr};
pub use overlay::extract_overlay_text;
pub use page::PageDriver;
pub use transcript::Transcriber;
pub use visual::{extract_visual, VisualSignal};
