pub mod config;
pub mod outcome;
pub mod text;
pub mod types;

pub use config::Config;
pub use outcome::Extraction;
pub use text::clean_text;
pub use types::{SourceType, VideoRecord, ANALYZED_COLUMNS, RAW_COLUMNS};
