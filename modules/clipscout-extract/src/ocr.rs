//! OCR seam for overlay-text recovery.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use image::RgbImage;
use tokio::process::Command;

use clipscout_media::TempMedia;

/// Reads text regions out of a single frame. Implementations return one
/// string per detected region/line; the overlay extractor does the
/// normalization and cross-frame filtering.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn read_text(&self, frame: &RgbImage) -> Result<Vec<String>>;
}

/// Tesseract CLI engine. The frame is written to a scoped temp PNG and read
/// back from tesseract's stdout, one fragment per non-empty line.
pub struct TesseractOcr {
    binary: String,
    languages: String,
}

impl TesseractOcr {
    pub fn new(binary: &str, languages: &str) -> Self {
        Self {
            binary: binary.to_string(),
            languages: languages.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn read_text(&self, frame: &RgbImage) -> Result<Vec<String>> {
        which::which(&self.binary)
            .with_context(|| format!("{} not found in PATH", self.binary))?;

        let png = TempMedia::reserve(&std::env::temp_dir(), "ocr_", "png");
        frame
            .save(png.path())
            .context("Failed to write OCR input frame")?;

        let output = Command::new(&self.binary)
            .arg(png.path())
            .args(["stdout", "-l", &self.languages, "--psm", "6"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .context("Failed to run OCR binary")?;

        if !output.status.success() {
            bail!("OCR exited with {}", output.status);
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}
