//! Frame access via ffmpeg: single sampled frames as decoded images and a
//! streaming grayscale reader for whole-clip passes.

use std::path::Path;
use std::process::Stdio;

use image::RgbImage;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};

use crate::error::{MediaError, MediaResult};

fn require_ffmpeg() -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;
    Ok(())
}

/// Decode the frame at `index` to an RGB image via a PNG pipe.
pub async fn decode_frame(video: &Path, index: u64) -> MediaResult<RgbImage> {
    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }
    require_ffmpeg()?;

    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(video)
        .args([
            "-vf",
            // comma inside eq() must be escaped in a filtergraph
            &format!("select=eq(n\\,{index})"),
            "-vsync",
            "0",
            "-vframes",
            "1",
            "-f",
            "image2pipe",
            "-c:v",
            "png",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfmpegFailed {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    if output.stdout.is_empty() {
        return Err(MediaError::FrameDecode(format!(
            "frame {index} produced no image data"
        )));
    }

    let img = image::load_from_memory(&output.stdout)
        .map_err(|e| MediaError::FrameDecode(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// One grayscale frame from the streaming reader.
#[derive(Debug, Clone)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Streaming grayscale reader over every decodable frame of a clip.
/// Frames are pulled one at a time so whole-clip passes stay at one frame of
/// memory.
pub struct GrayFrames {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    finished: bool,
}

impl GrayFrames {
    /// Open a raw grayscale pipe over the clip. `width`/`height` come from
    /// [`crate::probe::probe_video`].
    pub fn open(video: &Path, width: u32, height: u32) -> MediaResult<Self> {
        if !video.exists() {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }
        if width == 0 || height == 0 {
            return Err(MediaError::FrameDecode(
                "zero-sized video stream".to_string(),
            ));
        }
        require_ffmpeg()?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(video)
            .args(["-f", "rawvideo", "-pix_fmt", "gray", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| MediaError::FfmpegFailed {
            message: "no stdout pipe".to_string(),
        })?;

        Ok(Self {
            child,
            stdout,
            width,
            height,
            finished: false,
        })
    }

    /// Next frame, or `None` once the stream ends.
    pub async fn next_frame(&mut self) -> MediaResult<Option<GrayFrame>> {
        if self.finished {
            return Ok(None);
        }

        let len = (self.width as usize) * (self.height as usize);
        let mut pixels = vec![0u8; len];

        match self.stdout.read_exact(&mut pixels).await {
            Ok(_) => Ok(Some(GrayFrame {
                width: self.width,
                height: self.height,
                pixels,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.finished = true;
                let _ = self.child.wait().await;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
