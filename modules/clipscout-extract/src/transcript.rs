//! Spoken transcript via an out-of-process speech-to-text tool.
//!
//! The clip's audio track is first re-encoded to mono 16 kHz PCM, then the
//! tool is invoked as `<cmd> <wav_path> <out_path>` and is expected to write
//! plain UTF-8 text (possibly empty) to `out_path`. Both intermediates are
//! scoped temp paths, removed on every exit path.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use clipscout_common::{clean_text, Extraction};
use clipscout_media::{extract_wav_mono_16k, TempMedia};

pub struct Transcriber {
    cmd: Vec<String>,
    work_dir: PathBuf,
}

impl Transcriber {
    pub fn new(cmd: Vec<String>, work_dir: &Path) -> Self {
        Self {
            cmd,
            work_dir: work_dir.to_path_buf(),
        }
    }

    pub async fn extract(&self, video: &Path) -> Extraction<String> {
        let Some((program, args)) = self.cmd.split_first() else {
            return Extraction::degraded(String::new(), "no transcriber configured");
        };

        let wav = TempMedia::reserve(&self.work_dir, "_au_", "wav");
        if let Err(e) = extract_wav_mono_16k(video, wav.path()).await {
            return Extraction::degraded(String::new(), format!("audio re-encode failed: {e}"));
        }

        let out = TempMedia::reserve(&self.work_dir, "_tr_", "txt");

        let status = Command::new(program)
            .args(args)
            .arg(wav.path())
            .arg(out.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if !status.success() => {
                debug!(%status, "transcriber exited non-zero");
            }
            Err(e) => {
                return Extraction::degraded(
                    String::new(),
                    format!("transcriber failed to run: {e}"),
                );
            }
            _ => {}
        }

        // The tool writes the out file even on its own internal failures;
        // a missing file means it never got that far.
        match tokio::fs::read_to_string(out.path()).await {
            Ok(text) => Extraction::Ok(clean_text(&text)),
            Err(_) => Extraction::degraded(String::new(), "transcriber produced no output"),
        }
    }
}
