//! Scoped temporary media paths.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// A reserved temporary file path deleted on drop.
///
/// One handle is acquired per video at the start of its pipeline and dropped
/// at the end, so the downloaded media (and transcript side files) are
/// released exactly once on every exit path, including degraded ones. The
/// file may never be created; drop ignores that.
#[derive(Debug)]
pub struct TempMedia {
    path: PathBuf,
}

impl TempMedia {
    /// Reserve a uniquely named path under `dir`, e.g. `v_<id>.mp4`.
    pub fn reserve(dir: &Path, prefix: &str, ext: &str) -> Self {
        let name = format!("{prefix}{}.{ext}", Uuid::new_v4().simple());
        Self {
            path: dir.join(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let kept;
        {
            let media = TempMedia::reserve(dir.path(), "v_", "mp4");
            kept = media.path().to_path_buf();
            std::fs::write(media.path(), b"data").unwrap();
            assert!(kept.exists());
        }
        assert!(!kept.exists());
    }

    #[test]
    fn drop_tolerates_a_file_never_created() {
        let dir = tempfile::tempdir().unwrap();
        let media = TempMedia::reserve(dir.path(), "v_", "mp4");
        assert!(!media.path().exists());
        drop(media);
    }

    #[test]
    fn reserved_paths_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempMedia::reserve(dir.path(), "v_", "mp4");
        let b = TempMedia::reserve(dir.path(), "v_", "mp4");
        assert_ne!(a.path(), b.path());
    }
}
