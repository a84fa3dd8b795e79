use super::error::ToolError;
use super::types::MediaFile;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Input list for ffmpeg's concat demuxer.
///
/// The file lives in the temp directory and is removed when the value is
/// dropped, whatever happened in between.
#[derive(Debug)]
pub struct ConcatManifest {
    path: PathBuf,
}

impl ConcatManifest {
    /// Write a manifest for `files` (in the given order) to the system temp dir
    pub fn create(files: &[MediaFile]) -> Result<Self, ToolError> {
        Self::create_in(&std::env::temp_dir(), files)
    }

    pub fn create_in(dir: &Path, files: &[MediaFile]) -> Result<Self, ToolError> {
        let manifest = Self {
            path: dir.join(format!("vidtools-concat-{}.txt", Uuid::new_v4())),
        };
        fs::write(&manifest.path, Self::render(files)).map_err(|e| {
            ToolError::io(
                format!("Failed to write concat list {}", manifest.path.display()),
                e,
            )
        })?;
        debug!(
            "Wrote concat list with {} entries to {}",
            files.len(),
            manifest.path.display()
        );
        Ok(manifest)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One `file '<path>'` line per input
    pub fn render(files: &[MediaFile]) -> String {
        files
            .iter()
            .map(|f| format!("{}\n", concat_entry(f.path())))
            .collect()
    }
}

impl Drop for ConcatManifest {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed concat list {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove concat list {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Quote a path for the concat demuxer; `'` becomes `'\''`
pub fn concat_entry(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', r"'\''");
    format!("file '{}'", escaped)
}
