use super::error::ToolError;
use super::types::{MediaFile, SequenceNumber};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Container extensions accepted by the video tools
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "mkv", "avi", "m4v", "webm", "mpg", "mpeg", "mts", "m2ts", "ts",
];

/// Still image extensions accepted by img2vid
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Clip numbering: a leading zero followed by at least three digits (0001, 0420, ...)
pub const CLIP_SEQUENCE_PATTERN: &str = r"0\d{3,}";

/// Frame numbering: any run of four or more digits
pub const FRAME_SEQUENCE_PATTERN: &str = r"\d{4,}";

/// Compiled pattern that locates the sequence number inside a file stem.
#[derive(Debug, Clone)]
pub struct SequencePattern(Regex);

impl SequencePattern {
    pub fn new(pattern: &str) -> Result<Self, ToolError> {
        Regex::new(pattern).map(Self).map_err(|e| {
            ToolError::InvalidInput(format!("Invalid sequence pattern '{}': {}", pattern, e))
        })
    }

    /// Number carried by the last match in `stem`, if any. Matches that are
    /// not plain digits carry no number.
    pub fn last_tag(&self, stem: &str) -> Option<SequenceNumber> {
        self.0
            .find_iter(stem)
            .last()
            .and_then(|m| SequenceNumber::from_digits(m.as_str()))
    }
}

/// What a catalog scan keeps: allowed extensions plus the numbering pattern.
#[derive(Debug, Clone)]
pub struct CatalogSpec {
    pub extensions: Vec<String>,
    pub pattern: SequencePattern,
}

impl CatalogSpec {
    pub fn new<S: AsRef<str>>(extensions: &[S], pattern: &str) -> Result<Self, ToolError> {
        Ok(Self {
            extensions: normalize_extensions(extensions),
            pattern: SequencePattern::new(pattern)?,
        })
    }

    pub fn clips() -> Self {
        Self {
            extensions: normalize_extensions(VIDEO_EXTENSIONS),
            pattern: SequencePattern(
                Regex::new(CLIP_SEQUENCE_PATTERN).expect("clip pattern is valid"),
            ),
        }
    }

    pub fn frames() -> Self {
        Self {
            extensions: normalize_extensions(IMAGE_EXTENSIONS),
            pattern: SequencePattern(
                Regex::new(FRAME_SEQUENCE_PATTERN).expect("frame pattern is valid"),
            ),
        }
    }
}

/// Lowercase and strip leading dots so `.MP4` and `mp4` compare equal
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Check if a path carries one of the allowed extensions (case-insensitive)
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Resolve a folder argument to an absolute directory path
pub fn resolve_folder(folder: &Path) -> Result<PathBuf, ToolError> {
    let missing = || {
        ToolError::InvalidInput(format!(
            "Input folder '{}' does not exist or is not a directory.",
            folder.display()
        ))
    };
    let resolved = fs::canonicalize(folder).map_err(|_| missing())?;
    if !resolved.is_dir() {
        return Err(missing());
    }
    Ok(resolved)
}

/// List the regular files directly inside `folder` that carry an allowed
/// extension, sorted by file name. Subdirectories are not descended into.
pub fn list_files(folder: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, ToolError> {
    let root = resolve_folder(folder)?;
    Ok(list_resolved(&root, extensions))
}

fn list_resolved(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// Catalog the numbered files in `folder`.
///
/// Files whose stem carries no sequence number are left out. The result is
/// ordered by (sequence number, file name), which fixes the concatenation
/// order. An empty result is reported as `NoMatchingFiles`.
pub fn scan(folder: &Path, spec: &CatalogSpec) -> Result<Vec<MediaFile>, ToolError> {
    let root = resolve_folder(folder)?;
    let mut files = Vec::new();

    for path in list_resolved(&root, &spec.extensions) {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match spec.pattern.last_tag(&stem) {
            Some(sequence) => files.push(MediaFile::tagged(path, sequence)),
            None => debug!("Info: skipping {} (no sequence number)", path.display()),
        }
    }

    if files.is_empty() {
        return Err(ToolError::NoMatchingFiles { folder: root });
    }

    files.sort_by(|a, b| {
        a.sequence
            .cmp(&b.sequence)
            .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
    });
    Ok(files)
}
