//! Single-file video tools and image sequences.
//!
//! Rotate and aspect work file by file, either into an output folder or in
//! place through a sibling temp file. img2vid turns a numbered image folder
//! into one video.

pub mod aspect;
pub mod img2vid;
pub mod rotate;

use crate::engine::core::{EncodeOutcome, ToolError, has_extension, list_files, resolve_folder};
use crate::engine::runner::Runner;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use aspect::{AspectRatio, AspectSettings, adjust_aspect_videos, build_aspect_args};
pub use img2vid::{
    Img2VidSettings, build_img2vid_args, format_framerate, img2vid_folder, link_sequence,
};
pub use rotate::{Rotation, RotateSettings, build_rotate_args, rotate_videos};

/// Where the per-file tools read from and write to
#[derive(Debug, Clone, Default)]
pub struct VideoInputs {
    pub folder: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    /// `None` overwrites each input in place
    pub output_dir: Option<PathBuf>,
}

/// One processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Folder videos (sorted by name) followed by explicit files, with
/// duplicates dropped in first-seen order.
pub fn collect_videos(
    inputs: &VideoInputs,
    extensions: &[String],
) -> Result<Vec<PathBuf>, ToolError> {
    if inputs.folder.is_none() && inputs.files.is_empty() {
        return Err(ToolError::InvalidInput(
            "Provide an input folder, at least one --video-file, or both.".to_string(),
        ));
    }

    let mut folder_videos = Vec::new();
    let mut input_dir = None;
    if let Some(folder) = &inputs.folder {
        let dir = resolve_folder(folder)?;
        folder_videos = list_files(&dir, extensions)?;
        input_dir = Some(dir);
    }

    let mut direct_videos = Vec::new();
    for file in &inputs.files {
        let resolved = fs::canonicalize(file)
            .ok()
            .filter(|p| p.is_file())
            .ok_or_else(|| {
                ToolError::InvalidInput(format!(
                    "Video file '{}' does not exist or is not a file.",
                    file.display()
                ))
            })?;
        if !has_extension(&resolved, extensions) {
            return Err(ToolError::InvalidInput(format!(
                "Video file '{}' does not have a supported extension.",
                resolved
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            )));
        }
        direct_videos.push(resolved);
    }

    let mut videos: Vec<PathBuf> = Vec::new();
    for video in folder_videos.into_iter().chain(direct_videos) {
        if !videos.contains(&video) {
            videos.push(video);
        }
    }

    if videos.is_empty() {
        return Err(match input_dir {
            Some(folder) => ToolError::NoMatchingFiles { folder },
            None => ToolError::InvalidInput(
                "No valid video files were provided via --video-file.".to_string(),
            ),
        });
    }
    Ok(videos)
}

/// `<output_dir>/<file name>`, or the source itself when writing in place
pub fn derive_target_path(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    match (output_dir, source.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => source.to_path_buf(),
    }
}

/// Sibling temp name used while overwriting: `clip.mp4` -> `clip.<marker>.mp4`
pub fn derive_temp_path(original: &Path, marker: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match original.extension() {
        Some(ext) => format!("{}.{}.{}", stem, marker, ext.to_string_lossy()),
        None => format!("{}.{}", stem, marker),
    };
    original.with_file_name(name)
}

/// Run every video through `build_args` (input, output) -> argv.
///
/// Stops at the first failure; files already processed stay processed.
pub(crate) fn process_videos<R, F>(
    runner: &R,
    videos: &[PathBuf],
    output_dir: Option<&Path>,
    temp_marker: &str,
    mut build_args: F,
) -> Result<Vec<FileReport>, ToolError>
where
    R: Runner + ?Sized,
    F: FnMut(&Path, &Path) -> Vec<String>,
{
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir).map_err(|e| {
            ToolError::io(format!("Failed to create output folder {}", dir.display()), e)
        })?;
    }

    let mut reports = Vec::with_capacity(videos.len());
    for video in videos {
        let final_target = derive_target_path(video, output_dir);
        let in_place = final_target == *video;
        let work_target = if in_place {
            derive_temp_path(video, temp_marker)
        } else {
            final_target.clone()
        };
        debug!("{} -> {}", video.display(), work_target.display());

        let argv = build_args(video, &work_target);
        let outcome = runner.run(&argv).inspect_err(|_| remove_quietly(&work_target))?;
        finish_file(outcome, &work_target, &final_target)?;

        info!("Wrote {}", final_target.display());
        reports.push(FileReport {
            source: video.clone(),
            output: final_target,
        });
    }
    Ok(reports)
}

fn finish_file(outcome: EncodeOutcome, work: &Path, target: &Path) -> Result<(), ToolError> {
    if !outcome.success() {
        remove_quietly(work);
        return Err(outcome.into_error());
    }
    if work != target {
        fs::rename(work, target).map_err(|e| {
            ToolError::io(
                format!("Failed to replace {} with {}", target.display(), work.display()),
                e,
            )
        })?;
    }
    Ok(())
}

/// Remove a partial output if one was left behind
pub(crate) fn remove_quietly(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}
