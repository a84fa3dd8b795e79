//! Image sequence to video.
//!
//! ffmpeg's image2 demuxer needs a gapless `%0Nd` sequence, so the catalogued
//! images are linked into a scratch folder under consecutive names first.

use super::remove_quietly;
use crate::engine::core::{CatalogSpec, MediaFile, Resolution, ToolError, resolve_folder, scan};
use crate::engine::merge::derive_output_path;
use crate::engine::runner::Runner;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Img2VidSettings {
    pub ffmpeg: String,
    pub framerate: f64,
    pub resolution: Resolution,
    /// Encode with h264_nvenc instead of libx264
    pub cuda: bool,
    pub catalog: CatalogSpec,
}

impl Default for Img2VidSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            framerate: 2.0,
            resolution: Resolution {
                width: 3840,
                height: 2160,
            },
            cuda: false,
            catalog: CatalogSpec::frames(),
        }
    }
}

/// Render a framerate the way it is passed to `-framerate` (`2.0`, `29.97`)
pub fn format_framerate(framerate: f64) -> String {
    if framerate.fract() == 0.0 {
        format!("{:.1}", framerate)
    } else {
        framerate.to_string()
    }
}

fn validate_framerate(framerate: f64) -> Result<(), ToolError> {
    if framerate.is_finite() && framerate > 0.0 {
        Ok(())
    } else {
        Err(ToolError::InvalidInput(format!(
            "Invalid framerate '{}'. Enter a positive number.",
            framerate
        )))
    }
}

/// Link `images` into `dir` as `0001.<ext>`, `0002.<ext>`, ... and return
/// the matching ffmpeg input pattern.
///
/// Every image must share one extension. Symlinks are used where the
/// platform allows them, copies otherwise.
pub fn link_sequence(images: &[MediaFile], dir: &Path) -> Result<String, ToolError> {
    let extensions: BTreeSet<String> = images
        .iter()
        .map(|img| {
            img.path()
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default()
        })
        .collect();
    if extensions.len() != 1 {
        return Err(ToolError::InvalidInput(
            "All images must share the same file extension for ffmpeg input.".to_string(),
        ));
    }
    let extension = extensions.into_iter().next().unwrap_or_default();
    let padding = std::cmp::max(4, images.len().to_string().len());

    for (index, image) in images.iter().enumerate() {
        let link = dir.join(format!(
            "{:0width$}.{}",
            index + 1,
            extension,
            width = padding
        ));
        if link.exists() {
            fs::remove_file(&link)
                .map_err(|e| ToolError::io(format!("Failed to replace {}", link.display()), e))?;
        }
        link_or_copy(image.path(), &link)?;
    }

    Ok(dir
        .join(format!("%0{}d.{}", padding, extension))
        .to_string_lossy()
        .into_owned())
}

fn link_or_copy(source: &Path, link: &Path) -> Result<(), ToolError> {
    if let Err(e) = symlink(source, link) {
        debug!("Symlink failed for {} ({}); copying", link.display(), e);
        fs::copy(source, link).map_err(|e| {
            ToolError::io(
                format!("Failed to copy {} to {}", source.display(), link.display()),
                e,
            )
        })?;
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_source: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks not supported",
    ))
}

pub fn build_img2vid_args(settings: &Img2VidSettings, pattern: &str, output: &Path) -> Vec<String> {
    let Resolution { width, height } = settings.resolution;
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black",
        w = width,
        h = height
    );
    let codec = if settings.cuda { "h264_nvenc" } else { "libx264" };

    vec![
        settings.ffmpeg.clone(),
        "-y".into(),
        "-framerate".into(),
        format_framerate(settings.framerate),
        "-i".into(),
        pattern.to_string(),
        "-vf".into(),
        filter,
        "-c:v".into(),
        codec.into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Turn the numbered images of `input` into `<output_dir>/<folder>.mp4`
pub fn img2vid_folder<R: Runner + ?Sized>(
    input: &Path,
    output_dir: &Path,
    settings: &Img2VidSettings,
    runner: &R,
) -> Result<PathBuf, ToolError> {
    validate_framerate(settings.framerate)?;
    let input_dir = resolve_folder(input)?;
    fs::create_dir_all(output_dir).map_err(|e| {
        ToolError::io(
            format!("Failed to create output folder {}", output_dir.display()),
            e,
        )
    })?;
    let output = derive_output_path(&input_dir, output_dir);

    let images = scan(&input_dir, &settings.catalog)?;
    info!("Found {} images in {}", images.len(), input_dir.display());

    let scratch = TempDir::with_prefix("vidtools-img2vid-")
        .map_err(|e| ToolError::io("Failed to create temporary folder", e))?;
    let pattern = link_sequence(&images, scratch.path())?;
    let argv = build_img2vid_args(settings, &pattern, &output);

    let outcome = runner.run(&argv).inspect_err(|_| remove_quietly(&output))?;
    drop(scratch);
    if !outcome.success() {
        remove_quietly(&output);
        return Err(outcome.into_error());
    }

    info!("Video written to {}", output.display());
    Ok(output)
}
