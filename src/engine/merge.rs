//! Merging numbered clips into one video.
//!
//! The orchestrator plans an ordered list of (codec, scaling mode) attempts,
//! runs them until one succeeds, and reports the last failure otherwise.

use crate::engine::core::{
    CatalogSpec, ConcatManifest, EncodeAttempt, EncodeOutcome, MediaFile, Resolution, ToolError,
    build_merge_args, is_hw_codec, normalize_fallback_codec, resolve_folder, scan,
};
use crate::engine::probe::{MediaProbe, detect_uniform_resolution};
use crate::engine::runner::Runner;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolution used when clips differ in size and none was requested
pub const DEFAULT_MERGE_RESOLUTION: Resolution = Resolution {
    width: 1920,
    height: 1080,
};

#[derive(Debug, Clone)]
pub struct MergeSettings {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub codec: String,
    /// Already normalized: `None` when fallback is disabled
    pub fallback_codec: Option<String>,
    pub preset: Option<String>,
    /// Explicit target; forces scaling even when clips already match
    pub resolution: Option<Resolution>,
    /// Target used when clips differ and no explicit target is set
    pub default_resolution: Resolution,
    pub catalog: CatalogSpec,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            codec: "h264_nvenc".to_string(),
            fallback_codec: Some("libx264".to_string()),
            preset: None,
            resolution: None,
            default_resolution: DEFAULT_MERGE_RESOLUTION,
            catalog: CatalogSpec::clips(),
        }
    }
}

impl MergeSettings {
    /// Apply `--fallback-codec` with its disabling sentinels
    pub fn with_fallback(mut self, value: Option<&str>) -> Self {
        self.fallback_codec = normalize_fallback_codec(value);
        self
    }
}

/// What a finished merge produced
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    pub output: PathBuf,
    pub clips: usize,
    pub target: Option<Resolution>,
    /// The attempt that succeeded
    pub attempt: EncodeAttempt,
    /// Number of external encode runs, including the successful one
    pub attempts_run: usize,
}

/// Result of running a candidate list to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSuccess {
    pub index: usize,
    pub attempts_run: usize,
}

/// Order in which (codec, scaling mode) combinations are tried.
///
/// Codecs: the primary, then the fallback if set and different. Hardware
/// scaling is only offered for NVENC codecs with a target resolution, and is
/// always tried before software scaling for the same codec.
pub fn plan_candidates(
    codec: &str,
    fallback_codec: Option<&str>,
    preset: Option<&str>,
    target: Option<Resolution>,
) -> Vec<EncodeAttempt> {
    let mut codecs = vec![codec.to_string()];
    if let Some(fallback) = fallback_codec {
        if fallback != codec {
            codecs.push(fallback.to_string());
        }
    }

    let mut candidates = Vec::new();
    for (codec_index, codec_name) in codecs.into_iter().enumerate() {
        let scale_modes: &[bool] = if target.is_some() && is_hw_codec(&codec_name) {
            &[true, false]
        } else {
            &[false]
        };
        for &hw_scaling in scale_modes {
            candidates.push(EncodeAttempt {
                codec: codec_name.clone(),
                preset: preset.map(str::to_string),
                resolution: target,
                hw_scaling,
                fallback: codec_index > 0,
            });
        }
    }
    candidates
}

/// Run `candidates` in order until one exits 0.
///
/// Each failed attempt's partial output is removed. If every attempt fails,
/// the error carries the exit code and log tail of the last one only.
pub fn run_candidates<R: Runner + ?Sized>(
    runner: &R,
    ffmpeg: &str,
    concat_list: &Path,
    output: &Path,
    candidates: &[EncodeAttempt],
) -> Result<AttemptSuccess, ToolError> {
    let mut last_failure: Option<EncodeOutcome> = None;

    for (index, attempt) in candidates.iter().enumerate() {
        debug!(
            "Attempt {}/{}: codec={} hw_scaling={}",
            index + 1,
            candidates.len(),
            attempt.codec,
            attempt.hw_scaling
        );
        let argv = build_merge_args(ffmpeg, concat_list, output, attempt);
        let outcome = match runner.run(&argv) {
            Ok(outcome) => outcome,
            Err(e) => {
                remove_partial_output(output);
                return Err(e);
            }
        };

        if outcome.success() {
            if attempt.fallback {
                info!(
                    "Fallback codec '{}' succeeded after primary codec failure.",
                    attempt.codec
                );
            }
            return Ok(AttemptSuccess {
                index,
                attempts_run: index + 1,
            });
        }

        remove_partial_output(output);
        if let Some(next) = candidates.get(index + 1) {
            if next.codec == attempt.codec {
                if attempt.hw_scaling && !next.hw_scaling {
                    warn!("ffmpeg failed while using CUDA scaling; retrying with CPU scaling...");
                }
            } else {
                warn!(
                    "ffmpeg failed while using codec '{}'; retrying with fallback codec '{}'...",
                    attempt.codec, next.codec
                );
            }
        }
        last_failure = Some(outcome);
    }

    match last_failure {
        Some(outcome) => Err(outcome.into_error()),
        None => Err(ToolError::InvalidInput(
            "No encode attempts were planned".to_string(),
        )),
    }
}

/// Pick the merge target.
///
/// An explicit resolution always wins. Otherwise clips that already share a
/// resolution are merged as-is (`None`), and mixed clips are scaled to
/// `default`.
pub fn choose_target_resolution<P: MediaProbe + ?Sized>(
    probe: &P,
    files: &[MediaFile],
    explicit: Option<Resolution>,
    default: Resolution,
) -> Result<Option<Resolution>, ToolError> {
    if let Some(resolution) = explicit {
        return Ok(Some(resolution));
    }
    match detect_uniform_resolution(probe, files)? {
        Some(shared) => {
            info!("All clips share {}; keeping source resolution", shared);
            Ok(None)
        }
        None => {
            info!("Clips differ in resolution; scaling to {}", default);
            Ok(Some(default))
        }
    }
}

/// `<output_dir>/<input folder name>.mp4`
pub fn derive_output_path(input_dir: &Path, output_dir: &Path) -> PathBuf {
    let name = input_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged".to_string());
    output_dir.join(format!("{}.mp4", name))
}

/// Merge the numbered clips of `input` into `<output_dir>/<folder>.mp4`.
///
/// The concat list exists only for the duration of the attempts and is
/// removed on every exit path.
pub fn merge_folder<R, P>(
    input: &Path,
    output_dir: &Path,
    settings: &MergeSettings,
    runner: &R,
    probe: &P,
) -> Result<MergeReport, ToolError>
where
    R: Runner + ?Sized,
    P: MediaProbe + ?Sized,
{
    let input_dir = resolve_folder(input)?;
    fs::create_dir_all(output_dir).map_err(|e| {
        ToolError::io(
            format!("Failed to create output folder {}", output_dir.display()),
            e,
        )
    })?;

    let files = scan(&input_dir, &settings.catalog)?;
    info!("Found {} clips in {}", files.len(), input_dir.display());

    let target = choose_target_resolution(
        probe,
        &files,
        settings.resolution,
        settings.default_resolution,
    )?;
    let output = derive_output_path(&input_dir, output_dir);
    let candidates = plan_candidates(
        &settings.codec,
        settings.fallback_codec.as_deref(),
        settings.preset.as_deref(),
        target,
    );

    let manifest = ConcatManifest::create(&files)?;
    let result = run_candidates(
        runner,
        &settings.ffmpeg,
        manifest.path(),
        &output,
        &candidates,
    );
    drop(manifest);

    let success = result?;
    info!("Merged video written to {}", output.display());
    Ok(MergeReport {
        output,
        clips: files.len(),
        target,
        attempt: candidates[success.index].clone(),
        attempts_run: success.attempts_run,
    })
}

fn remove_partial_output(output: &Path) {
    if !output.exists() {
        return;
    }
    match fs::remove_file(output) {
        Ok(()) => debug!("Removed partial output {}", output.display()),
        Err(e) => warn!(
            "Failed to remove partial output {}: {}",
            output.display(),
            e
        ),
    }
}
