// Rotate videos by 90 degrees with ffmpeg's transpose filter

use super::{FileReport, VideoInputs, collect_videos, process_videos};
use crate::engine::core::{ToolError, VIDEO_EXTENSIONS, normalize_extensions};
use crate::engine::runner::Runner;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const TEMP_MARKER: &str = "rotating";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// Value for `transpose=`
    pub fn transpose(self) -> u8 {
        match self {
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => 2,
        }
    }
}

impl FromStr for Rotation {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clockwise" | "cw" => Ok(Rotation::Clockwise),
            "counter-clockwise" | "counterclockwise" | "ccw" => Ok(Rotation::CounterClockwise),
            _ => Err(ToolError::InvalidInput(format!(
                "Invalid rotation '{}'. Use clockwise or counter-clockwise.",
                s
            ))),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::Clockwise => write!(f, "clockwise"),
            Rotation::CounterClockwise => write!(f, "counter-clockwise"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RotateSettings {
    pub ffmpeg: String,
    pub codec: String,
    pub preset: String,
    pub extensions: Vec<String>,
}

impl Default for RotateSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            codec: "h264_nvenc".to_string(),
            preset: "p4".to_string(),
            extensions: normalize_extensions(VIDEO_EXTENSIONS),
        }
    }
}

pub fn build_rotate_args(
    settings: &RotateSettings,
    input: &Path,
    output: &Path,
    rotation: Rotation,
) -> Vec<String> {
    vec![
        settings.ffmpeg.clone(),
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "info".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vf".into(),
        format!("transpose={}", rotation.transpose()),
        "-c:v".into(),
        settings.codec.clone(),
        "-preset".into(),
        settings.preset.clone(),
        "-c:a".into(),
        "copy".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Rotate every selected video. Returns one report per file, in order.
pub fn rotate_videos<R: Runner + ?Sized>(
    inputs: &VideoInputs,
    rotation: Rotation,
    settings: &RotateSettings,
    runner: &R,
) -> Result<Vec<FileReport>, ToolError> {
    let videos = collect_videos(inputs, &settings.extensions)?;
    process_videos(
        runner,
        &videos,
        inputs.output_dir.as_deref(),
        TEMP_MARKER,
        |input, output| build_rotate_args(settings, input, output, rotation),
    )
}
