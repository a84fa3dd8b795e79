// Change the display aspect ratio of videos

use super::{FileReport, VideoInputs, collect_videos, process_videos};
use crate::engine::core::{ToolError, VIDEO_EXTENSIONS, normalize_extensions};
use crate::engine::probe::MediaProbe;
use crate::engine::runner::Runner;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const TEMP_MARKER: &str = "processing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Widescreen,
    Standard,
    Square,
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Widescreen,
        AspectRatio::Standard,
        AspectRatio::Square,
        AspectRatio::Portrait,
    ];

    /// Ratio as an ffmpeg expression (`16/9`)
    pub fn expression(self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16/9",
            AspectRatio::Standard => "4/3",
            AspectRatio::Square => "1/1",
            AspectRatio::Portrait => "9/16",
        }
    }

    /// Ratio as typed on the command line (`16:9`)
    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "9:16",
        }
    }

    /// Stretch to the new width at constant height and fix the DAR
    pub fn filter(self) -> String {
        let ratio = self.expression();
        format!("scale=ih*({ratio}):ih,setdar={ratio}")
    }
}

impl FromStr for AspectRatio {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|r| r.label() == s.trim())
            .ok_or_else(|| {
                ToolError::InvalidInput(format!(
                    "Invalid aspect ratio '{}'. Use one of 16:9, 4:3, 1:1, 9:16.",
                    s
                ))
            })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct AspectSettings {
    pub ffmpeg: String,
    pub codec: String,
    pub preset: String,
    pub extensions: Vec<String>,
}

impl Default for AspectSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            codec: "h264_nvenc".to_string(),
            preset: "p7".to_string(),
            extensions: normalize_extensions(VIDEO_EXTENSIONS),
        }
    }
}

/// `bitrate` keeps the source quality when the prober knows it
pub fn build_aspect_args(
    settings: &AspectSettings,
    input: &Path,
    output: &Path,
    ratio: AspectRatio,
    bitrate: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        settings.ffmpeg.clone(),
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "info".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vf".into(),
        ratio.filter(),
        "-c:v".into(),
        settings.codec.clone(),
        "-preset".into(),
        settings.preset.clone(),
    ];
    if let Some(bitrate) = bitrate {
        args.extend(["-b:v".into(), bitrate.to_string()]);
    }
    args.extend([
        "-c:a".into(),
        "copy".into(),
        output.to_string_lossy().into_owned(),
    ]);
    args
}

pub fn adjust_aspect_videos<R, P>(
    inputs: &VideoInputs,
    ratio: AspectRatio,
    settings: &AspectSettings,
    runner: &R,
    probe: &P,
) -> Result<Vec<FileReport>, ToolError>
where
    R: Runner + ?Sized,
    P: MediaProbe + ?Sized,
{
    let videos = collect_videos(inputs, &settings.extensions)?;
    process_videos(
        runner,
        &videos,
        inputs.output_dir.as_deref(),
        TEMP_MARKER,
        |input, output| {
            let bitrate = probe.bitrate(input);
            debug!("Source bitrate of {}: {:?}", input.display(), bitrate);
            build_aspect_args(settings, input, output, ratio, bitrate.as_deref())
        },
    )
}
