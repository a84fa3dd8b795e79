// Input probing using ffprobe

use crate::engine::core::{MediaFile, Resolution, ToolError};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Source of per-file stream metadata.
pub trait MediaProbe {
    /// Frame size of the first video stream
    fn resolution(&self, file: &Path) -> Result<Resolution, ToolError>;

    /// Video bitrate as reported by the prober, if known
    fn bitrate(&self, _file: &Path) -> Option<String> {
        None
    }
}

/// `MediaProbe` backed by the ffprobe executable
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for FfprobeProbe {
    fn resolution(&self, file: &Path) -> Result<Resolution, ToolError> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=s=x:p=0",
            ])
            .arg(file)
            .output()
            .map_err(|e| ToolError::Probe {
                file: file.to_path_buf(),
                reason: format!("failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ToolError::Probe {
                file: file.to_path_buf(),
                reason: format!("ffprobe exited with {}: {}", output.status, detail),
            });
        }

        parse_probe_output(file, &String::from_utf8_lossy(&output.stdout))
    }

    fn bitrate(&self, file: &Path) -> Option<String> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=bit_rate",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(file)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_bitrate_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the `WIDTHxHEIGHT` line printed by the resolution probe.
///
/// A trailing separator (`1920x1080x`) is tolerated; anything else that is
/// not exactly two positive integers is a probe error.
pub fn parse_probe_output(file: &Path, stdout: &str) -> Result<Resolution, ToolError> {
    let value = stdout.trim();
    let line = value.lines().next().unwrap_or("").trim().trim_end_matches('x');
    line.parse::<Resolution>().map_err(|_| ToolError::Probe {
        file: file.to_path_buf(),
        reason: format!("ffprobe returned unexpected resolution '{}'", value),
    })
}

/// `N/A` and empty answers mean the bitrate is unknown
pub fn parse_bitrate_output(stdout: &str) -> Option<String> {
    let value = stdout.trim();
    if value.is_empty() || value == "N/A" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Return the resolution shared by every file, probing in order.
///
/// Stops at the first file that differs from the first one and returns
/// `None`; an empty list also yields `None`.
pub fn detect_uniform_resolution<P: MediaProbe + ?Sized>(
    probe: &P,
    files: &[MediaFile],
) -> Result<Option<Resolution>, ToolError> {
    let mut reference: Option<Resolution> = None;
    for file in files {
        let current = probe.resolution(file.path())?;
        match reference {
            None => reference = Some(current),
            Some(r) if r != current => {
                debug!(
                    "{} is {} but the first clip is {}",
                    file.path().display(),
                    current,
                    r
                );
                return Ok(None);
            }
            Some(_) => {}
        }
    }
    Ok(reference)
}
