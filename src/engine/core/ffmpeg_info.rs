use super::error::ToolError;
use anyhow::{Context, Result};
use std::process::Command;

/// Fail with `ToolMissing` naming every program that cannot be found.
///
/// Bare names are looked up on PATH; values containing a path separator are
/// checked as given.
pub fn ensure_tools_available<S: AsRef<str>>(programs: &[S]) -> Result<(), ToolError> {
    let mut missing: Vec<String> = Vec::new();
    for program in programs {
        let program = program.as_ref();
        if which::which(program).is_err() && !missing.iter().any(|m| m == program) {
            missing.push(program.to_string());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToolError::ToolMissing(missing))
    }
}

fn first_version_line(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .with_context(|| format!("Failed to execute {}. Is it installed and in PATH?", program))?;

    if !output.status.success() {
        anyhow::bail!("{} command failed with status: {}", program, output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check if ffmpeg is available and return its version
pub fn ffmpeg_version(program: &str) -> Result<String> {
    first_version_line(program)
}

/// Check if ffprobe is available and return its version
pub fn ffprobe_version(program: &str) -> Result<String> {
    first_version_line(program)
}

/// Check if ffmpeg lists `encoder` among its encoders
pub fn encoder_available(program: &str, encoder: &str) -> bool {
    let output = Command::new(program)
        .arg("-hide_banner")
        .arg("-encoders")
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            encoder_listed(&stdout, encoder)
        }
        _ => false,
    }
}

/// Scan `ffmpeg -encoders` output for an exact encoder name
pub fn encoder_listed(listing: &str, encoder: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|name| name == encoder)
}
