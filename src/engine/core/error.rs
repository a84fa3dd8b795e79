use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while processing a folder.
///
/// Input errors are raised before any external process runs; probe and
/// encode errors carry what the external tool reported.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid resolution '{0}'. Use WIDTHxHEIGHT format, e.g. 1920x1080.")]
    InvalidResolution(String),

    #[error("No files matching the #### numbering pattern were found in {}", .folder.display())]
    NoMatchingFiles { folder: PathBuf },

    #[error("Unable to detect resolution of {}: {reason}", .file.display())]
    Probe { file: PathBuf, reason: String },

    #[error("ffmpeg failed with exit code {code}. Last log lines:\n{}", format_tail(.tail))]
    EncodeFailed { code: i32, tail: Vec<String> },

    #[error("{} executable(s) not found in PATH; install the ffmpeg bundle.", .0.join(", "))]
    ToolMissing(Vec<String>),

    #[error("Interrupted by user")]
    Interrupted,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for errors the caller can fix by changing its input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ToolError::InvalidInput(_)
                | ToolError::InvalidResolution(_)
                | ToolError::NoMatchingFiles { .. }
        )
    }
}

fn format_tail(tail: &[String]) -> String {
    if tail.is_empty() {
        "(ffmpeg produced no output)".to_string()
    } else {
        tail.join("\n")
    }
}
