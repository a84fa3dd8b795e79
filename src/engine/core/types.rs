use super::error::ToolError;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output frame size in pixels. Both dimensions are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, ToolError> {
        if width == 0 || height == 0 {
            return Err(ToolError::InvalidResolution(format!("{}x{}", width, height)));
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl FromStr for Resolution {
    type Err = ToolError;

    /// Parses `WIDTHxHEIGHT` exactly: digits on both sides, nothing else.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ToolError::InvalidResolution(s.to_string());
        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(w) || !all_digits(h) {
            return Err(invalid());
        }
        let width = w.parse::<u32>().map_err(|_| invalid())?;
        let height = h.parse::<u32>().map_err(|_| invalid())?;
        Resolution::new(width, height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sequence number found in a file name, of any length.
///
/// Stored as decimal digits without leading zeros, so numeric order is
/// (digit count, digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceNumber(String);

impl SequenceNumber {
    /// `None` unless `digits` is a non-empty run of ASCII digits
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        let normalized = if trimmed.is_empty() { "0" } else { trimmed };
        Some(Self(normalized.to_string()))
    }

    /// The number as `u64`, when it fits
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Ord for SequenceNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for SequenceNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalogued input file and the sequence number found in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub sequence: SequenceNumber,
}

impl MediaFile {
    pub fn new(path: PathBuf, sequence: u64) -> Self {
        Self::tagged(path, SequenceNumber::from(sequence))
    }

    pub fn tagged(path: PathBuf, sequence: SequenceNumber) -> Self {
        Self { path, sequence }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One (codec, scaling mode) combination the merge orchestrator may try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeAttempt {
    pub codec: String,
    /// Preset requested by the user; the command builder fills in codec defaults.
    pub preset: Option<String>,
    pub resolution: Option<Resolution>,
    pub hw_scaling: bool,
    /// Set for attempts using the fallback codec rather than the primary one.
    pub fallback: bool,
}

/// Exit code and trailing output lines of one external process run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodeOutcome {
    pub code: i32,
    pub tail: Vec<String>,
}

impl EncodeOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn into_error(self) -> ToolError {
        ToolError::EncodeFailed {
            code: self.code,
            tail: self.tail,
        }
    }
}
