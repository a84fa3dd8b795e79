// Stand-ins for ffmpeg and ffprobe so tests never need the real tools

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use vidtools::engine::{EncodeOutcome, MediaProbe, Resolution, Runner, ToolError};

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub argv: Vec<String>,
    /// Contents of the `-f concat` input list at the time of the call
    pub concat_list: Option<String>,
}

impl RecordedRun {
    pub fn value_after(&self, flag: &str) -> Option<&str> {
        self.argv
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.argv.get(i + 1))
            .map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.argv.iter().any(|a| a == flag)
    }

    pub fn output(&self) -> PathBuf {
        PathBuf::from(self.argv.last().cloned().unwrap_or_default())
    }
}

/// Returns queued outcomes in order (success once the queue is empty) and
/// writes a dummy output file like ffmpeg would.
#[derive(Default)]
pub struct ScriptedRunner {
    outcomes: Mutex<VecDeque<Result<EncodeOutcome, ToolError>>>,
    runs: Mutex<Vec<RecordedRun>>,
}

impl ScriptedRunner {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn with_exit_codes(codes: &[i32]) -> Self {
        let runner = Self::default();
        for (i, code) in codes.iter().enumerate() {
            runner.push(Ok(EncodeOutcome {
                code: *code,
                tail: vec![format!("attempt {} log", i + 1)],
            }));
        }
        runner
    }

    pub fn push(&self, outcome: Result<EncodeOutcome, ToolError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap().clone()
    }
}

impl Runner for ScriptedRunner {
    fn run(&self, argv: &[String]) -> Result<EncodeOutcome, ToolError> {
        let concat_list = argv
            .iter()
            .position(|a| a == "concat")
            .and_then(|_| argv.iter().position(|a| a == "-i"))
            .and_then(|i| argv.get(i + 1))
            .and_then(|p| fs::read_to_string(p).ok());
        self.runs.lock().unwrap().push(RecordedRun {
            argv: argv.to_vec(),
            concat_list,
        });

        if let Some(output) = argv.last() {
            let output = Path::new(output);
            if output.parent().is_some_and(Path::is_dir) {
                fs::write(output, b"encoded").unwrap();
            }
        }

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EncodeOutcome::default()))
    }
}

/// Resolutions keyed by file name; unknown files fail to probe
#[derive(Default)]
pub struct FixedProbe {
    sizes: HashMap<String, Resolution>,
    bitrate: Option<String>,
    calls: Mutex<Vec<PathBuf>>,
}

impl FixedProbe {
    pub fn new(entries: &[(&str, u32, u32)]) -> Self {
        Self {
            sizes: entries
                .iter()
                .map(|(name, w, h)| (name.to_string(), Resolution::new(*w, *h).unwrap()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_bitrate(mut self, bitrate: &str) -> Self {
        self.bitrate = Some(bitrate.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl MediaProbe for FixedProbe {
    fn resolution(&self, file: &Path) -> Result<Resolution, ToolError> {
        self.calls.lock().unwrap().push(file.to_path_buf());
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.sizes.get(&name).copied().ok_or_else(|| ToolError::Probe {
            file: file.to_path_buf(),
            reason: "no video stream".to_string(),
        })
    }

    fn bitrate(&self, _file: &Path) -> Option<String> {
        self.bitrate.clone()
    }
}
