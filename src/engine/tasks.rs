// Per-folder task dispatch shared by direct runs and the batch worker

use crate::engine::core::ToolError;
use crate::engine::merge::{MergeSettings, merge_folder};
use crate::engine::probe::MediaProbe;
use crate::engine::runner::Runner;
use crate::engine::tools::{Img2VidSettings, img2vid_folder};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Merge,
    Img2Vid,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Merge => write!(f, "merge"),
            TaskKind::Img2Vid => write!(f, "img2vid"),
        }
    }
}

/// A folder tool together with its settings
#[derive(Debug, Clone)]
pub enum Task {
    Merge(MergeSettings),
    Img2Vid(Img2VidSettings),
}

/// External collaborators a task runs against
#[derive(Clone, Copy)]
pub struct TaskEnv<'a> {
    pub runner: &'a dyn Runner,
    pub probe: &'a dyn MediaProbe,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskReport {
    Completed { output: PathBuf, summary: String },
    /// Nothing to do in this folder
    Skipped { reason: String },
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Merge(_) => TaskKind::Merge,
            Task::Img2Vid(_) => TaskKind::Img2Vid,
        }
    }

    /// Programs that must be on PATH before the task can run
    pub fn required_tools(&self) -> Vec<String> {
        match self {
            // The prober is only needed when no explicit target is set
            Task::Merge(settings) => {
                let mut tools = vec![settings.ffmpeg.clone()];
                if settings.resolution.is_none() {
                    tools.push(settings.ffprobe.clone());
                }
                tools
            }
            Task::Img2Vid(settings) => vec![settings.ffmpeg.clone()],
        }
    }

    /// Process one folder, writing into `output_dir`.
    ///
    /// A folder without numbered files is skipped, not failed.
    pub fn run(
        &self,
        folder: &Path,
        output_dir: &Path,
        env: TaskEnv<'_>,
    ) -> Result<TaskReport, ToolError> {
        let result = match self {
            Task::Merge(settings) => {
                merge_folder(folder, output_dir, settings, env.runner, env.probe).map(|report| {
                    let scaled = match report.target {
                        Some(target) => format!("scaled to {}", target),
                        None => "source resolution".to_string(),
                    };
                    TaskReport::Completed {
                        summary: format!(
                            "{} clips merged with {} ({})",
                            report.clips, report.attempt.codec, scaled
                        ),
                        output: report.output,
                    }
                })
            }
            Task::Img2Vid(settings) => {
                img2vid_folder(folder, output_dir, settings, env.runner).map(|output| {
                    TaskReport::Completed {
                        summary: format!("images encoded at {} fps", settings.framerate),
                        output,
                    }
                })
            }
        };

        match result {
            Err(ToolError::NoMatchingFiles { folder }) => {
                let reason = format!(
                    "No files with a #### numbering pattern found in {}. Skipping.",
                    folder.display()
                );
                info!("Info: {}", reason);
                Ok(TaskReport::Skipped { reason })
            }
            other => other,
        }
    }
}
