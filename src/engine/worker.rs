// Background worker that runs one folder task over many folders

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use super::cancel::CancelToken;
use super::probe::MediaProbe;
use super::runner::Runner;
use super::tasks::{Task, TaskEnv, TaskReport};

/// Message from worker to main thread
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// Folder processing started (index is 1-based)
    FolderStarted {
        index: usize,
        total: usize,
        folder: PathBuf,
    },

    /// Folder finished, possibly as a skip
    FolderCompleted {
        index: usize,
        total: usize,
        report: TaskReport,
    },

    /// Folder failed; no further folders are processed
    Failed {
        index: usize,
        folder: PathBuf,
        error: String,
    },

    /// Always the last message
    Finished { processed: usize, total: usize },
}

/// Folders to process and where results go
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub task: Task,
    pub folders: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

/// Process folders in order, reporting through `tx`.
///
/// Stops at the first failure or cancellation. Returns the number of folders
/// that completed (skips included).
pub fn run_batch(
    job: &BatchJob,
    env: TaskEnv<'_>,
    cancel: &CancelToken,
    tx: &Sender<WorkerMessage>,
) -> usize {
    let total = job.folders.len();
    let mut processed = 0;

    for (i, folder) in job.folders.iter().enumerate() {
        let index = i + 1;
        if let Err(e) = cancel.check() {
            let _ = tx.send(WorkerMessage::Failed {
                index,
                folder: folder.clone(),
                error: e.to_string(),
            });
            break;
        }

        let _ = tx.send(WorkerMessage::FolderStarted {
            index,
            total,
            folder: folder.clone(),
        });

        match job.task.run(folder, &job.output_dir, env) {
            Ok(report) => {
                processed += 1;
                let _ = tx.send(WorkerMessage::FolderCompleted {
                    index,
                    total,
                    report,
                });
            }
            Err(e) => {
                error!("{} failed for {}: {}", job.task.kind(), folder.display(), e);
                let _ = tx.send(WorkerMessage::Failed {
                    index,
                    folder: folder.clone(),
                    error: e.to_string(),
                });
                break;
            }
        }
    }

    let _ = tx.send(WorkerMessage::Finished { processed, total });
    processed
}

/// Runs a `BatchJob` on its own thread
pub struct BatchWorker;

impl BatchWorker {
    /// Start the batch. The receiver yields messages until `Finished`.
    pub fn spawn<R, P>(
        job: BatchJob,
        runner: R,
        probe: P,
        cancel: CancelToken,
    ) -> (JoinHandle<usize>, Receiver<WorkerMessage>)
    where
        R: Runner + Send + 'static,
        P: MediaProbe + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            debug!(
                "Batch worker started: {} over {} folder(s)",
                job.task.kind(),
                job.folders.len()
            );
            let env = TaskEnv {
                runner: &runner,
                probe: &probe,
            };
            run_batch(&job, env, &cancel, &tx)
        });
        (handle, rx)
    }
}
