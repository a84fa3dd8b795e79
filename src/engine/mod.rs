// Video processing engine - independent of the CLI

pub mod cancel;
pub mod core;
pub mod merge;
pub mod probe;
pub mod runner;
pub mod tasks;
pub mod tools;
pub mod worker;

pub use cancel::{CancelToken, install_interrupt_handler};
pub use core::*;
pub use merge::{MergeReport, MergeSettings, merge_folder};
pub use probe::{FfprobeProbe, MediaProbe};
pub use runner::{ProcessRunner, Runner};
pub use tasks::{Task, TaskEnv, TaskKind, TaskReport};
pub use worker::{BatchJob, BatchWorker, WorkerMessage, run_batch};
