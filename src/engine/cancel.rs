//! User cancellation.
//!
//! A `CancelToken` is shared between the controlling thread, the batch
//! worker and the process runner. Ctrl-C can be routed into a token so it
//! stops the running ffmpeg instead of killing vidtools outright.

use crate::engine::core::ToolError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once cancelled
    pub fn check(&self) -> Result<(), ToolError> {
        if self.is_cancelled() {
            Err(ToolError::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Flag an interrupt. Returns true when the flag was already set, meaning
/// this is the second Ctrl-C.
fn record_interrupt(flag: &AtomicBool) -> bool {
    flag.swap(true, Ordering::SeqCst)
}

/// Route Ctrl-C into `token`; a second Ctrl-C exits with status 130.
/// Only one handler can be installed per process. Returns false when this
/// call did not install one.
pub fn install_interrupt_handler(token: &CancelToken) -> bool {
    let flag = token.flag.clone();
    ctrlc::set_handler(move || {
        if record_interrupt(&flag) {
            std::process::exit(130);
        }
    })
    .is_ok()
}
