//! Tokio-backed scheduler.

use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tracing::debug;

use crate::{CancelHandle, Scheduler, Task};

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// [`TokioScheduler::current`] was called outside a tokio runtime.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Runs callbacks on a tokio runtime after a real-time delay.
///
/// Each scheduled callback is a spawned task that races its delay against
/// the cancellation handle. A cancelled task ends at once and drops its
/// callback.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Bind to the runtime the caller is currently running on.
    ///
    /// # Errors
    /// [`SchedulerError::NoRuntime`] when called outside a runtime context.
    pub fn current() -> Result<Self, SchedulerError> {
        Ok(Self { runtime: Handle::try_current()? })
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) -> CancelHandle {
        let handle = CancelHandle::new();
        let watch = handle.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = watch.cancelled() => {
                    debug!("scheduled task cancelled before its deadline");
                    return;
                }
            }
            if !watch.is_cancelled() {
                task();
            }
        });

        handle
    }
}
