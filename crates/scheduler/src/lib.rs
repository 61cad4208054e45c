//! `scheduler` crate — cancellable delayed callbacks.
//!
//! The simulation runner never sleeps. It asks a [`Scheduler`] to run a
//! callback after a delay and keeps the returned [`CancelHandle`]; pausing or
//! resetting the run is then just a `cancel()`.
//!
//! Two implementations ship with the crate:
//! - [`ManualScheduler`] — a virtual clock advanced by the caller. Used by
//!   tests and by anything that wants deterministic playback.
//! - [`TokioScheduler`] — real timers on a tokio runtime.

pub mod cancel;
pub mod manual;
pub mod timer;

use std::time::Duration;

pub use cancel::CancelHandle;
pub use manual::ManualScheduler;
pub use timer::{SchedulerError, TokioScheduler};

/// A callback queued on a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs callbacks after a delay.
pub trait Scheduler: Send + Sync {
    /// Queue `task` to run once `delay` has elapsed.
    ///
    /// Cancelling the returned handle before the deadline guarantees the
    /// task never runs. Cancelling afterwards is a no-op.
    fn schedule_after(&self, delay: Duration, task: Task) -> CancelHandle;
}
