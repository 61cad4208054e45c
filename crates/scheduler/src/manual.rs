//! Virtual-clock scheduler.
//!
//! Time only moves when the owner calls [`ManualScheduler::advance`] or
//! [`ManualScheduler::run_until_idle`]. Due callbacks run in deadline order
//! (ties in scheduling order) on the caller's thread, with no internal lock
//! held, so a callback may schedule or cancel further work.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::{CancelHandle, Scheduler, Task};

/// Upper bound on callbacks run by one `run_until_idle` call.
const IDLE_RUN_LIMIT: usize = 100_000;

struct Pending {
    due: Duration,
    seq: u64,
    handle: CancelHandle,
    task: Task,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_seq: u64,
    queue: Vec<Pending>,
}

/// Deterministic scheduler driven by explicit clock advances.
///
/// Cloning yields another handle onto the same clock and queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ClockState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current virtual time since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of queued callbacks that have not been cancelled.
    pub fn pending(&self) -> usize {
        self.lock()
            .queue
            .iter()
            .filter(|p| !p.handle.is_cancelled())
            .count()
    }

    /// Deadline of the earliest live callback, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.lock()
            .queue
            .iter()
            .filter(|p| !p.handle.is_cancelled())
            .map(|p| p.due)
            .min()
    }

    /// Move the clock forward by `by`, running every callback that falls due
    /// on the way, including ones scheduled by callbacks during the advance.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;

        while let Some(pending) = self.pop_due(target) {
            if pending.handle.is_cancelled() {
                continue;
            }
            debug!(due_ms = pending.due.as_millis() as u64, "running scheduled task");
            (pending.task)();
            ran += 1;
        }

        let mut state = self.lock();
        if state.now < target {
            state.now = target;
        }
        ran
    }

    /// Keep jumping to the next deadline until nothing live is queued.
    ///
    /// Returns the number of callbacks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(due) = self.next_due() {
            let now = self.now();
            ran += self.advance(due.saturating_sub(now));
            if ran >= IDLE_RUN_LIMIT {
                break;
            }
        }
        ran
    }

    fn pop_due(&self, target: Duration) -> Option<Pending> {
        let mut state = self.lock();
        state.queue.retain(|p| !p.handle.is_cancelled());

        let idx = state
            .queue
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;

        let pending = state.queue.swap_remove(idx);
        if state.now < pending.due {
            state.now = pending.due;
        }
        Some(pending)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) -> CancelHandle {
        let handle = CancelHandle::new();
        let mut state = self.lock();
        let due = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.push(Pending {
            due,
            seq,
            handle: handle.clone(),
            task,
        });
        handle
    }
}
