//! Simulation playback.
//!
//! `SimulationRunner` replays the steps produced by [`generate_steps`] one at
//! a time, waiting a speed-dependent delay between steps:
//! 1. `start` regenerates the steps and emits the first one immediately.
//! 2. Each emitted step goes to the observer; an `Executing` step also
//!    highlights its node and, when it follows a `Completed` step, the edge
//!    between the two.
//! 3. The next advance is queued on the [`Scheduler`] unless paused.
//! 4. An advance past the last step clears highlights and fires
//!    `on_complete` once.
//!
//! Observer callbacks run with no runner lock held, so an observer may call
//! `pause` or `reset` from inside a callback. Every pause/reset/start bumps a
//! generation counter; timers armed under an older generation do nothing.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use scheduler::{CancelHandle, Scheduler};

use crate::config::SimulationConfig;
use crate::models::{EdgeId, WorkflowGraph};
use crate::steps::{generate_steps, DurationSource, RandomDurations, SimulationStep, StepStatus};

// ---------------------------------------------------------------------------
// Speed / state
// ---------------------------------------------------------------------------

/// Playback speed; maps to a delay through [`SimulationConfig::delay_for`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow   => "slow",
            Self::Normal => "normal",
            Self::Fast   => "fast",
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow"   => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast"   => Ok(Self::Fast),
            other    => Err(format!("unknown speed '{other}' (expected slow, normal or fast)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Receives playback events.
pub trait SimulationObserver: Send + Sync {
    fn on_step(&self, step: &SimulationStep);

    /// Fired once per run, after the last step.
    fn on_complete(&self);

    /// `None` clears the highlight.
    fn on_node_activate(&self, node_id: Option<&str>);

    /// `None` clears the highlight.
    fn on_edge_activate(&self, edge_id: Option<&str>);
}

// ---------------------------------------------------------------------------
// Runner internals
// ---------------------------------------------------------------------------

struct Playback {
    steps: Vec<SimulationStep>,
    cursor: usize,
    state: RunnerState,
    speed: Speed,
    generation: u64,
    pending: Option<CancelHandle>,
    durations: Box<dyn DurationSource>,
}

impl Playback {
    /// Invalidate every armed timer.
    fn disarm(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }
}

struct Shared<S> {
    graph: WorkflowGraph,
    scheduler: S,
    observer: Arc<dyn SimulationObserver>,
    config: SimulationConfig,
    playback: Mutex<Playback>,
}

/// What an advance decided to do once the lock is released.
enum Advance {
    Emit { step: SimulationStep, edge: Option<EdgeId> },
    Complete,
}

impl<S: Scheduler + 'static> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Playback> {
        self.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance(self: &Arc<Self>, generation: u64) {
        let action = {
            let mut playback = self.lock();
            if playback.generation != generation || playback.state != RunnerState::Running {
                return;
            }
            playback.pending = None;

            if playback.cursor >= playback.steps.len() {
                playback.state = RunnerState::Completed;
                Advance::Complete
            } else {
                let cursor = playback.cursor;
                let step = playback.steps[cursor].clone();
                let edge = cursor
                    .checked_sub(1)
                    .map(|prev| &playback.steps[prev])
                    .and_then(|prev| self.incoming_edge(prev, &step));
                playback.cursor += 1;
                Advance::Emit { step, edge }
            }
        };

        match action {
            Advance::Complete => {
                info!("simulation complete");
                self.observer.on_node_activate(None);
                self.observer.on_edge_activate(None);
                self.observer.on_complete();
            }
            Advance::Emit { step, edge } => {
                debug!(status = ?step.status, node = ?step.node_id, "simulation step");
                self.observer.on_step(&step);
                if step.status == StepStatus::Executing {
                    self.observer.on_node_activate(step.node_id.as_deref());
                    if let Some(edge_id) = edge.as_deref() {
                        self.observer.on_edge_activate(Some(edge_id));
                    }
                }
                self.schedule_next(generation);
            }
        }
    }

    /// Edge to highlight when `step` starts right after `prev` finished.
    fn incoming_edge(&self, prev: &SimulationStep, step: &SimulationStep) -> Option<EdgeId> {
        if step.status != StepStatus::Executing || prev.status != StepStatus::Completed {
            return None;
        }
        let (from, to) = (prev.node_id.as_deref()?, step.node_id.as_deref()?);
        if from == to {
            return None;
        }
        self.graph.edge_between(from, to).map(|e| e.id.clone())
    }

    fn schedule_next(self: &Arc<Self>, generation: u64) {
        let mut playback = self.lock();
        // A callback may have paused or reset the run.
        if playback.generation != generation || playback.state != RunnerState::Running {
            return;
        }

        let delay = self.config.delay_for(playback.speed);
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = self.scheduler.schedule_after(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.advance(generation);
                }
            }),
        );
        playback.pending = Some(handle);
    }
}

// ---------------------------------------------------------------------------
// SimulationRunner
// ---------------------------------------------------------------------------

/// Replays a graph's simulation steps on a [`Scheduler`].
///
/// Cloning yields another handle onto the same run.
pub struct SimulationRunner<S: Scheduler + 'static> {
    shared: Arc<Shared<S>>,
}

impl<S: Scheduler + 'static> Clone for SimulationRunner<S> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<S: Scheduler + 'static> SimulationRunner<S> {
    /// Runner drawing step durations from the configured random range.
    pub fn new(
        graph: WorkflowGraph,
        scheduler: S,
        observer: Arc<dyn SimulationObserver>,
        config: SimulationConfig,
    ) -> Self {
        let durations = Box::new(RandomDurations::from_config(&config));
        Self::with_durations(graph, scheduler, observer, config, durations)
    }

    pub fn with_durations(
        graph: WorkflowGraph,
        scheduler: S,
        observer: Arc<dyn SimulationObserver>,
        config: SimulationConfig,
        durations: Box<dyn DurationSource>,
    ) -> Self {
        let playback = Playback {
            steps: Vec::new(),
            cursor: 0,
            state: RunnerState::Idle,
            speed: Speed::default(),
            generation: 0,
            pending: None,
            durations,
        };
        Self {
            shared: Arc::new(Shared {
                graph,
                scheduler,
                observer,
                config,
                playback: Mutex::new(playback),
            }),
        }
    }

    /// Regenerate the steps and play from the first one.
    #[instrument(skip(self))]
    pub fn start(&self) {
        let generation = {
            let mut playback = self.shared.lock();
            playback.disarm();
            let origin = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
            let durations = playback.durations.as_mut();
            playback.steps = generate_steps(&self.shared.graph, durations, origin);
            playback.cursor = 0;
            playback.state = RunnerState::Running;
            info!(steps = playback.steps.len(), speed = %playback.speed, "simulation started");
            playback.generation
        };
        self.shared.advance(generation);
    }

    /// Stop after the step already emitted; the cursor is kept.
    #[instrument(skip(self))]
    pub fn pause(&self) {
        let mut playback = self.shared.lock();
        if playback.state == RunnerState::Running {
            playback.disarm();
            playback.state = RunnerState::Paused;
            debug!(cursor = playback.cursor, "simulation paused");
        }
    }

    /// Continue from the retained cursor, emitting the next step immediately.
    #[instrument(skip(self))]
    pub fn resume(&self) {
        let generation = {
            let mut playback = self.shared.lock();
            if playback.state != RunnerState::Paused {
                return;
            }
            playback.state = RunnerState::Running;
            debug!(cursor = playback.cursor, "simulation resumed");
            playback.generation
        };
        self.shared.advance(generation);
    }

    /// Cancel any pending advance, rewind, and clear highlights.
    ///
    /// Safe to call at any time, including from an observer callback.
    #[instrument(skip(self))]
    pub fn reset(&self) {
        {
            let mut playback = self.shared.lock();
            playback.disarm();
            playback.cursor = 0;
            playback.state = RunnerState::Idle;
        }
        self.shared.observer.on_node_activate(None);
        self.shared.observer.on_edge_activate(None);
    }

    /// Takes effect from the next scheduled advance.
    pub fn set_speed(&self, speed: Speed) {
        self.shared.lock().speed = speed;
    }

    pub fn speed(&self) -> Speed {
        self.shared.lock().speed
    }

    pub fn state(&self) -> RunnerState {
        self.shared.lock().state
    }

    /// Index of the next step to emit.
    pub fn cursor(&self) -> usize {
        self.shared.lock().cursor
    }

    pub fn steps(&self) -> Vec<SimulationStep> {
        self.shared.lock().steps.clone()
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.shared.graph
    }
}

impl<S: Scheduler + 'static> fmt::Debug for SimulationRunner<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let playback = self.shared.lock();
        f.debug_struct("SimulationRunner")
            .field("state", &playback.state)
            .field("cursor", &playback.cursor)
            .field("steps", &playback.steps.len())
            .field("speed", &playback.speed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use nodes::{EndData, NodeKind, StartData, TaskData};
    use scheduler::{ManualScheduler, TokioScheduler};

    use crate::models::{Edge, Node, Position};
    use crate::steps::FixedDurations;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Step(StepStatus, Option<String>),
        Node(Option<String>),
        Edge(Option<String>),
        Complete,
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn steps(&self) -> usize {
            self.events().iter().filter(|e| matches!(e, Event::Step(..))).count()
        }

        fn completions(&self) -> usize {
            self.events().iter().filter(|e| **e == Event::Complete).count()
        }

        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl SimulationObserver for Recorder {
        fn on_step(&self, step: &SimulationStep) {
            self.push(Event::Step(step.status, step.node_id.clone()));
        }
        fn on_complete(&self) {
            self.push(Event::Complete);
        }
        fn on_node_activate(&self, node_id: Option<&str>) {
            self.push(Event::Node(node_id.map(str::to_owned)));
        }
        fn on_edge_activate(&self, edge_id: Option<&str>) {
            self.push(Event::Edge(edge_id.map(str::to_owned)));
        }
    }

    fn linear_graph() -> WorkflowGraph {
        WorkflowGraph::new(
            vec![
                Node::new("s", NodeKind::Start(StartData::default()), Position::default()),
                Node::new("t", NodeKind::Task(TaskData::default()), Position::default()),
                Node::new("e", NodeKind::End(EndData::default()), Position::default()),
            ],
            vec![Edge::new("s-t", "s", "t"), Edge::new("t-e", "t", "e")],
        )
    }

    fn runner(
        graph: WorkflowGraph,
    ) -> (SimulationRunner<ManualScheduler>, ManualScheduler, Arc<Recorder>) {
        let clock = ManualScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let runner = SimulationRunner::with_durations(
            graph,
            clock.clone(),
            recorder.clone(),
            SimulationConfig::default(),
            Box::new(FixedDurations(100)),
        );
        (runner, clock, recorder)
    }

    #[test]
    fn start_emits_first_step_immediately() {
        let (runner, clock, recorder) = runner(linear_graph());
        runner.start();

        assert_eq!(
            recorder.events(),
            vec![
                Event::Step(StepStatus::Executing, Some("s".into())),
                Event::Node(Some("s".into())),
            ]
        );
        assert_eq!(runner.cursor(), 1);
        assert_eq!(runner.state(), RunnerState::Running);
        assert_eq!(clock.next_due(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn full_run_highlights_edges_and_completes_once() {
        let (runner, clock, recorder) = runner(linear_graph());
        runner.start();
        clock.run_until_idle();

        let events = recorder.events();
        assert_eq!(recorder.steps(), 6);
        assert!(events.contains(&Event::Edge(Some("s-t".into()))));
        assert!(events.contains(&Event::Edge(Some("t-e".into()))));
        assert_eq!(
            &events[events.len() - 3..],
            &[Event::Node(None), Event::Edge(None), Event::Complete]
        );
        assert_eq!(recorder.completions(), 1);
        assert_eq!(runner.state(), RunnerState::Completed);

        // Nothing left to fire.
        assert_eq!(clock.run_until_idle(), 0);
        assert_eq!(recorder.completions(), 1);
    }

    #[test]
    fn speed_controls_delay_between_steps() {
        let (runner, clock, recorder) = runner(linear_graph());
        runner.set_speed(Speed::Fast);
        runner.start();

        clock.advance(Duration::from_millis(499));
        assert_eq!(recorder.steps(), 1);
        clock.advance(Duration::from_millis(1));
        assert_eq!(recorder.steps(), 2);

        runner.set_speed(Speed::Slow);
        // The advance armed at fast speed still fires at 500 ms.
        clock.advance(Duration::from_millis(500));
        assert_eq!(recorder.steps(), 3);
        clock.advance(Duration::from_millis(1999));
        assert_eq!(recorder.steps(), 3);
        clock.advance(Duration::from_millis(1));
        assert_eq!(recorder.steps(), 4);
    }

    #[test]
    fn pause_holds_cursor_and_resume_continues() {
        let (runner, clock, recorder) = runner(linear_graph());
        runner.start();
        clock.advance(Duration::from_millis(1000));
        runner.pause();

        assert_eq!(runner.state(), RunnerState::Paused);
        assert_eq!(runner.cursor(), 2);
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.advance(Duration::from_secs(10)), 0);
        assert_eq!(recorder.steps(), 2);

        runner.resume();
        assert_eq!(recorder.steps(), 3);
        assert_eq!(runner.cursor(), 3);

        clock.run_until_idle();
        assert_eq!(recorder.steps(), 6);
        assert_eq!(recorder.completions(), 1);
    }

    #[test]
    fn pause_and_resume_after_last_step_completes_once() {
        let (runner, clock, recorder) = runner(linear_graph());
        runner.start();
        clock.advance(Duration::from_millis(5000));
        assert_eq!(recorder.steps(), 6);
        assert_eq!(recorder.completions(), 0);

        runner.pause();
        assert_eq!(clock.advance(Duration::from_secs(10)), 0);
        assert_eq!(recorder.completions(), 0);

        runner.resume();
        assert_eq!(recorder.completions(), 1);
        assert_eq!(runner.state(), RunnerState::Completed);

        // Completed runs ignore further pause and resume calls.
        runner.pause();
        runner.resume();
        assert_eq!(clock.run_until_idle(), 0);
        assert_eq!(recorder.steps(), 6);
        assert_eq!(recorder.completions(), 1);
    }

    #[test]
    fn reset_cancels_and_clears_highlights() {
        let (runner, clock, recorder) = runner(linear_graph());
        runner.start();
        runner.reset();

        assert_eq!(runner.state(), RunnerState::Idle);
        assert_eq!(runner.cursor(), 0);
        assert_eq!(clock.run_until_idle(), 0);
        let events = recorder.events();
        assert_eq!(&events[events.len() - 2..], &[Event::Node(None), Event::Edge(None)]);
        assert_eq!(recorder.completions(), 0);
    }

    #[test]
    fn reset_from_inside_a_callback_stops_the_run() {
        struct ResetOnSecondStep {
            inner: Recorder,
            runner: Mutex<Option<SimulationRunner<ManualScheduler>>>,
        }

        impl SimulationObserver for ResetOnSecondStep {
            fn on_step(&self, step: &SimulationStep) {
                self.inner.on_step(step);
                if self.inner.steps() == 2 {
                    if let Some(runner) = self.runner.lock().unwrap().as_ref() {
                        runner.reset();
                    }
                }
            }
            fn on_complete(&self) {
                self.inner.on_complete();
            }
            fn on_node_activate(&self, node_id: Option<&str>) {
                self.inner.on_node_activate(node_id);
            }
            fn on_edge_activate(&self, edge_id: Option<&str>) {
                self.inner.on_edge_activate(edge_id);
            }
        }

        let clock = ManualScheduler::new();
        let observer = Arc::new(ResetOnSecondStep {
            inner: Recorder::default(),
            runner: Mutex::new(None),
        });
        let runner = SimulationRunner::with_durations(
            linear_graph(),
            clock.clone(),
            observer.clone(),
            SimulationConfig::default(),
            Box::new(FixedDurations(100)),
        );
        *observer.runner.lock().unwrap() = Some(runner.clone());

        runner.start();
        clock.run_until_idle();

        assert_eq!(observer.inner.steps(), 2);
        assert_eq!(observer.inner.completions(), 0);
        assert_eq!(runner.state(), RunnerState::Idle);
        assert_eq!(clock.pending(), 0);

        // Break the observer -> runner cycle.
        observer.runner.lock().unwrap().take();
    }

    #[test]
    fn restart_discards_the_previous_run() {
        let (runner, clock, recorder) = runner(linear_graph());
        runner.start();
        clock.advance(Duration::from_millis(1000));
        runner.start();

        // Only the new run's timer is live.
        assert_eq!(clock.pending(), 1);
        clock.run_until_idle();
        assert_eq!(recorder.steps(), 2 + 6);
        assert_eq!(recorder.completions(), 1);
    }

    #[test]
    fn graph_without_start_fails_then_completes() {
        let (runner, clock, recorder) = runner(WorkflowGraph::default());
        runner.start();
        clock.run_until_idle();

        let events = recorder.events();
        assert_eq!(events[0], Event::Step(StepStatus::Failed, None));
        // Failed steps do not highlight anything.
        assert_eq!(events[1..], [Event::Node(None), Event::Edge(None), Event::Complete]);
    }

    #[test]
    fn speed_parses_case_insensitively() {
        assert_eq!("FAST".parse::<Speed>(), Ok(Speed::Fast));
        assert!("warp".parse::<Speed>().is_err());
        assert_eq!(Speed::default(), Speed::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_on_tokio_timers() {
        let recorder = Arc::new(Recorder::default());
        let runner = SimulationRunner::with_durations(
            linear_graph(),
            TokioScheduler::current().expect("inside runtime"),
            recorder.clone(),
            SimulationConfig::default(),
            Box::new(FixedDurations(100)),
        );
        runner.set_speed(Speed::Fast);
        runner.start();

        tokio::time::sleep(Duration::from_millis(1250)).await;
        assert_eq!(recorder.steps(), 3);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.steps(), 6);
        assert_eq!(recorder.completions(), 1);
        assert_eq!(runner.state(), RunnerState::Completed);
    }
}
