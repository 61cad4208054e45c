//! Linearizes a workflow graph into the step sequence a simulation replays.

use std::collections::{HashSet, VecDeque};
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::models::{NodeId, WorkflowGraph};

pub const NO_START_MESSAGE: &str = "No start node found in workflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Executing,
    Completed,
    Failed,
    Skipped,
}

/// One entry of a simulation trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStep {
    /// `None` only for the failed step of a graph without a start node.
    pub node_id: Option<NodeId>,
    /// Logical milliseconds; the origin is chosen by the caller.
    pub timestamp: u64,
    pub status: StepStatus,
    pub message: String,
    /// Simulated execution time in ms, set on `Executing` steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

// ---------------------------------------------------------------------------
// Duration sources
// ---------------------------------------------------------------------------

/// Supplies the simulated execution time of each visited node.
pub trait DurationSource: Send {
    /// Milliseconds for the next executed node.
    fn next_duration(&mut self) -> u64;
}

/// Uniform draw from a range, backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct RandomDurations {
    rng: StdRng,
    range: Range<u64>,
}

impl RandomDurations {
    pub fn new(range: Range<u64>) -> Self {
        Self { rng: StdRng::from_entropy(), range }
    }

    pub fn seeded(range: Range<u64>, seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), range }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        let range = config.step_duration_ms.clone();
        match config.seed {
            Some(seed) => Self::seeded(range, seed),
            None => Self::new(range),
        }
    }
}

impl DurationSource for RandomDurations {
    fn next_duration(&mut self) -> u64 {
        if self.range.is_empty() {
            return self.range.start;
        }
        self.rng.gen_range(self.range.clone())
    }
}

/// Always the same duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurations(pub u64);

impl DurationSource for FixedDurations {
    fn next_duration(&mut self) -> u64 {
        self.0
    }
}

/// Replays a fixed list of durations, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedDurations {
    script: Vec<u64>,
    next: usize,
}

impl ScriptedDurations {
    pub fn new(script: Vec<u64>) -> Self {
        Self { script, next: 0 }
    }
}

impl DurationSource for ScriptedDurations {
    fn next_duration(&mut self) -> u64 {
        if self.script.is_empty() {
            return 0;
        }
        let value = self.script[self.next % self.script.len()];
        self.next += 1;
        value
    }
}

// ---------------------------------------------------------------------------
// generate_steps
// ---------------------------------------------------------------------------

/// Breadth-first walk from the first start node.
///
/// Each visited node yields an `Executing` step followed by a `Completed`
/// step; successors are queued in edge order, except past an end node. A
/// node is visited at most once, so cycles terminate and parallel branches
/// are interleaved level by level.
pub fn generate_steps(
    graph: &WorkflowGraph,
    durations: &mut dyn DurationSource,
    origin: u64,
) -> Vec<SimulationStep> {
    let Some(start) = graph.start_nodes().next() else {
        return vec![SimulationStep {
            node_id: None,
            timestamp: origin,
            status: StepStatus::Failed,
            message: NO_START_MESSAGE.to_owned(),
            duration: None,
        }];
    };

    let adjacency = graph.adjacency();
    let mut steps = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([start.id.as_str()]);
    let mut timestamp = origin;

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        let Some(node) = graph.node(current) else {
            continue;
        };

        let duration = durations.next_duration();
        steps.push(SimulationStep {
            node_id: Some(node.id.clone()),
            timestamp,
            status: StepStatus::Executing,
            message: format!("Executing: {}", node.label()),
            duration: Some(duration),
        });
        timestamp += duration;
        steps.push(SimulationStep {
            node_id: Some(node.id.clone()),
            timestamp,
            status: StepStatus::Completed,
            message: format!("Completed: {}", node.label()),
            duration: None,
        });

        if node.kind.is_end() {
            continue;
        }
        for edge in adjacency.outgoing(current) {
            let target = edge.target.as_str();
            if !visited.contains(target) && graph.contains_node(target) {
                queue.push_back(target);
            }
        }
    }

    steps
}
