//! Tuning knobs for simulation playback and undo history.

use std::ops::Range;
use std::time::Duration;

use crate::simulation::Speed;

/// Playback timing.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Delay between emitted steps at [`Speed::Slow`].
    pub slow_delay: Duration,
    /// Delay between emitted steps at [`Speed::Normal`].
    pub normal_delay: Duration,
    /// Delay between emitted steps at [`Speed::Fast`].
    pub fast_delay: Duration,
    /// Range the simulated per-node duration (ms) is drawn from.
    pub step_duration_ms: Range<u64>,
    /// Seed for the duration source; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn delay_for(&self, speed: Speed) -> Duration {
        match speed {
            Speed::Slow   => self.slow_delay,
            Speed::Normal => self.normal_delay,
            Speed::Fast   => self.fast_delay,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            slow_delay: Duration::from_millis(2000),
            normal_delay: Duration::from_millis(1000),
            fast_delay: Duration::from_millis(500),
            step_duration_ms: 500..1500,
            seed: None,
        }
    }
}

/// Undo history sizing.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept; the oldest is evicted first.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

/// Everything the store and runner can be tuned with.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub simulation: SimulationConfig,
    pub history: HistoryConfig,
}
