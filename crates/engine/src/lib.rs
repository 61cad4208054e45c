//! `engine` crate — workflow graph model, validation, simulation and the
//! editing store.

pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod layout;
pub mod metrics;
pub mod models;
pub mod simulation;
pub mod snapshot;
pub mod steps;
pub mod store;
pub mod validation;

pub use catalog::Automation;
pub use config::{EngineConfig, HistoryConfig, SimulationConfig};
pub use error::{EngineError, ImportError};
pub use history::History;
pub use layout::{LayeredLayout, LayoutDirection, LayoutEngine};
pub use metrics::{edge_stats, format_duration, EdgeStats, PassRateBand, WorkflowMetrics};
pub use models::{Edge, EdgeData, EdgeId, EdgeMetrics, Node, NodeId, Position, WorkflowGraph};
pub use simulation::{RunnerState, SimulationObserver, SimulationRunner, Speed};
pub use snapshot::{export_snapshot, import_snapshot, ExportedWorkflow};
pub use steps::{generate_steps, DurationSource, RandomDurations, SimulationStep, StepStatus};
pub use store::{SharedStore, SimulationState, StoreEvent, SubscriptionId, WorkflowStore};
pub use validation::{validate, ValidationError, ValidationReport};

#[cfg(test)]
mod store_tests;
