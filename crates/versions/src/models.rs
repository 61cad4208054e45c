//! Persisted shapes. These carry no behaviour beyond conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use engine::{Edge, Node, WorkflowGraph};

/// A named, timestamped copy of a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowVersion {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl WorkflowVersion {
    pub fn graph(&self) -> WorkflowGraph {
        WorkflowGraph::new(self.nodes.clone(), self.edges.clone())
    }
}

/// Element counts that differ between two graphs, matched by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub nodes_changed: usize,
    pub edges_added: usize,
    pub edges_removed: usize,
    pub edges_changed: usize,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
