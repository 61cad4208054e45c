//! JSON export and import of a whole workflow.
//!
//! Import checks the raw shape first so that a bad file is rejected with a
//! precise reason, then decodes into typed nodes and edges. Nothing is
//! partially applied: the caller receives a complete graph or an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ImportError;
use crate::models::{Edge, Node, WorkflowGraph};

pub const SNAPSHOT_VERSION: &str = "1.0";

/// On-disk form of an exported workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedWorkflow {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl ExportedWorkflow {
    pub fn into_graph(self) -> WorkflowGraph {
        WorkflowGraph::new(self.nodes, self.edges)
    }
}

pub fn export_snapshot(graph: &WorkflowGraph) -> ExportedWorkflow {
    ExportedWorkflow {
        version: SNAPSHOT_VERSION.to_owned(),
        exported_at: Utc::now(),
        nodes: graph.nodes.clone(),
        edges: graph.edges.clone(),
    }
}

/// Pretty-printed JSON of [`export_snapshot`].
pub fn export_json(graph: &WorkflowGraph) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export_snapshot(graph))
}

/// Rebuild a graph from a parsed snapshot.
///
/// `version` and `exportedAt` are informational and not required.
///
/// # Errors
/// [`ImportError`] naming the first shape violation found, or the decoding
/// failure of a node or edge.
pub fn import_snapshot(value: &Value) -> Result<WorkflowGraph, ImportError> {
    let object = value.as_object().ok_or(ImportError::NotAnObject)?;
    let nodes = list(object, "nodes")?;
    let edges = list(object, "edges")?;

    for (index, node) in nodes.iter().enumerate() {
        check_node_shape(node).map_err(|reason| ImportError::MalformedNode { index, reason })?;
    }
    for (index, edge) in edges.iter().enumerate() {
        check_edge_shape(edge).map_err(|reason| ImportError::MalformedEdge { index, reason })?;
    }

    let nodes: Vec<Node> =
        serde_json::from_value(Value::Array(nodes.clone())).map_err(ImportError::Decode)?;
    let edges: Vec<Edge> =
        serde_json::from_value(Value::Array(edges.clone())).map_err(ImportError::Decode)?;
    Ok(WorkflowGraph::new(nodes, edges))
}

/// Parse then [`import_snapshot`].
pub fn import_json(text: &str) -> Result<WorkflowGraph, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
    import_snapshot(&value).inspect_err(|e| warn!(error = %e, "snapshot rejected"))
}

fn list<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Vec<Value>, ImportError> {
    object
        .get(key)
        .and_then(Value::as_array)
        .ok_or(ImportError::MissingList(key))
}

fn check_node_shape(node: &Value) -> Result<(), &'static str> {
    let node = node.as_object().ok_or("not an object")?;
    if !node.get("id").is_some_and(Value::is_string) {
        return Err("missing string 'id'");
    }
    if !node.get("kind").is_some_and(Value::is_string) {
        return Err("missing string 'kind'");
    }
    if !node.get("position").is_some_and(Value::is_object) {
        return Err("missing object 'position'");
    }
    Ok(())
}

fn check_edge_shape(edge: &Value) -> Result<(), &'static str> {
    let edge = edge.as_object().ok_or("not an object")?;
    for (key, reason) in [
        ("id", "missing string 'id'"),
        ("source", "missing string 'source'"),
        ("target", "missing string 'target'"),
    ] {
        if !edge.get(key).is_some_and(Value::is_string) {
            return Err(reason);
        }
    }
    Ok(())
}
