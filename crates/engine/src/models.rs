//! Core domain models for the workflow designer.
//!
//! These types are the source of truth for what a workflow graph looks like
//! in memory. They serialize to the snapshot shape used by export/import:
//! a node is `{"id", "kind", "position", "data"}` with the shared and the
//! kind-specific fields side by side inside `data`.

use std::collections::HashMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use nodes::{BaseData, KindTag, NodeError, NodeKind};

pub type NodeId = String;
pub type EdgeId = String;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Canvas coordinates of a node's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single step in the workflow graph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    /// Unique identifier within this workflow (referenced by edges).
    pub id: NodeId,
    pub position: Position,
    /// Label, description and transient simulation flags.
    pub base: BaseData,
    /// Kind discriminant plus the kind-specific record.
    pub kind: NodeKind,
}

impl Node {
    /// A node with the default label of its kind.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Position) -> Self {
        let label = kind.tag().default_label();
        Self {
            id: id.into(),
            position,
            base: BaseData::labelled(label),
            kind,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.label = label.into();
        self
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    pub fn label(&self) -> &str {
        &self.base.label
    }
}

/// Wire shape of a node before its `data` is split by kind.
#[derive(Deserialize)]
struct RawNode {
    id: String,
    kind: String,
    position: Position,
    #[serde(default)]
    data: Value,
}

impl TryFrom<RawNode> for Node {
    type Error = NodeError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let tag: KindTag = raw.kind.parse()?;
        let base = if raw.data.is_null() {
            BaseData::default()
        } else {
            BaseData::deserialize(&raw.data).map_err(|e| NodeError::InvalidData {
                kind: tag.to_string(),
                message: e.to_string(),
            })?
        };
        let kind = NodeKind::decode(tag, &raw.data)?;

        Ok(Self {
            id: raw.id,
            position: raw.position,
            base,
            kind,
        })
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Data<'a> {
            #[serde(flatten)]
            base: &'a BaseData,
            #[serde(flatten)]
            kind: &'a NodeKind,
        }

        let mut node = serializer.serialize_struct("Node", 4)?;
        node.serialize_field("id", &self.id)?;
        node.serialize_field("kind", &self.kind.tag())?;
        node.serialize_field("position", &self.position)?;
        node.serialize_field("data", &Data { base: &self.base, kind: &self.kind })?;
        node.end()
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Optional annotations on an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Fraction in `[0.0, 1.0]`. Out-of-range values are flagged by validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Named colour swatch picked in the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<EdgeMetrics>,
}

/// Observed throughput of an edge, as recorded by a monitoring source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetrics {
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_time: Option<f64>,
    /// Percentage in `[0, 100]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
}

impl EdgeData {
    /// Probability if set, else weight, else `1.0`.
    pub fn effective_weight(&self) -> f64 {
        self.probability.or(self.weight).unwrap_or(1.0)
    }
}

/// Directed edge from one node to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            data: EdgeData::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowGraph
// ---------------------------------------------------------------------------

/// The `(nodes, edges)` pair under edit.
///
/// Insertion order is kept for display. Uniqueness of ids and validity of
/// edge endpoints are not enforced here; the validation engine reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn start_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind.is_start())
    }

    /// First edge going from `source` to `target`.
    pub fn edge_between(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.source == source && e.target == target)
    }

    /// Remove a node and every edge touching it.
    ///
    /// Returns the removed node and the number of cascaded edges.
    pub fn remove_node(&mut self, id: &str) -> Option<(Node, usize)> {
        let idx = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(idx);
        let before = self.edges.len();
        self.edges.retain(|e| e.source != id && e.target != id);
        Some((node, before - self.edges.len()))
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let idx = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(idx))
    }

    /// Clear `is_executing` / `is_completed` on every node.
    pub fn clear_simulation_flags(&mut self) {
        for node in &mut self.nodes {
            node.base.clear_simulation_flags();
        }
    }

    /// Build the incoming/outgoing edge index in one pass.
    pub fn adjacency(&self) -> Adjacency<'_> {
        Adjacency::build(self)
    }
}

// ---------------------------------------------------------------------------
// Adjacency
// ---------------------------------------------------------------------------

/// Incoming and outgoing edge lists keyed by node id, in edge order.
///
/// Edges with dangling endpoints are indexed under the missing id like any
/// other; traversals must check the target exists before following it.
#[derive(Debug, Default)]
pub struct Adjacency<'a> {
    outgoing: HashMap<&'a str, Vec<&'a Edge>>,
    incoming: HashMap<&'a str, Vec<&'a Edge>>,
}

impl<'a> Adjacency<'a> {
    fn build(graph: &'a WorkflowGraph) -> Self {
        let mut adjacency = Self::default();
        for edge in &graph.edges {
            adjacency.outgoing.entry(edge.source.as_str()).or_default().push(edge);
            adjacency.incoming.entry(edge.target.as_str()).or_default().push(edge);
        }
        adjacency
    }

    pub fn outgoing(&self, id: &str) -> &[&'a Edge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, id: &str) -> &[&'a Edge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.outgoing(id).len()
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.incoming(id).len()
    }
}
