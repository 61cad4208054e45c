//! Workflow validation — re-run after every graph mutation.
//!
//! Rules checked, in order:
//! 1. Identity: node IDs are unique, edges reference existing nodes,
//!    edge probabilities are fractions.
//! 2. Exactly one Start node, at least one End node.
//! 3. Per-node field rules, dispatched by kind (see [`nodes::FieldCheck`]),
//!    plus "End nodes have no outgoing edges".
//! 4. Connectivity: isolated nodes and one-sided dangling ends.
//! 5. Reachability from the Start node (breadth-first).
//! 6. Cycles (depth-first, one aggregate warning).
//!
//! Every rule runs on every call; problems are collected, never short-circuited.
//! Only `Error` severity blocks simulation.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use nodes::{check_node, Severity};

use crate::models::{Adjacency, EdgeId, NodeId, WorkflowGraph};

pub const NO_START: &str = "NO_START";
pub const MULTIPLE_STARTS: &str = "MULTIPLE_STARTS";
pub const NO_END: &str = "NO_END";
pub const DUPLICATE_NODE_ID: &str = "DUPLICATE_NODE_ID";
pub const EDGE_DANGLING: &str = "EDGE_DANGLING";
pub const EDGE_PROBABILITY_OUT_OF_RANGE: &str = "EDGE_PROBABILITY_OUT_OF_RANGE";
pub const END_HAS_OUTGOING: &str = "END_HAS_OUTGOING";
pub const NODE_IS_ORPHANED: &str = "NODE_IS_ORPHANED";
pub const NODE_NO_INCOMING: &str = "NODE_NO_INCOMING";
pub const NODE_NO_OUTGOING: &str = "NODE_NO_OUTGOING";
pub const NODE_UNREACHABLE: &str = "NODE_UNREACHABLE";
pub const CYCLE_DETECTED: &str = "CYCLE_DETECTED";

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// One structural finding about the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<EdgeId>,
    pub severity: Severity,
    /// Stable identifier such as `NO_START` or `CYCLE_DETECTED`.
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    fn global(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self { node_id: None, edge_id: None, severity, code, message: message.into() }
    }

    fn on_node(
        node_id: &str,
        severity: Severity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id: Some(node_id.to_owned()),
            edge_id: None,
            severity,
            code,
            message: message.into(),
        }
    }

    fn on_edge(
        edge_id: &str,
        severity: Severity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id: None,
            edge_id: Some(edge_id.to_owned()),
            severity,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Check the graph against every structural rule.
///
/// Pure and deterministic. The order of the returned list carries no meaning.
pub fn validate(graph: &WorkflowGraph) -> Vec<ValidationError> {
    let mut issues = Vec::new();
    let adjacency = graph.adjacency();

    check_identity(graph, &mut issues);
    check_cardinality(graph, &mut issues);
    check_fields(graph, &adjacency, &mut issues);
    check_connectivity(graph, &adjacency, &mut issues);
    check_reachability(graph, &adjacency, &mut issues);

    if has_cycle(graph, &adjacency) {
        issues.push(ValidationError::global(
            Severity::Warning,
            CYCLE_DETECTED,
            "Cycle detected in the workflow. Ensure loops are intentional; \
             simulation visits each node once.",
        ));
    }

    issues
}

fn check_identity(graph: &WorkflowGraph, issues: &mut Vec<ValidationError>) {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            issues.push(ValidationError::on_node(
                &node.id,
                Severity::Error,
                DUPLICATE_NODE_ID,
                format!("Node ID '{}' is used by more than one node.", node.id),
            ));
        }
    }

    for edge in &graph.edges {
        for (side, endpoint) in [("source", &edge.source), ("target", &edge.target)] {
            if !seen_ids.contains(endpoint.as_str()) {
                issues.push(ValidationError::on_edge(
                    &edge.id,
                    Severity::Error,
                    EDGE_DANGLING,
                    format!("Edge {side} '{endpoint}' does not refer to an existing node."),
                ));
            }
        }

        if let Some(p) = edge.data.probability {
            if !(0.0..=1.0).contains(&p) {
                issues.push(ValidationError::on_edge(
                    &edge.id,
                    Severity::Warning,
                    EDGE_PROBABILITY_OUT_OF_RANGE,
                    format!("Edge probability {p} is outside 0.0 to 1.0."),
                ));
            }
        }
    }
}

fn check_cardinality(graph: &WorkflowGraph, issues: &mut Vec<ValidationError>) {
    match graph.start_nodes().count() {
        0 => issues.push(ValidationError::global(
            Severity::Error,
            NO_START,
            "Workflow must contain a Start node.",
        )),
        1 => {}
        _ => issues.push(ValidationError::global(
            Severity::Warning,
            MULTIPLE_STARTS,
            "Multiple Start nodes detected. Recommended: only one Start node.",
        )),
    }

    // An empty canvas only reports the missing start.
    if !graph.nodes.is_empty() && !graph.nodes.iter().any(|n| n.kind.is_end()) {
        issues.push(ValidationError::global(
            Severity::Warning,
            NO_END,
            "Workflow has no End node.",
        ));
    }
}

fn check_fields(
    graph: &WorkflowGraph,
    adjacency: &Adjacency<'_>,
    issues: &mut Vec<ValidationError>,
) {
    for node in &graph.nodes {
        for finding in check_node(&node.base, &node.kind) {
            issues.push(ValidationError::on_node(
                &node.id,
                finding.severity,
                finding.code,
                finding.message,
            ));
        }

        if node.kind.is_end() && adjacency.out_degree(&node.id) > 0 {
            issues.push(ValidationError::on_node(
                &node.id,
                Severity::Error,
                END_HAS_OUTGOING,
                "End node must not have outgoing connections.",
            ));
        }
    }
}

fn check_connectivity(
    graph: &WorkflowGraph,
    adjacency: &Adjacency<'_>,
    issues: &mut Vec<ValidationError>,
) {
    for node in &graph.nodes {
        let incoming = adjacency.in_degree(&node.id);
        let outgoing = adjacency.out_degree(&node.id);

        if incoming == 0 && outgoing == 0 {
            issues.push(ValidationError::on_node(
                &node.id,
                Severity::Warning,
                NODE_IS_ORPHANED,
                "This node is not connected to the workflow (no incoming and no outgoing edges).",
            ));
        } else if incoming == 0 && !node.kind.is_start() {
            issues.push(ValidationError::on_node(
                &node.id,
                Severity::Warning,
                NODE_NO_INCOMING,
                "This node has no incoming edges.",
            ));
        } else if outgoing == 0 && !node.kind.is_end() {
            issues.push(ValidationError::on_node(
                &node.id,
                Severity::Warning,
                NODE_NO_OUTGOING,
                "This node has no outgoing edges; the workflow stops here.",
            ));
        }
    }
}

fn check_reachability(
    graph: &WorkflowGraph,
    adjacency: &Adjacency<'_>,
    issues: &mut Vec<ValidationError>,
) {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for start in graph.start_nodes() {
        if visited.insert(start.id.as_str()) {
            queue.push_back(start.id.as_str());
        }
    }
    if queue.is_empty() {
        return;
    }

    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    while let Some(current) = queue.pop_front() {
        for edge in adjacency.outgoing(current) {
            let target = edge.target.as_str();
            if node_ids.contains(target) && visited.insert(target) {
                queue.push_back(target);
            }
        }
    }

    for node in &graph.nodes {
        if !node.kind.is_start() && !visited.contains(node.id.as_str()) {
            issues.push(ValidationError::on_node(
                &node.id,
                Severity::Warning,
                NODE_UNREACHABLE,
                "This node cannot be reached from the Start node.",
            ));
        }
    }
}

/// Depth-first search with an explicit stack; a back edge to a node still on
/// the stack means the graph has a cycle.
fn has_cycle(graph: &WorkflowGraph, adjacency: &Adjacency<'_>) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        OnStack,
        Done,
    }

    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    for root in &graph.nodes {
        if marks.contains_key(root.id.as_str()) {
            continue;
        }

        // (node, index of the next outgoing edge to follow)
        let mut stack: Vec<(&str, usize)> = vec![(root.id.as_str(), 0)];
        marks.insert(root.id.as_str(), Mark::OnStack);

        while let Some(frame) = stack.last_mut() {
            let (current, next) = *frame;
            let outgoing = adjacency.outgoing(current);

            if next >= outgoing.len() {
                marks.insert(current, Mark::Done);
                stack.pop();
                continue;
            }
            frame.1 += 1;

            let target = outgoing[next].target.as_str();
            if !node_ids.contains(target) {
                continue;
            }
            match marks.get(target) {
                Some(Mark::OnStack) => return true,
                Some(Mark::Done) => {}
                None => {
                    marks.insert(target, Mark::OnStack);
                    stack.push((target, 0));
                }
            }
        }
    }

    false
}

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

/// Validation result with the lookups the editor needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationError>,
}

/// Issues attached to a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStatus<'a> {
    pub is_valid: bool,
    pub has_warnings: bool,
    pub issues: Vec<&'a ValidationError>,
}

impl ValidationReport {
    pub fn from_graph(graph: &WorkflowGraph) -> Self {
        Self { issues: validate(graph) }
    }

    pub fn issues(&self) -> &[ValidationError] {
        &self.issues
    }

    /// True iff there is no `Error`-severity issue; warnings never block.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    pub fn for_node<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.issues.iter().filter(move |i| i.node_id.as_deref() == Some(node_id))
    }

    pub fn node_status(&self, node_id: &str) -> NodeStatus<'_> {
        let issues: Vec<&ValidationError> = self
            .issues
            .iter()
            .filter(|i| i.node_id.as_deref() == Some(node_id))
            .collect();
        NodeStatus {
            is_valid: !issues.iter().any(|i| i.is_error()),
            has_warnings: issues.iter().any(|i| !i.is_error()),
            issues,
        }
    }

    /// Issues tied to neither a node nor an edge.
    pub fn global(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter(|i| i.node_id.is_none() && i.edge_id.is_none())
    }
}
