//! Automatic node placement.
//!
//! The designer treats layout as a pluggable strategy: anything implementing
//! [`LayoutEngine`] maps node ids to new top-left positions. [`LayeredLayout`]
//! is the built-in strategy: nodes are ranked by longest path from the
//! sources, each rank becomes a row (or a column for `LR`), and rows are
//! centred on the widest one.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Node, NodeId, Position, WorkflowGraph};

pub const NODE_WIDTH: f64 = 220.0;
pub const NODE_HEIGHT: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutDirection {
    /// Ranks flow downwards.
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    /// Ranks flow to the right.
    #[serde(rename = "LR")]
    LeftRight,
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TopBottom => "TB",
            Self::LeftRight => "LR",
        })
    }
}

impl FromStr for LayoutDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TB" => Ok(Self::TopBottom),
            "LR" => Ok(Self::LeftRight),
            other => Err(format!("unknown layout direction '{other}' (expected TB or LR)")),
        }
    }
}

/// Computes positions for the nodes of a graph.
///
/// Nodes missing from the returned map keep their current position.
pub trait LayoutEngine {
    fn layout(
        &self,
        graph: &WorkflowGraph,
        direction: LayoutDirection,
    ) -> HashMap<NodeId, Position>;
}

/// Rank-based layout with fixed node boxes.
#[derive(Debug, Clone)]
pub struct LayeredLayout {
    pub node_width: f64,
    pub node_height: f64,
    /// Gap between neighbours in the same rank.
    pub node_sep: f64,
    /// Gap between consecutive ranks.
    pub rank_sep: f64,
    pub margin: f64,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            node_sep: 80.0,
            rank_sep: 100.0,
            margin: 50.0,
        }
    }
}

impl LayeredLayout {
    /// Longest-path rank of every node, indexed like `graph.nodes`.
    ///
    /// Nodes on a cycle never reach in-degree zero; they are ranked one past
    /// their highest already-ranked predecessor, in insertion order.
    fn ranks(graph: &WorkflowGraph) -> Vec<usize> {
        let index: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
        let mut in_degree = vec![0usize; graph.nodes.len()];
        for edge in &graph.edges {
            let endpoints = (index.get(edge.source.as_str()), index.get(edge.target.as_str()));
            let (Some(&from), Some(&to)) = endpoints else {
                continue;
            };
            if from == to {
                continue;
            }
            successors[from].push(to);
            predecessors[to].push(from);
            in_degree[to] += 1;
        }

        let mut rank: Vec<Option<usize>> = vec![None; graph.nodes.len()];
        let mut queue: VecDeque<usize> =
            (0..graph.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        for &i in &queue {
            rank[i] = Some(0);
        }

        loop {
            while let Some(current) = queue.pop_front() {
                let next_rank = rank[current].unwrap_or(0) + 1;
                for &succ in &successors[current] {
                    // Already placed: a back edge into a broken cycle.
                    if in_degree[succ] == 0 {
                        continue;
                    }
                    rank[succ] = Some(rank[succ].map_or(next_rank, |r| r.max(next_rank)));
                    in_degree[succ] -= 1;
                    if in_degree[succ] == 0 {
                        queue.push_back(succ);
                    }
                }
            }

            // Break a cycle at the first unranked node in insertion order.
            let Some(stuck) = (0..graph.nodes.len()).find(|&i| in_degree[i] > 0) else {
                break;
            };
            let base = predecessors[stuck]
                .iter()
                .filter_map(|&p| if in_degree[p] == 0 { rank[p] } else { None })
                .max()
                .map_or(0, |r| r + 1);
            rank[stuck] = Some(rank[stuck].map_or(base, |r| r.max(base)));
            in_degree[stuck] = 0;
            queue.push_back(stuck);
        }

        rank.into_iter().map(|r| r.unwrap_or(0)).collect()
    }
}

impl LayoutEngine for LayeredLayout {
    fn layout(
        &self,
        graph: &WorkflowGraph,
        direction: LayoutDirection,
    ) -> HashMap<NodeId, Position> {
        let ranks = Self::ranks(graph);
        let rank_count = ranks.iter().max().map_or(0, |r| r + 1);

        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        for (i, &r) in ranks.iter().enumerate() {
            rows[r].push(i);
        }
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);

        let (along, across) = match direction {
            LayoutDirection::TopBottom => (self.node_width, self.node_height),
            LayoutDirection::LeftRight => (self.node_height, self.node_width),
        };
        let slot = along + self.node_sep;
        let step = across + self.rank_sep;

        let mut positions = HashMap::with_capacity(graph.nodes.len());
        for (r, row) in rows.iter().enumerate() {
            let indent = (widest - row.len()) as f64 * slot / 2.0;
            for (k, &i) in row.iter().enumerate() {
                let in_rank = self.margin + indent + k as f64 * slot;
                let rank_offset = self.margin + r as f64 * step;
                let position = match direction {
                    LayoutDirection::TopBottom => Position::new(in_rank, rank_offset),
                    LayoutDirection::LeftRight => Position::new(rank_offset, in_rank),
                };
                positions.insert(graph.nodes[i].id.clone(), position);
            }
        }
        positions
    }
}

/// Axis-aligned box around a set of nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Bounding box of the node boxes; a default 800×600 canvas when empty.
pub fn layout_bounds(nodes: &[Node]) -> Bounds {
    if nodes.is_empty() {
        return Bounds { min_x: 0.0, min_y: 0.0, max_x: 800.0, max_y: 600.0 };
    }
    nodes.iter().fold(
        Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        },
        |b, n| Bounds {
            min_x: b.min_x.min(n.position.x),
            min_y: b.min_y.min(n.position.y),
            max_x: b.max_x.max(n.position.x + NODE_WIDTH),
            max_y: b.max_y.max(n.position.y + NODE_HEIGHT),
        },
    )
}
