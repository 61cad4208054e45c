//! Summary figures for the analytics view.

use std::collections::BTreeMap;

use serde::Serialize;

use nodes::KindTag;

use crate::models::{Edge, WorkflowGraph};
use crate::validation::ValidationReport;

/// Hours a node of each kind is assumed to take.
fn estimated_hours(tag: KindTag) -> f64 {
    match tag {
        KindTag::Task      => 2.0,
        KindTag::Approval  => 4.0,
        KindTag::Automated => 0.5,
        KindTag::Start | KindTag::End => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub kind_counts: BTreeMap<KindTag, usize>,
    /// Percentage of automated nodes, rounded.
    pub automation_coverage: u32,
    /// Hours.
    pub estimated_cycle_time: f64,
    /// 0 to 100; 0 for an empty graph.
    pub health_score: u32,
    pub error_count: usize,
    pub warning_count: usize,
}

impl WorkflowMetrics {
    pub fn compute(graph: &WorkflowGraph, report: &ValidationReport) -> Self {
        let mut kind_counts: BTreeMap<KindTag, usize> = BTreeMap::new();
        for node in &graph.nodes {
            *kind_counts.entry(node.tag()).or_default() += 1;
        }

        let node_count = graph.nodes.len();
        let count = |tag| kind_counts.get(&tag).copied().unwrap_or(0);

        let automation_coverage = if node_count == 0 {
            0
        } else {
            (count(KindTag::Automated) as f64 / node_count as f64 * 100.0).round() as u32
        };

        let estimated_cycle_time = kind_counts
            .iter()
            .map(|(&tag, &n)| estimated_hours(tag) * n as f64)
            .sum();

        let (errors, warnings) = (report.error_count(), report.warning_count());
        let base: i64 = if node_count == 0 { 0 } else { 100 };
        let penalty = 15 * errors as i64 + 5 * warnings as i64;
        let health_score = (base - penalty).clamp(0, 100) as u32;

        Self {
            node_count,
            edge_count: graph.edges.len(),
            kind_counts,
            automation_coverage,
            estimated_cycle_time,
            health_score,
            error_count: errors,
            warning_count: warnings,
        }
    }
}

// ---------------------------------------------------------------------------
// Edge metrics
// ---------------------------------------------------------------------------

/// Display figures for an edge carrying recorded metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStats {
    /// Seconds.
    pub avg_time: f64,
    pub pass_rate: f64,
    pub band: PassRateBand,
}

/// Colour band of a pass rate: 90 and above, 70 and above, the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassRateBand {
    Healthy,
    Degraded,
    Failing,
}

impl PassRateBand {
    pub fn of(pass_rate: f64) -> Self {
        if pass_rate >= 90.0 {
            Self::Healthy
        } else if pass_rate >= 70.0 {
            Self::Degraded
        } else {
            Self::Failing
        }
    }
}

/// Stats for `edge`, or `None` when it has no recorded metrics.
/// Missing figures count as zero.
pub fn edge_stats(edge: &Edge) -> Option<EdgeStats> {
    let metrics = edge.data.metrics?;
    let pass_rate = metrics.pass_rate.unwrap_or(0.0);
    Some(EdgeStats {
        avg_time: metrics.avg_time.unwrap_or(0.0),
        pass_rate,
        band: PassRateBand::of(pass_rate),
    })
}

/// `45s`, `12m`, `2h`, `2h 5m`.
pub fn format_duration(seconds: u64) -> String {
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s => match (s / 3600, (s % 3600) / 60) {
            (hours, 0) => format!("{hours}h"),
            (hours, minutes) => format!("{hours}h {minutes}m"),
        },
    }
}
