//! Summary diff between the live graph and a saved version.

use std::collections::HashMap;

use engine::WorkflowGraph;

use crate::models::{VersionDiff, WorkflowVersion};

/// Count additions, removals and changes going from `version` to `current`.
///
/// Identity is the id; "changed" means the id exists on both sides with
/// different content.
pub fn diff(current: &WorkflowGraph, version: &WorkflowVersion) -> VersionDiff {
    let (nodes_added, nodes_removed, nodes_changed) =
        count_changes(&current.nodes, &version.nodes, |n| n.id.as_str());
    let (edges_added, edges_removed, edges_changed) =
        count_changes(&current.edges, &version.edges, |e| e.id.as_str());

    VersionDiff {
        nodes_added,
        nodes_removed,
        nodes_changed,
        edges_added,
        edges_removed,
        edges_changed,
    }
}

fn count_changes<'a, T: PartialEq>(
    current: &'a [T],
    saved: &'a [T],
    id: impl Fn(&'a T) -> &'a str,
) -> (usize, usize, usize) {
    let current: HashMap<&str, &T> = current.iter().map(|x| (id(x), x)).collect();
    let saved: HashMap<&str, &T> = saved.iter().map(|x| (id(x), x)).collect();

    let mut added = 0;
    let mut changed = 0;
    for (key, item) in &current {
        match saved.get(key) {
            None => added += 1,
            Some(old) if old != item => changed += 1,
            Some(_) => {}
        }
    }
    let removed = saved.keys().filter(|key| !current.contains_key(*key)).count();

    (added, removed, changed)
}
