//! Bounded undo/redo history of whole-graph snapshots.

use tracing::debug;

use crate::config::HistoryConfig;
use crate::models::WorkflowGraph;

/// Linear history with a cursor.
///
/// `entries[..cursor]` are undo targets, `entries[cursor + 1..]` are redo
/// targets. While the caller has edits not yet undone the cursor sits at
/// `entries.len()`; the first undo stashes the live graph at that slot so a
/// redo can return to it.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<WorkflowGraph>,
    cursor: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: config.capacity.max(1),
        }
    }

    /// Record `graph` as the state before a mutation.
    ///
    /// Discards every redo target. When over capacity the oldest snapshot is
    /// dropped.
    pub fn save(&mut self, graph: &WorkflowGraph) {
        self.entries.truncate(self.cursor);
        self.entries.push(graph.clone());
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len();
        debug!(entries = self.entries.len(), "history snapshot saved");
    }

    /// Step back. `live` is the graph currently shown.
    ///
    /// Returns the graph to install, or `None` when nothing is left to undo.
    pub fn undo(&mut self, live: &WorkflowGraph) -> Option<WorkflowGraph> {
        if !self.can_undo() {
            return None;
        }
        if self.cursor == self.entries.len() {
            self.entries.push(live.clone());
        } else {
            self.entries[self.cursor] = live.clone();
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, live: &WorkflowGraph) -> Option<WorkflowGraph> {
        if !self.can_redo() {
            return None;
        }
        self.entries[self.cursor] = live.clone();
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
