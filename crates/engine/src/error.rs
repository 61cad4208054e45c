//! Engine-level error types.
//!
//! Validation findings are not errors; they are reported as data by
//! [`crate::validation::validate`]. These types cover operations the store
//! refuses to perform.

use thiserror::Error;

/// Errors produced by graph-mutating operations on the store.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A node with this id already exists.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// An edge with this id already exists.
    #[error("duplicate edge ID: '{0}'")]
    DuplicateEdgeId(String),

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    #[error("unknown edge '{0}'")]
    UnknownEdge(String),

    #[error("unknown automation '{0}'")]
    UnknownAutomation(String),

    /// The node exists but is not an automated node.
    #[error("node '{0}' is not an automated node")]
    NotAutomated(String),

    /// `paste_nodes` was called before anything was copied.
    #[error("clipboard is empty")]
    EmptyClipboard,

    /// Simulation refused: the graph has blocking validation errors.
    #[error("workflow has {0} blocking validation error(s)")]
    InvalidWorkflow(usize),

    /// The snapshot was rejected; the live graph is unchanged.
    #[error("import failed: {0}")]
    Import(#[from] ImportError),
}

/// Reasons a snapshot is rejected by import.
///
/// Import is all-or-nothing: any of these leaves the current graph untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("snapshot must be a JSON object")]
    NotAnObject,

    /// `nodes` or `edges` is missing or not a list.
    #[error("snapshot field '{0}' must be a list")]
    MissingList(&'static str),

    #[error("node #{index} is malformed: {reason}")]
    MalformedNode { index: usize, reason: &'static str },

    #[error("edge #{index} is malformed: {reason}")]
    MalformedEdge { index: usize, reason: &'static str },

    /// Shape was fine but typed decoding failed (unknown kind, bad field).
    #[error("snapshot could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}
