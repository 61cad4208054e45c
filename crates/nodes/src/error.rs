//! Node-level error type.

use thiserror::Error;

/// Errors raised while decoding a node's kind or kind-specific record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The `kind` string is not one of the five known kinds.
    #[error("unknown node kind: '{0}'")]
    UnknownKind(String),

    /// The `data` record does not match the shape expected for its kind.
    #[error("invalid {kind} data: {message}")]
    InvalidData { kind: String, message: String },
}
