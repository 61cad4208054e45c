//! Typed error type for the versions crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("version not found: '{0}'")]
    NotFound(String),
}
