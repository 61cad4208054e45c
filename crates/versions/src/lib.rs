//! `versions` crate — named snapshots of a workflow, kept on disk.
//!
//! A [`VersionStore`] holds the most recent versions newest first and writes
//! them to a single JSON file. The file is a convenience, not a source of
//! truth: if it is missing or unreadable the store starts empty.

pub mod diff;
pub mod error;
pub mod models;
pub mod store;

pub use diff::diff;
pub use error::VersionError;
pub use models::{VersionDiff, WorkflowVersion};
pub use store::{VersionStore, DEFAULT_MAX_VERSIONS};
