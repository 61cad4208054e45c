//! File-backed list of saved versions.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use engine::WorkflowGraph;

use crate::error::VersionError;
use crate::models::WorkflowVersion;

pub const DEFAULT_MAX_VERSIONS: usize = 20;

/// Saved versions, newest first.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: Option<PathBuf>,
    versions: Vec<WorkflowVersion>,
    max_versions: usize,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::in_memory(DEFAULT_MAX_VERSIONS)
    }
}

impl VersionStore {
    /// A store that never touches the disk.
    pub fn in_memory(max_versions: usize) -> Self {
        Self {
            path: None,
            versions: Vec::new(),
            max_versions: max_versions.max(1),
        }
    }

    /// Open the store backed by `path`.
    ///
    /// A missing file is an empty store. So is an unparsable one, with a
    /// warning; the bad file is overwritten on the next save.
    pub fn load(path: impl Into<PathBuf>, max_versions: usize) -> Self {
        let path = path.into();
        let versions = match read_versions(&path) {
            Ok(versions) => versions,
            Err(VersionError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no versions file yet");
                Vec::new()
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read versions; starting empty"
                );
                Vec::new()
            }
        };

        let mut store = Self {
            path: Some(path),
            versions,
            max_versions: max_versions.max(1),
        };
        store.versions.truncate(store.max_versions);
        store
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn list(&self) -> &[WorkflowVersion] {
        &self.versions
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowVersion> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Snapshot `graph` as the newest version.
    ///
    /// A blank or missing name becomes `"Version N"`. The oldest versions
    /// beyond the limit are dropped. A failed write is logged and the
    /// version is still kept in memory.
    pub fn save(&mut self, graph: &WorkflowGraph, name: Option<&str>) -> WorkflowVersion {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Version {}", self.versions.len() + 1));

        let version = WorkflowVersion {
            id: format!("v-{}", Uuid::new_v4().simple()),
            name,
            timestamp: Utc::now(),
            nodes: graph.nodes.clone(),
            edges: graph.edges.clone(),
        };

        self.versions.insert(0, version.clone());
        self.versions.truncate(self.max_versions);
        info!(id = %version.id, name = %version.name, "version saved");

        if let Err(e) = self.persist() {
            warn!(error = %e, "failed to write versions file");
        }
        version
    }

    /// # Errors
    /// [`VersionError::NotFound`] if no version has this id, or the write
    /// error if the file could not be updated.
    pub fn delete(&mut self, id: &str) -> Result<WorkflowVersion, VersionError> {
        let idx = self
            .versions
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| VersionError::NotFound(id.to_owned()))?;
        let removed = self.versions.remove(idx);
        self.persist()?;
        Ok(removed)
    }

    /// Write every version to the backing file. No-op for in-memory stores.
    pub fn persist(&self) -> Result<(), VersionError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&self.versions)?;
        fs::write(path, text).map_err(|source| VersionError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_versions(path: &Path) -> Result<Vec<WorkflowVersion>, VersionError> {
    let text = fs::read_to_string(path).map_err(|source| VersionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
