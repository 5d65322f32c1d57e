//! Repository model and the store collaborator seam

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::binding::Binding;
use crate::error::StoreError;
use crate::report::ImportReport;
use crate::request::{CancellationFlag, SyncOptions};

/// The reconciler's view of one repository's existence and metadata.
///
/// The same shape serves both sides of a pass: the parent view is built
/// from a binding, the child view is fetched from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub id: String,
    /// Declared metadata from the bind payload
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Local working directory, when one has been assigned
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl RepositoryDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            details: Map::new(),
            working_dir: None,
        }
    }

    /// The parent-side view declared by a binding.
    pub fn from_binding(binding: &Binding) -> Self {
        Self {
            id: binding.repo_id.clone(),
            details: binding.details.clone(),
            working_dir: None,
        }
    }

    /// Compute the key-by-key difference of `details` against a parent
    /// descriptor.
    ///
    /// The parent's declared values win on conflict; keys present locally
    /// but absent from the parent are left alone. An empty delta means the
    /// two sides already agree.
    pub fn merge_delta(&self, parent: &RepositoryDescriptor) -> Map<String, Value> {
        let mut delta = Map::new();
        for (key, value) in &parent.details {
            if self.details.get(key) != Some(value) {
                delta.insert(key.clone(), value.clone());
            }
        }
        delta
    }

    /// Apply a delta produced by [`RepositoryDescriptor::merge_delta`].
    pub fn apply_delta(&mut self, delta: &Map<String, Value>) {
        for (key, value) in delta {
            self.details.insert(key.clone(), value.clone());
        }
    }
}

/// Child-side repository inventory and importer dispatch.
///
/// Operations are assumed atomic and idempotent from the engine's point of
/// view; the engine performs no rollback, and a failure mid-pass leaves
/// already-committed repositories committed.
pub trait RepositoryStore {
    /// Fetch one local repository, `None` when absent.
    fn fetch(&self, repo_id: &str) -> Result<Option<RepositoryDescriptor>, StoreError>;

    /// Enumerate all local repositories.
    fn fetch_all(&self) -> Result<Vec<RepositoryDescriptor>, StoreError>;

    /// Create a local repository from the parent's declared details.
    fn add(&mut self, repo: &RepositoryDescriptor) -> Result<(), StoreError>;

    /// Reconcile local metadata against the parent's. The parent's declared
    /// details win on conflict; see [`RepositoryDescriptor::merge_delta`].
    fn merge(&mut self, repo_id: &str, parent: &RepositoryDescriptor) -> Result<(), StoreError>;

    /// Remove a local repository.
    fn delete(&mut self, repo_id: &str) -> Result<(), StoreError>;

    /// Run the content synchronization for one repository. May be long
    /// running; expected to poll `cancelled` between units of work.
    fn run_synchronization(
        &mut self,
        repo_id: &str,
        cancelled: &CancellationFlag,
        options: &SyncOptions,
    ) -> Result<ImportReport, StoreError>;

    /// Purge orphaned units across the whole inventory. Invoked at most
    /// once per pass.
    fn purge_orphans(&mut self) -> Result<(), StoreError>;
}
