//! Scriptable in-memory store collaborators and fixture builders.
//!
//! [`MemoryStore`] stands in for the child-side repository inventory and
//! records every mutating call; failure injection covers both error
//! families. [`MemoryUnitStore`] does the same for the unit collaborators.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use node_sync::{
    Binding, CancellationFlag, ImportReport, NodeError, RepositoryDescriptor, RepositoryProfile,
    RepositoryStore, StoreError, SyncOptions, Unit, UnitCatalog, UnitStore,
};
use serde_json::{Map, Value, json};

/// A binding with a conventional distributor and relative-url detail.
pub fn binding(repo_id: &str) -> Binding {
    let mut details = Map::new();
    details.insert("relative_url".to_string(), json!(format!("/{repo_id}")));
    Binding::new(repo_id, "http_distributor").with_details(details)
}

/// A content unit with a numbered identity.
pub fn unit(n: u64) -> Unit {
    let mut key = Map::new();
    key.insert("name".to_string(), json!(format!("unit_{n}")));
    Unit::new("rpm", key)
}

/// A repository profile entry built from loose JSON.
///
/// `metadata` must be a JSON object; its fields are flattened next to the
/// id, matching the profile wire shape.
pub fn repo_profile(id: &str, metadata: Value, units: Vec<Value>) -> RepositoryProfile {
    let mut doc = Map::new();
    doc.insert("id".to_string(), json!(id));
    if let Value::Object(fields) = metadata {
        doc.extend(fields);
    }
    doc.insert("units".to_string(), Value::Array(units));
    serde_json::from_value(Value::Object(doc)).unwrap()
}

/// A mutating call observed by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Add(String),
    Merge(String),
    Delete(String),
    RunSynchronization(String),
    PurgeOrphans,
}

/// Scriptable in-memory [`RepositoryStore`].
#[derive(Default)]
pub struct MemoryStore {
    repositories: BTreeMap<String, RepositoryDescriptor>,
    import_reports: BTreeMap<String, ImportReport>,
    fail_sync: BTreeSet<String>,
    fail_merge: BTreeSet<String>,
    fail_purge: bool,
    cancel_on_sync: Option<(String, CancellationFlag)>,
    working_root: Option<PathBuf>,
    /// Every mutating call, in order.
    pub calls: Vec<StoreCall>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign working directories for added repositories under `root`.
    pub fn with_working_root(mut self, root: &Path) -> Self {
        self.working_root = Some(root.to_path_buf());
        self
    }

    /// Seed a local repository.
    pub fn with_repository(mut self, repo: RepositoryDescriptor) -> Self {
        self.repositories.insert(repo.id.clone(), repo);
        self
    }

    /// Script the import report returned for one repository.
    pub fn script_import(&mut self, repo_id: &str, report: ImportReport) {
        self.import_reports.insert(repo_id.to_string(), report);
    }

    /// Make `run_synchronization` fail unexpectedly for one repository.
    pub fn fail_synchronization(&mut self, repo_id: &str) {
        self.fail_sync.insert(repo_id.to_string());
    }

    /// Make `merge` fail unexpectedly for one repository.
    pub fn fail_merge(&mut self, repo_id: &str) {
        self.fail_merge.insert(repo_id.to_string());
    }

    /// Make the orphan purge fail with a domain error.
    pub fn fail_purge(&mut self) {
        self.fail_purge = true;
    }

    /// Set the cancellation flag while synchronizing one repository,
    /// simulating a cancel landing mid-pass.
    pub fn cancel_on_sync(&mut self, repo_id: &str, flag: CancellationFlag) {
        self.cancel_on_sync = Some((repo_id.to_string(), flag));
    }

    pub fn contains(&self, repo_id: &str) -> bool {
        self.repositories.contains_key(repo_id)
    }

    pub fn repository(&self, repo_id: &str) -> Option<&RepositoryDescriptor> {
        self.repositories.get(repo_id)
    }

    pub fn repository_ids(&self) -> Vec<String> {
        self.repositories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositoryStore for MemoryStore {
    fn fetch(&self, repo_id: &str) -> Result<Option<RepositoryDescriptor>, StoreError> {
        Ok(self.repositories.get(repo_id).cloned())
    }

    fn fetch_all(&self) -> Result<Vec<RepositoryDescriptor>, StoreError> {
        Ok(self.repositories.values().cloned().collect())
    }

    fn add(&mut self, repo: &RepositoryDescriptor) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Add(repo.id.clone()));
        let mut repo = repo.clone();
        if let Some(root) = &self.working_root {
            repo.working_dir = Some(root.join(&repo.id));
        }
        self.repositories.insert(repo.id.clone(), repo);
        Ok(())
    }

    fn merge(&mut self, repo_id: &str, parent: &RepositoryDescriptor) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Merge(repo_id.to_string()));
        if self.fail_merge.contains(repo_id) {
            return Err(StoreError::other(std::io::Error::other(
                "metadata update rejected",
            )));
        }
        if let Some(child) = self.repositories.get_mut(repo_id) {
            let delta = child.merge_delta(parent);
            child.apply_delta(&delta);
        }
        Ok(())
    }

    fn delete(&mut self, repo_id: &str) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Delete(repo_id.to_string()));
        self.repositories.remove(repo_id);
        Ok(())
    }

    fn run_synchronization(
        &mut self,
        repo_id: &str,
        _cancelled: &CancellationFlag,
        _options: &SyncOptions,
    ) -> Result<ImportReport, StoreError> {
        self.calls
            .push(StoreCall::RunSynchronization(repo_id.to_string()));
        if let Some((cancel_id, flag)) = &self.cancel_on_sync {
            if cancel_id == repo_id {
                flag.set();
            }
        }
        if self.fail_sync.contains(repo_id) {
            return Err(StoreError::other(std::io::Error::other(
                "importer crashed",
            )));
        }
        Ok(self
            .import_reports
            .get(repo_id)
            .cloned()
            .unwrap_or_default())
    }

    fn purge_orphans(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::PurgeOrphans);
        if self.fail_purge {
            return Err(NodeError::PurgeOrphans {
                detail: "orphan purge rejected".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Scriptable in-memory [`UnitStore`] and [`UnitCatalog`].
#[derive(Default)]
pub struct MemoryUnitStore {
    child: BTreeMap<String, Vec<Unit>>,
    parent: BTreeMap<String, Vec<Unit>>,
    fail_add: BTreeSet<String>,
}

impl MemoryUnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the child-side units for a repository.
    pub fn with_child_units(mut self, repo_id: &str, units: Vec<Unit>) -> Self {
        self.child.insert(repo_id.to_string(), units);
        self
    }

    /// Seed the parent-side published units for a repository.
    pub fn with_published_units(mut self, repo_id: &str, units: Vec<Unit>) -> Self {
        self.parent.insert(repo_id.to_string(), units);
        self
    }

    /// Make adding the named unit fail with a download error.
    pub fn fail_add(&mut self, unit_name: &str) {
        self.fail_add.insert(unit_name.to_string());
    }

    pub fn child_units(&self, repo_id: &str) -> Vec<Unit> {
        self.child.get(repo_id).cloned().unwrap_or_default()
    }

    fn unit_name(unit: &Unit) -> String {
        unit.unit_key
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

impl UnitStore for MemoryUnitStore {
    fn units(&self, repo_id: &str) -> Result<Vec<Unit>, StoreError> {
        Ok(self.child_units(repo_id))
    }

    fn add_unit(&mut self, repo_id: &str, unit: &Unit) -> Result<(), StoreError> {
        let name = Self::unit_name(unit);
        if self.fail_add.contains(&name) {
            return Err(NodeError::UnitDownload {
                repo_id: repo_id.to_string(),
                url: format!("http://parent/content/{name}"),
            }
            .into());
        }
        self.child
            .entry(repo_id.to_string())
            .or_default()
            .push(unit.clone());
        Ok(())
    }

    fn remove_unit(&mut self, repo_id: &str, unit: &Unit) -> Result<(), StoreError> {
        if let Some(units) = self.child.get_mut(repo_id) {
            units.retain(|candidate| candidate.key() != unit.key());
        }
        Ok(())
    }
}

impl UnitCatalog for MemoryUnitStore {
    fn published_units(&self, repo_id: &str) -> Result<Vec<Unit>, StoreError> {
        Ok(self.parent.get(repo_id).cloned().unwrap_or_default())
    }

    fn sources(&self, _repo_id: &str) -> Vec<Value> {
        vec![json!({"url": "http://parent"})]
    }
}
