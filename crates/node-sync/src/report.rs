//! Summary and import reporting

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::NodeError;

/// Outcome recorded for one repository in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryAction {
    /// Seeded when the pass starts, not yet processed
    Pending,
    /// Created locally from the parent's declared details
    Added,
    /// Existed on both sides, metadata reconciled
    Merged,
    /// Removed locally (mirror strategy, node scope only)
    Deleted,
    /// Skipped because the pass was cancelled
    Cancelled,
}

/// Unit change counters reported by the importer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCounts {
    pub added: u64,
    pub updated: u64,
    pub removed: u64,
}

/// Per-repository summary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryReport {
    pub repo_id: String,
    pub action: RepositoryAction,
    #[serde(default)]
    pub units: UnitCounts,
    /// Importer-reported content origins
    #[serde(default)]
    pub sources: Vec<Value>,
}

impl RepositoryReport {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            action: RepositoryAction::Pending,
            units: UnitCounts::default(),
            sources: Vec::new(),
        }
    }
}

/// Per-request aggregation of repository outcomes and errors.
///
/// Keyed by repository ID; iteration order matches the sorted processing
/// order, so rendered reports are reproducible across runs with identical
/// inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub request_id: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub repositories: BTreeMap<String, RepositoryReport>,
    pub errors: Vec<NodeError>,
}

impl SummaryReport {
    pub fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            started_at: None,
            completed_at: None,
            repositories: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// The entry for `repo_id`, created in the pending state if absent.
    pub fn entry(&mut self, repo_id: &str) -> &mut RepositoryReport {
        self.repositories
            .entry(repo_id.to_string())
            .or_insert_with(|| RepositoryReport::new(repo_id))
    }

    pub fn set_action(&mut self, repo_id: &str, action: RepositoryAction) {
        self.entry(repo_id).action = action;
    }

    pub fn push_error(&mut self, error: NodeError) {
        self.errors.push(error);
    }

    /// Whether the pass completed without any recorded error.
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of one repository content synchronization, as reported by the
/// importer collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub added_count: u64,
    pub updated_count: u64,
    pub removed_count: u64,
    /// Raw importer error documents; see [`ImportReport::decoded_errors`]
    #[serde(default)]
    pub errors: Vec<Value>,
    /// Content origins consulted during the import
    #[serde(default)]
    pub sources: Vec<Value>,
}

impl ImportReport {
    /// Decode the raw importer error documents.
    ///
    /// A document that does not parse as a [`NodeError`] is wrapped as
    /// [`NodeError::Caught`] with the document text as the detail, so the
    /// summary format never has to carry arbitrary shapes.
    pub fn decoded_errors(&self, repo_id: &str) -> Vec<NodeError> {
        self.errors
            .iter()
            .map(|doc| {
                serde_json::from_value(doc.clone()).unwrap_or_else(|_| NodeError::Caught {
                    repo_id: Some(repo_id.to_string()),
                    detail: doc.to_string(),
                })
            })
            .collect()
    }
}
