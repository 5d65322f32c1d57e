//! Error types for node-sync

use serde::{Deserialize, Serialize};

/// Expected, domain-specific failure modes surfaced during reconciliation.
///
/// These are accumulated into the summary report rather than aborting the
/// pass. The serde derives let importer error documents round-trip through
/// [`crate::ImportReport`]; the `error_id` tag identifies the failure mode
/// in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "error_id", rename_all = "snake_case")]
pub enum NodeError {
    /// The binding list failed structural validation
    #[error("invalid bindings: {reason}")]
    InvalidBindings { reason: String },

    /// The child unit inventory could not be enumerated
    #[error("repository {repo_id}: child units could not be fetched")]
    GetChildUnits { repo_id: String },

    /// The parent unit manifest could not be enumerated
    #[error("repository {repo_id}: parent units could not be fetched")]
    GetParentUnits { repo_id: String },

    /// A unit could not be added to the child inventory
    #[error("repository {repo_id}: unit could not be added")]
    AddUnit { repo_id: String },

    /// A unit could not be removed from the child inventory
    #[error("repository {repo_id}: unit could not be removed")]
    DeleteUnit { repo_id: String },

    /// A unit file could not be downloaded
    #[error("repository {repo_id}: download failed: {url}")]
    UnitDownload { repo_id: String, url: String },

    /// The global orphan purge failed
    #[error("orphan purge failed: {detail}")]
    PurgeOrphans { detail: String },

    /// An unexpected collaborator failure, wrapped uniformly so the
    /// summary format never has to special-case arbitrary error types
    #[error("unexpected failure: {detail}")]
    Caught {
        repo_id: Option<String>,
        detail: String,
    },
}

impl NodeError {
    /// Wrap an arbitrary error with repository context.
    pub fn caught(repo_id: Option<&str>, error: &dyn std::error::Error) -> Self {
        NodeError::Caught {
            repo_id: repo_id.map(str::to_string),
            detail: error.to_string(),
        }
    }
}

/// An unknown strategy name was requested.
///
/// This is a configuration error, raised at lookup time before any request
/// is constructed, and is fatal to the operation requesting the strategy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("strategy \"{0}\" not supported")]
pub struct StrategyUnsupported(pub String);

/// Failure channel for store collaborators.
///
/// Keeps the two error families distinct: expected domain failures are
/// appended to the summary as-is, while anything unexpected is logged in
/// full at the capture point and wrapped as [`NodeError::Caught`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An expected, domain-specific failure
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Anything unexpected from the underlying store
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap an arbitrary error as the unexpected family.
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Other(error.into())
    }
}
