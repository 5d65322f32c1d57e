//! Binding payloads declared by the parent

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declares that the node should carry a repository.
///
/// Bindings are supplied by the parent catalog and are immutable inputs to
/// one reconciliation pass. `details` carries the distributor-specific
/// publishing metadata from the bind payload; the reconciler treats it as an
/// opaque document and only moves it between the parent and child views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Repository ID, unique within one request's binding list
    pub repo_id: String,
    /// Distributor-specific publishing metadata
    #[serde(default)]
    pub details: Map<String, Value>,
    /// The distributor that published this binding
    pub distributor_id: String,
}

impl Binding {
    /// Create a binding with empty details.
    pub fn new(repo_id: impl Into<String>, distributor_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            details: Map::new(),
            distributor_id: distributor_id.into(),
        }
    }

    /// Attach publishing metadata.
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }
}
