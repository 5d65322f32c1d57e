//! Binding list validation

use std::collections::HashSet;

use crate::binding::Binding;
use crate::error::NodeError;

/// Validates a binding list before any repository is touched.
///
/// A non-empty result is a hard stop for the whole pass: the failures are
/// recorded in the summary and no repository operation is attempted.
pub trait BindingValidator {
    fn validate(&self, bindings: &[Binding]) -> Vec<NodeError>;
}

/// Structural checks on the binding list.
///
/// Rejects empty repository ids, empty distributor ids, and duplicate
/// repository ids. All failures are reported at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl BindingValidator for StructuralValidator {
    fn validate(&self, bindings: &[Binding]) -> Vec<NodeError> {
        let mut failures = Vec::new();
        let mut seen = HashSet::new();

        for binding in bindings {
            if binding.repo_id.is_empty() {
                failures.push(NodeError::InvalidBindings {
                    reason: "binding with empty repo_id".to_string(),
                });
                continue;
            }
            if binding.distributor_id.is_empty() {
                failures.push(NodeError::InvalidBindings {
                    reason: format!("binding {}: empty distributor_id", binding.repo_id),
                });
            }
            if !seen.insert(binding.repo_id.as_str()) {
                failures.push(NodeError::InvalidBindings {
                    reason: format!("duplicate binding for repository {}", binding.repo_id),
                });
            }
        }

        failures
    }
}
