//! Reconciliation strategies
//!
//! A strategy decides what happens to the local repository set given the
//! parent's bindings. Both variants share the merge pass; only the mirror
//! strategy deletes. Per-repository failures are isolated: one repository's
//! failure never prevents the remaining repositories in the same pass from
//! being attempted.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NodeError, StoreError, StrategyUnsupported};
use crate::report::{RepositoryAction, SummaryReport, UnitCounts};
use crate::repository::{RepositoryDescriptor, RepositoryStore};
use crate::request::{SyncRequest, SyncScope};

/// Strategy selector, shared by the sync, importer, and drift sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Exact set equality with the parent's bindings
    Mirror,
    /// Adds and merges, never deletes
    Additive,
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStrategy::Mirror => write!(f, "mirror"),
            SyncStrategy::Additive => write!(f, "additive"),
        }
    }
}

impl FromStr for SyncStrategy {
    type Err = StrategyUnsupported;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mirror" => Ok(SyncStrategy::Mirror),
            "additive" => Ok(SyncStrategy::Additive),
            _ => Err(StrategyUnsupported(s.to_string())),
        }
    }
}

/// Find a reconciliation strategy by name.
pub fn find_strategy(
    name: &str,
) -> std::result::Result<&'static dyn ReconciliationStrategy, StrategyUnsupported> {
    Ok(strategy(name.parse()?))
}

/// Select the reconciliation behavior for a strategy.
pub fn strategy(kind: SyncStrategy) -> &'static dyn ReconciliationStrategy {
    match kind {
        SyncStrategy::Mirror => &Mirror,
        SyncStrategy::Additive => &Additive,
    }
}

/// Repository-set reconciliation policy.
///
/// Implementations compose the shared merge and delete passes; the outer
/// lifecycle (validation, orphan purge, finalization) belongs to
/// [`crate::SyncEngine`].
pub trait ReconciliationStrategy {
    fn reconcile(&self, request: &mut SyncRequest, store: &mut dyn RepositoryStore);
}

/// Merges or adds all bound repositories, then deletes any local
/// repository the parent no longer declares. Deletion only happens for
/// node-scoped requests: a single-repository sync never deletes unrelated
/// repositories.
pub struct Mirror;

impl ReconciliationStrategy for Mirror {
    fn reconcile(&self, request: &mut SyncRequest, store: &mut dyn RepositoryStore) {
        merge_repositories(request, store);
        if request.scope() == SyncScope::Node {
            delete_repositories(request, store);
        }
    }
}

/// Merges or adds all bound repositories; local repositories outside the
/// binding set are left untouched indefinitely.
pub struct Additive;

impl ReconciliationStrategy for Additive {
    fn reconcile(&self, request: &mut SyncRequest, store: &mut dyn RepositoryStore) {
        merge_repositories(request, store);
    }
}

/// Merge or add every bound repository, in sorted order.
///
/// The cancellation check marks the current repository and moves on; the
/// remaining repositories get their own check on their turn, so a cancelled
/// pass still reports every binding.
fn merge_repositories(request: &mut SyncRequest, store: &mut dyn RepositoryStore) {
    let parents: Vec<RepositoryDescriptor> = request
        .bindings()
        .iter()
        .map(RepositoryDescriptor::from_binding)
        .collect();

    for parent in parents {
        if request.cancelled() {
            request
                .summary
                .set_action(&parent.id, RepositoryAction::Cancelled);
            continue;
        }
        if let Err(error) = merge_repository(request, store, &parent) {
            record_store_error(&mut request.summary, Some(&parent.id), error);
        }
    }
}

/// Merge or add a single repository, then synchronize its content.
fn merge_repository(
    request: &mut SyncRequest,
    store: &mut dyn RepositoryStore,
    parent: &RepositoryDescriptor,
) -> std::result::Result<(), StoreError> {
    let repo_id = parent.id.as_str();

    match store.fetch(repo_id)? {
        Some(_) => {
            request.summary.set_action(repo_id, RepositoryAction::Merged);
            store.merge(repo_id, parent)?;
            tracing::info!(repo_id, "repository merged");
        }
        None => {
            request.summary.set_action(repo_id, RepositoryAction::Added);
            store.add(parent)?;
            tracing::info!(repo_id, "repository added");
        }
    }

    synchronize_repository(request, store, repo_id)
}

/// Run the content synchronization for one just-merged or just-added
/// repository and fold the importer's report into the summary.
fn synchronize_repository(
    request: &mut SyncRequest,
    store: &mut dyn RepositoryStore,
    repo_id: &str,
) -> std::result::Result<(), StoreError> {
    let options = request.options();
    if options.skip_content_update {
        tracing::debug!(repo_id, "content update skipped");
        return Ok(());
    }

    let cancelled = request.cancellation();
    let report = store.run_synchronization(repo_id, &cancelled, &options)?;

    if request.cancelled() {
        // Unit counts from a cancelled import are not recorded.
        request
            .summary
            .set_action(repo_id, RepositoryAction::Cancelled);
        return Ok(());
    }

    for error in report.decoded_errors(repo_id) {
        request.summary.push_error(error);
    }
    let entry = request.summary.entry(repo_id);
    entry.units = UnitCounts {
        added: report.added_count,
        updated: report.updated_count,
        removed: report.removed_count,
    };
    entry.sources = report.sources;
    Ok(())
}

/// Delete every local repository the parent no longer declares, in sorted
/// order.
fn delete_repositories(request: &mut SyncRequest, store: &mut dyn RepositoryStore) {
    let on_parent: BTreeSet<String> = request
        .bindings()
        .iter()
        .map(|binding| binding.repo_id.clone())
        .collect();

    let on_child = match store.fetch_all() {
        Ok(repositories) => repositories,
        Err(error) => {
            record_store_error(&mut request.summary, None, error);
            return;
        }
    };

    let mut child_ids: Vec<String> = on_child.into_iter().map(|repo| repo.id).collect();
    child_ids.sort();

    for repo_id in child_ids {
        if on_parent.contains(&repo_id) {
            continue;
        }
        if request.cancelled() {
            request
                .summary
                .set_action(&repo_id, RepositoryAction::Cancelled);
            continue;
        }
        request.summary.set_action(&repo_id, RepositoryAction::Deleted);
        match store.delete(&repo_id) {
            Ok(()) => tracing::info!(repo_id = %repo_id, "repository deleted"),
            Err(error) => record_store_error(&mut request.summary, Some(&repo_id), error),
        }
    }
}

/// Fold a store failure into the summary, keeping the two error families
/// distinct.
pub(crate) fn record_store_error(
    summary: &mut SummaryReport,
    repo_id: Option<&str>,
    error: StoreError,
) {
    match error {
        StoreError::Node(error) => {
            tracing::warn!(repo_id = ?repo_id, %error, "reconciliation error");
            summary.push_error(error);
        }
        StoreError::Other(error) => {
            tracing::error!(repo_id = ?repo_id, %error, "unexpected failure");
            summary.push_error(NodeError::caught(repo_id, &*error));
        }
    }
}
