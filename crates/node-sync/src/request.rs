//! Synchronization request lifecycle

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::binding::Binding;
use crate::report::SummaryReport;

/// Scope marker for one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncScope {
    /// The whole node: a mirror pass may delete local repositories that
    /// have no binding
    Node,
    /// A single repository: never deletes unrelated repositories, even
    /// under the mirror strategy
    Repository,
}

/// Options for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Purge orphaned units once, after the repository passes
    #[serde(default)]
    pub purge_orphans: bool,
    /// Reconcile repository metadata only, skipping content synchronization
    #[serde(default)]
    pub skip_content_update: bool,
}

/// Cancellation handle shared between the caller and the engine.
///
/// The caller keeps a clone and may set it at any time; the engine only
/// polls it at repository boundaries and before unit-level mutations.
/// Cancellation is advisory: an operation already in flight completes its
/// current unit of work before the next check.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested. Non-blocking.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Carries the state for exactly one reconciliation pass.
///
/// Owned exclusively by the caller for its lifetime; the summary is mutated
/// only by the single thread executing the pass. Constructed, `started()`,
/// strategy executes, `finished()` -- `finished()` runs regardless of
/// outcome so callers can always render a report.
pub struct SyncRequest {
    request_id: Uuid,
    bindings: Vec<Binding>,
    scope: SyncScope,
    options: SyncOptions,
    cancelled: CancellationFlag,
    /// Per-request aggregation of outcomes and errors
    pub summary: SummaryReport,
}

impl SyncRequest {
    /// Build a request for one pass.
    ///
    /// Bindings are sorted by `repo_id` so two runs over the same binding
    /// set process repositories in the same order and produce identically
    /// ordered reports.
    pub fn new(
        mut bindings: Vec<Binding>,
        scope: SyncScope,
        options: SyncOptions,
        cancelled: CancellationFlag,
    ) -> Self {
        bindings.sort_by(|a, b| a.repo_id.cmp(&b.repo_id));
        let request_id = Uuid::new_v4();
        Self {
            request_id,
            bindings,
            scope,
            options,
            cancelled,
            summary: SummaryReport::new(request_id),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The declared bindings, in processing order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn scope(&self) -> SyncScope {
        self.scope
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Whether the owning caller has requested cancellation.
    pub fn cancelled(&self) -> bool {
        self.cancelled.is_set()
    }

    /// A read-side clone of the cancellation flag, for handing to
    /// long-running collaborators.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancelled.clone()
    }

    /// Mark the pass started: stamp the summary and seed a pending entry
    /// for every binding.
    pub fn started(&mut self) {
        self.summary.mark_started();
        for binding in &self.bindings {
            self.summary.entry(&binding.repo_id);
        }
        tracing::info!(
            request_id = %self.request_id,
            bindings = self.bindings.len(),
            "synchronization started"
        );
    }

    /// Mark the pass finished.
    pub fn finished(&mut self) {
        self.summary.mark_completed();
        tracing::info!(
            request_id = %self.request_id,
            errors = self.summary.errors.len(),
            "synchronization finished"
        );
    }
}
