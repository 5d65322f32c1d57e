//! Synchronization engine
//!
//! The engine owns the invariant control flow shared by all strategies:
//! validate the bindings, delegate to the strategy, optionally purge
//! orphans, always finalize. Nothing escapes `synchronize()`; every outcome
//! lands in the request's summary so callers can always render a report.

use crate::repository::RepositoryStore;
use crate::request::SyncRequest;
use crate::sync::strategy::{self, SyncStrategy};
use crate::sync::validate::{BindingValidator, StructuralValidator};

/// Drives one reconciliation pass for a chosen strategy.
pub struct SyncEngine {
    strategy: SyncStrategy,
    validator: Box<dyn BindingValidator>,
}

impl SyncEngine {
    /// Create an engine with the default structural binding validation.
    pub fn new(strategy: SyncStrategy) -> Self {
        Self {
            strategy,
            validator: Box::new(StructuralValidator),
        }
    }

    /// Create an engine with a caller-supplied validator.
    pub fn with_validator(strategy: SyncStrategy, validator: Box<dyn BindingValidator>) -> Self {
        Self {
            strategy,
            validator,
        }
    }

    pub fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    /// Run one reconciliation pass.
    ///
    /// Validation failures are a hard stop for the whole pass; everything
    /// else is isolated per repository. `finished()` is called regardless
    /// of outcome.
    pub fn synchronize(&self, request: &mut SyncRequest, store: &mut dyn RepositoryStore) {
        request.started();
        self.run(request, store);
        request.finished();
    }

    fn run(&self, request: &mut SyncRequest, store: &mut dyn RepositoryStore) {
        let failures = self.validator.validate(request.bindings());
        if !failures.is_empty() {
            tracing::warn!(
                request_id = %request.request_id(),
                failures = failures.len(),
                "binding validation failed, pass aborted"
            );
            for failure in failures {
                request.summary.push_error(failure);
            }
            return;
        }

        strategy::strategy(self.strategy).reconcile(request, store);

        if request.options().purge_orphans {
            if let Err(error) = store.purge_orphans() {
                strategy::record_store_error(&mut request.summary, None, error);
            }
        }
    }
}
