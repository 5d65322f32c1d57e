//! Repository-set synchronization
//!
//! This module provides:
//! - **engine**: the invariant control flow shared by all strategies
//!   (validate, reconcile, optional orphan purge, always finalize)
//! - **strategy**: the `Mirror` and `Additive` reconciliation policies
//! - **validate**: structural binding-list validation

mod engine;
mod strategy;
mod validate;

pub use engine::SyncEngine;
pub use strategy::{
    Additive, Mirror, ReconciliationStrategy, SyncStrategy, find_strategy, strategy,
};
pub use validate::{BindingValidator, StructuralValidator};
