//! Shared test utilities for the node-sync workspace.
//!
//! This crate provides standardised test doubles to eliminate duplication
//! across crate test suites. It is a dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`store`] — scriptable in-memory store collaborators and fixture
//!   builders

pub mod store;

pub use store::{MemoryStore, MemoryUnitStore, StoreCall, binding, repo_profile, unit};

/// Initialise a tracing subscriber for tests, honouring `RUST_LOG`.
/// Safe to call repeatedly; only the first call installs a subscriber.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
