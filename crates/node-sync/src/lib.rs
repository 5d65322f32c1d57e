//! Repository reconciliation engine for content nodes
//!
//! Given a parent's declared set of repository bindings and a child's
//! locally known repository state, this crate computes and executes an
//! add/merge/delete plan with cooperative cancellation, aggregates partial
//! failures into a per-request summary report, and detects profile drift
//! between two generations of a synchronized tree.
//!
//! Two cooperating sides share the mirror/additive semantics:
//!
//! - the synchronization side ([`sync`], [`importer`]) mutates the child
//!   inventory through collaborator traits ([`RepositoryStore`],
//!   [`UnitStore`], [`UnitCatalog`]);
//! - the drift side ([`drift`]) is read-only and reports discrepancies as
//!   values.
//!
//! # Example
//!
//! ```ignore
//! use node_sync::{Binding, CancellationFlag, SyncEngine, SyncOptions,
//!                 SyncRequest, SyncScope, SyncStrategy};
//!
//! let bindings = vec![Binding::new("repo-1", "http_distributor")];
//! let cancelled = CancellationFlag::new();
//! let mut request = SyncRequest::new(
//!     bindings,
//!     SyncScope::Node,
//!     SyncOptions::default(),
//!     cancelled.clone(),
//! );
//!
//! let engine = SyncEngine::new(SyncStrategy::Mirror);
//! engine.synchronize(&mut request, &mut store);
//! for (repo_id, report) in &request.summary.repositories {
//!     println!("{repo_id}: {:?}", report.action);
//! }
//! ```

pub mod binding;
pub mod drift;
pub mod error;
pub mod importer;
pub mod report;
pub mod repository;
pub mod request;
pub mod sync;

pub use binding::Binding;
pub use drift::{
    AdditiveDrift, Discrepancy, DriftDetector, DriftStrategy, MirrorDrift, Profile,
    RepositoryPair, RepositoryProfile, drift_strategy, fingerprint,
};
pub use error::{NodeError, StoreError, StrategyUnsupported};
pub use importer::{
    AdditiveImporter, ImporterStrategy, MirrorImporter, Unit, UnitCatalog, UnitInventory, UnitKey,
    UnitStore, find_importer_strategy, importer_strategy,
};
pub use report::{ImportReport, RepositoryAction, RepositoryReport, SummaryReport, UnitCounts};
pub use repository::{RepositoryDescriptor, RepositoryStore};
pub use request::{CancellationFlag, SyncOptions, SyncRequest, SyncScope};
pub use sync::{
    Additive, BindingValidator, Mirror, ReconciliationStrategy, StructuralValidator, SyncEngine,
    SyncStrategy, find_strategy, strategy,
};
