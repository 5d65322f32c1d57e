//! Profile drift detection
//!
//! The read-only counterpart of the synchronization strategies, used during
//! consumer applicability checks: compares an expected (parent) profile
//! against a reported (child) profile per the same mirror/additive
//! semantics and returns a typed discrepancy instead of mutating state.

mod detector;
mod profile;

pub use detector::{
    AdditiveDrift, Discrepancy, DriftDetector, DriftStrategy, MirrorDrift, RepositoryPair,
    drift_strategy,
};
pub use profile::{Profile, RepositoryProfile, fingerprint};
