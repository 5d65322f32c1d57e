//! Mirror/additive drift strategies
//!
//! A drift check is a single in-sync decision, not an accumulating report:
//! the first discrepancy found aborts the check and is returned as a value
//! for the caller to branch on.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::drift::profile::{Profile, RepositoryProfile, fingerprint};
use crate::sync::SyncStrategy;

/// An expected/reported repository pair produced by repository pairing.
pub type RepositoryPair = (RepositoryProfile, RepositoryProfile);

/// A single drift finding. Advisory only, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Discrepancy {
    /// The two profiles disagree on how many repositories exist
    #[error("repository count mismatch: expected {expected}, reported {reported}")]
    RepositoryCount { expected: usize, reported: usize },

    /// A paired repository's metadata differs
    #[error("repository metadata mismatch: {}", .expected.id)]
    Repository {
        expected: Box<RepositoryProfile>,
        reported: Box<RepositoryProfile>,
    },

    /// The flattened unit sets differ
    #[error("unit drift detected across {} repositories", .expected.len())]
    Unit {
        expected: Vec<RepositoryProfile>,
        reported: Vec<RepositoryProfile>,
    },
}

/// Read-only mirror/additive comparison semantics.
pub trait DriftStrategy {
    /// Pair the repositories of the two profiles and compare their
    /// metadata (with units stripped).
    ///
    /// Pairing is positional: both sides are assumed to emit repositories
    /// in the same stable order. This is not a match by id.
    fn pair_repositories(
        &self,
        expected: &Profile,
        reported: &Profile,
    ) -> Result<Vec<RepositoryPair>, Discrepancy>;

    /// Compare the flattened unit sets of previously paired repositories.
    fn compare_units(&self, pairs: &[RepositoryPair]) -> Result<(), Discrepancy>;
}

/// Find a drift strategy by kind. The mapping matches
/// [`crate::sync::find_strategy`] on the synchronization side.
pub fn drift_strategy(kind: SyncStrategy) -> &'static dyn DriftStrategy {
    match kind {
        SyncStrategy::Mirror => &MirrorDrift,
        SyncStrategy::Additive => &AdditiveDrift,
    }
}

/// Mirror semantics: the reported side must match the expected side
/// exactly, in repository count, metadata, and unit sets.
pub struct MirrorDrift;

impl DriftStrategy for MirrorDrift {
    fn pair_repositories(
        &self,
        expected: &Profile,
        reported: &Profile,
    ) -> Result<Vec<RepositoryPair>, Discrepancy> {
        if reported.repositories.len() != expected.repositories.len() {
            return Err(Discrepancy::RepositoryCount {
                expected: expected.repositories.len(),
                reported: reported.repositories.len(),
            });
        }
        let pairs: Vec<RepositoryPair> = expected
            .repositories
            .iter()
            .cloned()
            .zip(reported.repositories.iter().cloned())
            .collect();
        compare_metadata(pairs)
    }

    fn compare_units(&self, pairs: &[RepositoryPair]) -> Result<(), Discrepancy> {
        let expected = unit_fingerprints(pairs.iter().map(|(e, _)| e));
        let reported = unit_fingerprints(pairs.iter().map(|(_, r)| r));

        if expected != reported {
            return Err(unit_discrepancy(pairs));
        }
        Ok(())
    }
}

/// Additive semantics: reported repositories and units outside the expected
/// set are tolerated; everything expected must be present and identical.
pub struct AdditiveDrift;

impl DriftStrategy for AdditiveDrift {
    fn pair_repositories(
        &self,
        expected: &Profile,
        reported: &Profile,
    ) -> Result<Vec<RepositoryPair>, Discrepancy> {
        let expected_ids: HashSet<&str> = expected
            .repositories
            .iter()
            .map(|repo| repo.id.as_str())
            .collect();
        let filtered: Vec<RepositoryProfile> = reported
            .repositories
            .iter()
            .filter(|repo| expected_ids.contains(repo.id.as_str()))
            .cloned()
            .collect();

        // For unique reported ids the filter caps filtered.len() at
        // expected.len(), so this comparison degenerates to equality.
        if filtered.len() < expected.repositories.len() {
            return Err(Discrepancy::RepositoryCount {
                expected: expected.repositories.len(),
                reported: filtered.len(),
            });
        }
        let pairs: Vec<RepositoryPair> = expected
            .repositories
            .iter()
            .cloned()
            .zip(filtered)
            .collect();
        compare_metadata(pairs)
    }

    fn compare_units(&self, pairs: &[RepositoryPair]) -> Result<(), Discrepancy> {
        let expected = unit_fingerprints(pairs.iter().map(|(e, _)| e));
        let reported = unit_fingerprints(pairs.iter().map(|(_, r)| r));

        let known: HashSet<&String> = expected.iter().collect();
        let filtered: Vec<String> = reported
            .into_iter()
            .filter(|digest| known.contains(digest))
            .collect();

        if filtered != expected {
            return Err(unit_discrepancy(pairs));
        }
        Ok(())
    }
}

/// Convenience wrapper running both checks for one strategy.
#[derive(Debug, Clone, Copy)]
pub struct DriftDetector {
    strategy: SyncStrategy,
}

impl DriftDetector {
    pub fn new(strategy: SyncStrategy) -> Self {
        Self { strategy }
    }

    /// Pair repositories, then compare units. The first discrepancy aborts
    /// the check.
    pub fn detect(&self, expected: &Profile, reported: &Profile) -> Result<(), Discrepancy> {
        let strategy = drift_strategy(self.strategy);
        let pairs = strategy.pair_repositories(expected, reported)?;
        strategy.compare_units(&pairs)
    }

    /// Whether the reported profile is in sync with the expected profile.
    pub fn in_sync(&self, expected: &Profile, reported: &Profile) -> bool {
        match self.detect(expected, reported) {
            Ok(()) => true,
            Err(discrepancy) => {
                tracing::debug!(%discrepancy, "drift detected, update needed");
                false
            }
        }
    }
}

fn compare_metadata(pairs: Vec<RepositoryPair>) -> Result<Vec<RepositoryPair>, Discrepancy> {
    for (expected, reported) in &pairs {
        if expected.metadata_fingerprint() != reported.metadata_fingerprint() {
            return Err(Discrepancy::Repository {
                expected: Box::new(expected.clone()),
                reported: Box::new(reported.clone()),
            });
        }
    }
    Ok(pairs)
}

fn unit_fingerprints<'a>(
    repositories: impl Iterator<Item = &'a RepositoryProfile>,
) -> Vec<String> {
    repositories
        .flat_map(|repo| repo.units.iter().map(fingerprint))
        .collect()
}

fn unit_discrepancy(pairs: &[RepositoryPair]) -> Discrepancy {
    Discrepancy::Unit {
        expected: pairs.iter().map(|(e, _)| e.clone()).collect(),
        reported: pairs.iter().map(|(_, r)| r.clone()).collect(),
    }
}
