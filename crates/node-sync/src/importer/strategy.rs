//! Unit synchronization strategies
//!
//! Per-unit failures are isolated the same way per-repository failures are
//! in the repository pass: the failed unit is reported and the remaining
//! units are still attempted. Cancellation is checked before every unit
//! mutation.

use serde_json::Value;

use crate::error::{NodeError, StoreError, StrategyUnsupported};
use crate::importer::inventory::{Unit, UnitInventory};
use crate::report::ImportReport;
use crate::request::CancellationFlag;
use crate::sync::SyncStrategy;

/// Child-side unit inventory operations for one repository.
///
/// `add_unit` is responsible for fetching the unit's file when it has one
/// (`download_url`); a failed fetch surfaces as
/// [`NodeError::UnitDownload`].
pub trait UnitStore {
    /// Enumerate the units currently associated with the repository.
    fn units(&self, repo_id: &str) -> Result<Vec<Unit>, StoreError>;

    /// Add a unit to the repository, fetching its file if it has one.
    fn add_unit(&mut self, repo_id: &str, unit: &Unit) -> Result<(), StoreError>;

    /// Remove a unit from the repository.
    fn remove_unit(&mut self, repo_id: &str, unit: &Unit) -> Result<(), StoreError>;
}

/// Parent-side view of the units published for a repository.
pub trait UnitCatalog {
    /// Enumerate the units the parent publishes for the repository.
    fn published_units(&self, repo_id: &str) -> Result<Vec<Unit>, StoreError>;

    /// Content origins to report, if the catalog tracks them.
    fn sources(&self, _repo_id: &str) -> Vec<Value> {
        Vec::new()
    }
}

/// Unit-set reconciliation policy within one repository.
pub trait ImporterStrategy {
    /// Reconcile the child's unit set against the parent's published set.
    ///
    /// Never fails: enumeration and per-unit failures are folded into the
    /// returned report as serialized error documents.
    fn synchronize_units(
        &self,
        repo_id: &str,
        store: &mut dyn UnitStore,
        catalog: &dyn UnitCatalog,
        cancelled: &CancellationFlag,
    ) -> ImportReport;
}

/// Find an importer strategy by name.
pub fn find_importer_strategy(
    name: &str,
) -> std::result::Result<&'static dyn ImporterStrategy, StrategyUnsupported> {
    Ok(importer_strategy(name.parse()?))
}

/// Select the importer behavior for a strategy.
pub fn importer_strategy(kind: SyncStrategy) -> &'static dyn ImporterStrategy {
    match kind {
        SyncStrategy::Mirror => &MirrorImporter,
        SyncStrategy::Additive => &AdditiveImporter,
    }
}

/// Adds missing units, then removes units the parent no longer publishes,
/// keeping the child's unit set an exact mirror of the parent's.
pub struct MirrorImporter;

impl ImporterStrategy for MirrorImporter {
    fn synchronize_units(
        &self,
        repo_id: &str,
        store: &mut dyn UnitStore,
        catalog: &dyn UnitCatalog,
        cancelled: &CancellationFlag,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        let inventory = match build_inventory(repo_id, store, catalog) {
            Ok(inventory) => inventory,
            Err(error) => {
                report.errors.push(error_document(&error));
                return report;
            }
        };

        add_units(&mut report, &inventory, store, cancelled);
        if !cancelled.is_set() {
            remove_units(&mut report, &inventory, store, cancelled);
        }
        report.sources = catalog.sources(repo_id);
        report
    }
}

/// Adds missing units only; units the parent no longer publishes are
/// permitted to remain in the child inventory.
pub struct AdditiveImporter;

impl ImporterStrategy for AdditiveImporter {
    fn synchronize_units(
        &self,
        repo_id: &str,
        store: &mut dyn UnitStore,
        catalog: &dyn UnitCatalog,
        cancelled: &CancellationFlag,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        let inventory = match build_inventory(repo_id, store, catalog) {
            Ok(inventory) => inventory,
            Err(error) => {
                report.errors.push(error_document(&error));
                return report;
            }
        };

        add_units(&mut report, &inventory, store, cancelled);
        report.sources = catalog.sources(repo_id);
        report
    }
}

/// Enumerate both sides. An expected failure passes through; anything else
/// maps to the enumeration error for its side.
fn build_inventory(
    repo_id: &str,
    store: &dyn UnitStore,
    catalog: &dyn UnitCatalog,
) -> std::result::Result<UnitInventory, NodeError> {
    let child = store.units(repo_id).map_err(|error| match error {
        StoreError::Node(error) => error,
        StoreError::Other(error) => {
            tracing::error!(repo_id, %error, "child unit enumeration failed");
            NodeError::GetChildUnits {
                repo_id: repo_id.to_string(),
            }
        }
    })?;
    let parent = catalog.published_units(repo_id).map_err(|error| match error {
        StoreError::Node(error) => error,
        StoreError::Other(error) => {
            tracing::error!(repo_id, %error, "parent unit enumeration failed");
            NodeError::GetParentUnits {
                repo_id: repo_id.to_string(),
            }
        }
    })?;
    Ok(UnitInventory::new(repo_id, child, parent))
}

fn add_units(
    report: &mut ImportReport,
    inventory: &UnitInventory,
    store: &mut dyn UnitStore,
    cancelled: &CancellationFlag,
) {
    let repo_id = inventory.repo_id();
    for unit in inventory.parent_only() {
        if cancelled.is_set() {
            break;
        }
        match store.add_unit(repo_id, unit) {
            Ok(()) => report.added_count += 1,
            Err(error) => {
                push_unit_error(report, repo_id, error, |repo_id| NodeError::AddUnit {
                    repo_id,
                });
            }
        }
    }
}

fn remove_units(
    report: &mut ImportReport,
    inventory: &UnitInventory,
    store: &mut dyn UnitStore,
    cancelled: &CancellationFlag,
) {
    let repo_id = inventory.repo_id();
    for unit in inventory.child_only() {
        if cancelled.is_set() {
            break;
        }
        match store.remove_unit(repo_id, unit) {
            Ok(()) => report.removed_count += 1,
            Err(error) => {
                push_unit_error(report, repo_id, error, |repo_id| NodeError::DeleteUnit {
                    repo_id,
                });
            }
        }
    }
}

/// Record one unit's failure: expected failures keep their identity,
/// unexpected ones map to the operation's error after being logged.
fn push_unit_error(
    report: &mut ImportReport,
    repo_id: &str,
    error: StoreError,
    operation_error: impl FnOnce(String) -> NodeError,
) {
    let node_error = match error {
        StoreError::Node(error) => error,
        StoreError::Other(error) => {
            tracing::error!(repo_id, %error, "unit operation failed");
            operation_error(repo_id.to_string())
        }
    };
    report.errors.push(error_document(&node_error));
}

fn error_document(error: &NodeError) -> Value {
    serde_json::to_value(error).unwrap_or_else(|_| Value::String(error.to_string()))
}
