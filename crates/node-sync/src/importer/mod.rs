//! Unit synchronization within one repository
//!
//! The content-unit counterpart of the repository pass: given the child's
//! unit inventory and the parent's published unit set for a repository,
//! add the missing units and (under the mirror strategy) remove the units
//! the parent no longer publishes. A [`crate::RepositoryStore`]
//! implementation typically drives one of these strategies from
//! `run_synchronization`.

mod inventory;
mod strategy;

pub use inventory::{Unit, UnitInventory, UnitKey};
pub use strategy::{
    AdditiveImporter, ImporterStrategy, MirrorImporter, UnitCatalog, UnitStore,
    find_importer_strategy, importer_strategy,
};
