//! Unit inventories for one repository

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::drift::fingerprint;

/// One content unit as exchanged with the unit collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub type_id: String,
    /// Identity fields; two units with equal keys are the same unit
    pub unit_key: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Where the unit's file is stored locally, when it has one
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    /// Where the unit's file can be fetched from, when it has one
    #[serde(default)]
    pub download_url: Option<String>,
}

impl Unit {
    pub fn new(type_id: impl Into<String>, unit_key: Map<String, Value>) -> Self {
        Self {
            type_id: type_id.into(),
            unit_key,
            metadata: Map::new(),
            storage_path: None,
            download_url: None,
        }
    }

    /// The unit's stable identity.
    pub fn key(&self) -> UnitKey {
        UnitKey {
            type_id: self.type_id.clone(),
            digest: fingerprint(&Value::Object(self.unit_key.clone())),
        }
    }
}

/// Stable unit identity: the type plus a digest of the identity fields,
/// independent of field ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub type_id: String,
    pub digest: String,
}

/// Child and parent unit sets for one repository, keyed by unit identity.
#[derive(Debug, Clone)]
pub struct UnitInventory {
    repo_id: String,
    child: BTreeMap<UnitKey, Unit>,
    parent: BTreeMap<UnitKey, Unit>,
}

impl UnitInventory {
    pub fn new(repo_id: impl Into<String>, child: Vec<Unit>, parent: Vec<Unit>) -> Self {
        Self {
            repo_id: repo_id.into(),
            child: keyed(child),
            parent: keyed(parent),
        }
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// Units published by the parent with no child counterpart, in
    /// deterministic key order. These are the units to add.
    pub fn parent_only(&self) -> Vec<&Unit> {
        self.parent
            .iter()
            .filter(|(key, _)| !self.child.contains_key(key))
            .map(|(_, unit)| unit)
            .collect()
    }

    /// Units in the child inventory the parent no longer publishes, in
    /// deterministic key order. These are the units to remove under the
    /// mirror strategy.
    pub fn child_only(&self) -> Vec<&Unit> {
        self.child
            .iter()
            .filter(|(key, _)| !self.parent.contains_key(key))
            .map(|(_, unit)| unit)
            .collect()
    }
}

fn keyed(units: Vec<Unit>) -> BTreeMap<UnitKey, Unit> {
    units.into_iter().map(|unit| (unit.key(), unit)).collect()
}
