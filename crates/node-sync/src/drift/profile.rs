//! Profiles and fingerprinting

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A snapshot of repository/unit state on one side of a drift check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub repositories: Vec<RepositoryProfile>,
}

impl Profile {
    pub fn new(repositories: Vec<RepositoryProfile>) -> Self {
        Self { repositories }
    }
}

/// One repository's entry in a profile.
///
/// Metadata fields beyond the id are open-ended and flattened into the
/// document; the drift check never interprets them, it only fingerprints
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryProfile {
    pub id: String,
    /// Repository metadata beyond the id
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
    /// Content units, opaque to the drift check beyond their fingerprint
    #[serde(default)]
    pub units: Vec<Value>,
}

impl RepositoryProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: Map::new(),
            units: Vec::new(),
        }
    }

    /// The repository document with the `units` field stripped, as compared
    /// by the drift strategies.
    pub fn metadata_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("id".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.metadata {
            if key != "units" {
                doc.insert(key.clone(), value.clone());
            }
        }
        Value::Object(doc)
    }

    pub fn metadata_fingerprint(&self) -> String {
        fingerprint(&self.metadata_document())
    }
}

/// Stable hex SHA-256 digest of a JSON value.
///
/// Object keys are hashed in sorted order, so the digest is independent of
/// field ordering but strict about value identity. Array order is
/// significant.
pub fn fingerprint(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hash_value(&mut hasher, value);
    format!("{:x}", hasher.finalize())
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update(b"n"),
        Value::Bool(flag) => {
            hasher.update(b"b");
            hasher.update([*flag as u8]);
        }
        Value::Number(number) => {
            hasher.update(b"#");
            hasher.update(number.to_string().as_bytes());
        }
        Value::String(text) => {
            hash_str(hasher, text);
        }
        Value::Array(items) => {
            hasher.update(b"[");
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
        Value::Object(map) => {
            hasher.update(b"{");
            hasher.update((map.len() as u64).to_be_bytes());
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                hash_str(hasher, key);
                hash_value(hasher, &map[key.as_str()]);
            }
        }
    }
}

fn hash_str(hasher: &mut Sha256, text: &str) {
    hasher.update(b"s");
    hasher.update((text.len() as u64).to_be_bytes());
    hasher.update(text.as_bytes());
}
