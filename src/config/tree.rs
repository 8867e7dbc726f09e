//! The resolved, immutable configuration snapshot.

use crate::types::{CanonicalPath, LayerId, ResolvedValue, Value};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Map;
use std::collections::BTreeMap;

/// Every schema leaf with its winning value and source layer.
///
/// Built once by the merge engine and never mutated afterwards; share it
/// across threads behind an `Arc` or a `OnceLock`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    values: BTreeMap<CanonicalPath, ResolvedValue>,
}

impl ConfigTree {
    pub(crate) fn from_resolved(values: BTreeMap<CanonicalPath, ResolvedValue>) -> Self {
        Self { values }
    }

    /// Look up a leaf by its dotted path.
    pub fn get(&self, dotted: &str) -> Option<&ResolvedValue> {
        let path = CanonicalPath::new(dotted.split('.').map(String::from).collect());
        self.values.get(&path)
    }

    pub fn get_path(&self, path: &CanonicalPath) -> Option<&ResolvedValue> {
        self.values.get(path)
    }

    pub fn value(&self, dotted: &str) -> Option<&Value> {
        self.get(dotted).map(|r| &r.value)
    }

    pub fn get_bool(&self, dotted: &str) -> Option<bool> {
        self.value(dotted).and_then(Value::as_bool)
    }

    pub fn get_int(&self, dotted: &str) -> Option<i64> {
        self.value(dotted).and_then(Value::as_int)
    }

    pub fn get_float(&self, dotted: &str) -> Option<f64> {
        self.value(dotted).and_then(Value::as_float)
    }

    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        self.value(dotted).and_then(Value::as_str)
    }

    /// Layer that supplied the winning value.
    pub fn source_of(&self, dotted: &str) -> Option<LayerId> {
        self.get(dotted).map(|r| r.source)
    }

    /// Leaves in canonical path order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedValue> {
        self.values.values()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// How many leaves each layer won.
    pub fn layer_counts(&self) -> BTreeMap<LayerId, usize> {
        let mut counts = BTreeMap::new();
        for resolved in self.values.values() {
            *counts.entry(resolved.source).or_insert(0) += 1;
        }
        counts
    }

    /// Nested JSON view mirroring the schema's group structure.
    pub fn to_json(&self) -> serde_json::Value {
        let mut root = Map::new();
        for resolved in self.values.values() {
            insert_nested(&mut root, resolved.path.segments(), resolved.value.to_json());
        }
        serde_json::Value::Object(root)
    }

    /// Deserialize the tree into an application-defined struct.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn insert_nested(
    root: &mut Map<String, serde_json::Value>,
    segments: &[String],
    value: serde_json::Value,
) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut map = root;
    for segment in parents {
        let slot = map
            .entry(segment.clone())
            .or_insert_with(|| serde_json::Value::Object(Map::new()));
        let serde_json::Value::Object(next) = slot else {
            return;
        };
        map = next;
    }
    map.insert(last.clone(), value);
}
