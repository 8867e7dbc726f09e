//! Layer 2: a parsed configuration file tree.

use super::{LayerEntries, SourceAdapter};
use crate::config::files::value_kind;
use crate::types::LayerId;
use serde_json::Value;
use tracing::debug;

/// Flattens a nested file tree into dotted keys.
///
/// Strings pass through; booleans and numbers are re-stringified so that
/// all typing happens in the coercer. `null` means "not specified" and
/// emits nothing. Arrays have no leaf type and are rejected.
#[derive(Debug, Clone, Copy)]
pub struct FileAdapter<'a> {
    tree: &'a Value,
}

impl<'a> FileAdapter<'a> {
    pub fn new(tree: &'a Value) -> Self {
        Self { tree }
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut LayerEntries) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.is_empty() {
                    out.reject(format!("empty key under '{}'", display_prefix(prefix)));
                    continue;
                }
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        Value::String(s) => out.push(prefix, s.as_str()),
        Value::Bool(b) => out.push(prefix, b.to_string()),
        Value::Number(n) => out.push(prefix, n.to_string()),
        Value::Null => debug!(key = %prefix, "Null file value treated as unset"),
        Value::Array(_) => out.reject(format!(
            "'{}' is a list; only scalar values are supported",
            prefix
        )),
    }
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() { "<root>" } else { prefix }
}

impl SourceAdapter for FileAdapter<'_> {
    fn layer(&self) -> LayerId {
        LayerId::File
    }

    fn produce(&self) -> LayerEntries {
        let mut out = LayerEntries::new(self.layer());
        match self.tree {
            Value::Null => {}
            Value::Object(_) => flatten("", self.tree, &mut out),
            other => out.reject(format!(
                "file root must be a map of settings, found {}",
                value_kind(other)
            )),
        }
        out
    }
}
