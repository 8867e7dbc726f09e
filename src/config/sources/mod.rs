//! Source adapters.
//!
//! Each adapter turns one already-materialized input (schema defaults, a
//! parsed file tree, the environment table, argv tokens) into raw
//! `(key, value)` entries for its fixed layer. Adapters never touch process
//! state and share nothing mutable, so they may run in any order or in
//! parallel; only the merge is ordered.

mod args;
mod env;
mod file;

pub use args::CliAdapter;
pub use env::{DottedEnvAdapter, EnvPrefix, EnvTable, UnderscoredEnvAdapter};
pub use file::FileAdapter;

use super::schema::{Schema, SchemaNode};
use crate::error::ConfigError;
use crate::types::{LayerId, RawEntry};

/// Entries and malformed-input errors produced by one adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntries {
    pub layer: LayerId,
    pub entries: Vec<RawEntry>,
    pub errors: Vec<ConfigError>,
}

impl LayerEntries {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            entries: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Record one raw key/value pair.
    pub fn push(&mut self, raw_key: impl Into<String>, raw_value: impl Into<String>) {
        self.entries
            .push(RawEntry::new(self.layer, raw_key, raw_value));
    }

    /// Record malformed input.
    pub fn reject(&mut self, detail: impl Into<String>) {
        self.errors
            .push(ConfigError::source_format(self.layer, detail));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.errors.is_empty()
    }
}

/// A producer of raw entries for one layer.
pub trait SourceAdapter {
    fn layer(&self) -> LayerId;

    fn produce(&self) -> LayerEntries;
}

/// Layer 1: one entry per schema leaf carrying its stringified default.
#[derive(Debug, Clone, Copy)]
pub struct DefaultsAdapter<'s> {
    schema: &'s Schema,
}

impl<'s> DefaultsAdapter<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }
}

impl SourceAdapter for DefaultsAdapter<'_> {
    fn layer(&self) -> LayerId {
        LayerId::Defaults
    }

    fn produce(&self) -> LayerEntries {
        let mut out = LayerEntries::new(self.layer());
        for path in self.schema.leaf_paths() {
            if let Some(SchemaNode::Leaf(spec)) = self.schema.lookup(path) {
                out.push(path.dotted(), spec.default.to_string());
            }
        }
        out
    }
}
