//! Layered merge.
//!
//! Two merges live here:
//! - [`merge`] folds resolved entries of the five layers into the leaf tree.
//!   A layer overwrites only the leaves it names, never a whole group.
//! - [`deep_merge`] combines several parsed files into the single tree the
//!   file layer flattens. Objects merge by key, anything else is replaced.

use super::coerce::coerce;
use super::resolver::KeyResolver;
use super::schema::Schema;
use super::sources::LayerEntries;
use super::tree::ConfigTree;
use super::validate::validate;
use crate::error::{ConfigError, ResolutionErrors, ResolutionResult};
use crate::types::{CanonicalPath, KeyNotation, RawEntry, ResolvedValue};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Merge the entries of every layer and validate the result.
///
/// Layers are applied in ascending precedence whatever order they are
/// passed in. Every adapter, resolution, coercion and constraint error is
/// collected; if any occurred the whole call fails.
pub fn merge(schema: &Schema, mut layers: Vec<LayerEntries>) -> ResolutionResult<ConfigTree> {
    layers.sort_by_key(|l| l.layer);

    let resolver = KeyResolver::new(schema);
    let mut working: BTreeMap<CanonicalPath, ResolvedValue> = BTreeMap::new();
    let mut errors: Vec<ConfigError> = Vec::new();

    for layer in layers {
        debug!(
            layer = %layer.layer,
            entries = layer.entries.len(),
            malformed = layer.errors.len(),
            "Applying configuration layer"
        );
        errors.extend(layer.errors);

        let notation = layer.layer.notation();
        for entry in &layer.entries {
            match apply_entry(schema, &resolver, notation, entry) {
                Ok(resolved) => {
                    if let Some(previous) = working.get(&resolved.path)
                        && previous.source != resolved.source
                    {
                        debug!(
                            key = %resolved.path,
                            from = %previous.source,
                            to = %resolved.source,
                            "Leaf overridden"
                        );
                    }
                    working.insert(resolved.path.clone(), resolved);
                }
                Err(err) => errors.push(err),
            }
        }
    }

    errors.extend(validate(schema, &working));

    if errors.is_empty() {
        info!(leaves = working.len(), "Configuration resolved");
        Ok(ConfigTree::from_resolved(working))
    } else {
        for err in &errors {
            warn!("{}", err);
        }
        Err(ResolutionErrors::new(errors))
    }
}

fn apply_entry(
    schema: &Schema,
    resolver: &KeyResolver<'_>,
    notation: KeyNotation,
    entry: &RawEntry,
) -> Result<ResolvedValue, ConfigError> {
    let path = resolver
        .resolve(&entry.raw_key, notation)
        .map_err(|miss| ConfigError::unknown_path(entry.layer, &entry.raw_key, miss))?;

    let Some(spec) = schema.leaf(&path) else {
        return Err(ConfigError::unknown_path(
            entry.layer,
            &entry.raw_key,
            "not a leaf",
        ));
    };

    let value = coerce(&entry.raw_value, spec.leaf_type).map_err(|reason| ConfigError::Coercion {
        layer: entry.layer,
        raw_key: entry.raw_key.clone(),
        path: path.clone(),
        raw_value: entry.raw_value.clone(),
        expected: spec.leaf_type,
        reason,
    })?;

    Ok(ResolvedValue {
        path,
        value,
        source: entry.layer,
    })
}

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sources::{DefaultsAdapter, SourceAdapter};
    use crate::types::{LayerId, Value as Typed};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .int("port", 3000)
            .int("database.port", 5432)
            .int("database.max.connections", 10)
            .bool("debug", false)
            .build()
            .unwrap()
    }

    fn layer(id: LayerId, pairs: &[(&str, &str)]) -> LayerEntries {
        let mut out = LayerEntries::new(id);
        for (k, v) in pairs {
            out.push(*k, *v);
        }
        out
    }

    #[test]
    fn test_defaults_only() {
        let schema = schema();
        let tree = merge(&schema, vec![DefaultsAdapter::new(&schema).produce()]).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get_int("port"), Some(3000));
        assert_eq!(tree.source_of("debug"), Some(LayerId::Defaults));
    }

    #[test]
    fn test_higher_layer_wins_regardless_of_input_order() {
        let schema = schema();
        let layers = vec![
            layer(LayerId::Cli, &[("port", "9000")]),
            layer(LayerId::File, &[("port", "8080")]),
            DefaultsAdapter::new(&schema).produce(),
            layer(LayerId::UppercaseEnv, &[("port", "6000")]),
        ];
        let tree = merge(&schema, layers).unwrap();
        assert_eq!(tree.get_int("port"), Some(9000));
        assert_eq!(tree.source_of("port"), Some(LayerId::Cli));
    }

    #[test]
    fn test_leaf_granular_override() {
        let schema = schema();
        let layers = vec![
            DefaultsAdapter::new(&schema).produce(),
            layer(LayerId::File, &[("database.port", "6543")]),
            layer(LayerId::LowercaseEnv, &[("database.max.connections", "99")]),
        ];
        let tree = merge(&schema, layers).unwrap();
        assert_eq!(tree.get_int("database.port"), Some(6543));
        assert_eq!(tree.source_of("database.port"), Some(LayerId::File));
        assert_eq!(tree.get_int("database.max.connections"), Some(99));
        assert_eq!(
            tree.source_of("database.max.connections"),
            Some(LayerId::LowercaseEnv)
        );
        assert_eq!(tree.get_int("port"), Some(3000));
    }

    #[test]
    fn test_later_entry_in_same_layer_wins() {
        let schema = schema();
        let layers = vec![
            DefaultsAdapter::new(&schema).produce(),
            layer(LayerId::Cli, &[("port", "1"), ("port", "2")]),
        ];
        let tree = merge(&schema, layers).unwrap();
        assert_eq!(tree.get_int("port"), Some(2));
    }

    #[test]
    fn test_errors_aggregated_across_layers() {
        let schema = schema();
        let mut file = layer(LayerId::File, &[("port", "abc")]);
        file.reject("broken file");
        let layers = vec![
            DefaultsAdapter::new(&schema).produce(),
            file,
            layer(LayerId::UppercaseEnv, &[("databse_port", "1")]),
        ];
        let errors = merge(&schema, layers).unwrap_err();
        assert_eq!(errors.len(), 3);
        let codes: Vec<_> = errors.errors().iter().map(|e| e.code()).collect();
        assert!(codes.contains(&crate::error::ErrorCode::Coercion));
        assert!(codes.contains(&crate::error::ErrorCode::UnknownPath));
        assert!(codes.contains(&crate::error::ErrorCode::SourceFormat));
    }

    #[test]
    fn test_failed_entry_does_not_apply() {
        let schema = schema();
        let layers = vec![
            DefaultsAdapter::new(&schema).produce(),
            layer(LayerId::File, &[("debug", "maybe")]),
        ];
        let errors = merge(&schema, layers).unwrap_err();
        assert_eq!(errors.len(), 1);
        match &errors.errors()[0] {
            ConfigError::Coercion { layer, raw_value, .. } => {
                assert_eq!(*layer, LayerId::File);
                assert_eq!(raw_value, "maybe");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_defaults_reported_as_missing() {
        let schema = schema();
        let errors = merge(&schema, vec![layer(LayerId::Cli, &[("port", "1")])]).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(
            errors
                .errors()
                .iter()
                .all(|e| matches!(e, ConfigError::Constraint { .. }))
        );
    }

    #[test]
    fn test_merge_is_deterministic() {
        let schema = schema();
        let build = || {
            vec![
                DefaultsAdapter::new(&schema).produce(),
                layer(LayerId::File, &[("database.port", "7000")]),
                layer(LayerId::Cli, &[("debug", "yes")]),
            ]
        };
        let first = merge(&schema, build()).unwrap();
        let second = merge(&schema, build()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.get("debug").map(|r| &r.value), Some(&Typed::Bool(true)));
    }

    #[test]
    fn test_deep_merge_nested_objects() {
        let base = json!({
            "server": {"host": "localhost", "port": 8080},
            "debug": true
        });
        let overlay = json!({
            "server": {"port": 9000}
        });
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({
                "server": {"host": "localhost", "port": 9000},
                "debug": true
            })
        );
    }

    #[test]
    fn test_deep_merge_null_preserves_base() {
        let base = json!({"a": 1, "b": {"c": 2}});
        let overlay = json!({"a": null, "b": {"c": null}});
        assert_eq!(deep_merge(base, overlay), json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn test_deep_merge_all_later_wins() {
        let values = vec![json!({"a": 1}), json!({"b": 2}), json!({"a": 3, "c": 4})];
        assert_eq!(deep_merge_all(values), json!({"a": 3, "b": 2, "c": 4}));
    }

    #[test]
    fn test_deep_merge_all_of_nothing_is_null() {
        assert_eq!(deep_merge_all(Vec::new()), Value::Null);
    }
}
