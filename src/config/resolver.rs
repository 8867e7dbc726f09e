//! Key-path resolution: source notation to canonical schema path.
//!
//! Both notations reduce to the same walk. Segment names never contain `.`
//! or `_` (enforced when the schema is built), so splitting an underscored
//! key yields exactly the canonical segments and no backtracking is needed.

use super::schema::{Schema, SchemaNode};
use crate::types::{CanonicalPath, KeyNotation};
use std::fmt;

/// Why a raw key failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMiss {
    /// The key has an empty segment (leading, trailing or doubled separator).
    EmptySegment,
    /// No child named `segment` exists under `parent`.
    NoSuchSegment { parent: String, segment: String },
    /// The key stops at a group instead of a leaf.
    EndsAtGroup { group: String },
    /// The key continues past a leaf.
    PastLeaf { leaf: String },
}

impl fmt::Display for PathMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMiss::EmptySegment => write!(f, "key contains an empty segment"),
            PathMiss::NoSuchSegment { parent, segment } if parent.is_empty() => {
                write!(f, "no top-level setting named '{}'", segment)
            }
            PathMiss::NoSuchSegment { parent, segment } => {
                write!(f, "'{}' has no setting named '{}'", parent, segment)
            }
            PathMiss::EndsAtGroup { group } => {
                write!(f, "'{}' is a group of settings, not a single value", group)
            }
            PathMiss::PastLeaf { leaf } => {
                write!(f, "'{}' is a single value and has no nested settings", leaf)
            }
        }
    }
}

/// Resolves raw keys against a schema.
#[derive(Debug, Clone, Copy)]
pub struct KeyResolver<'s> {
    schema: &'s Schema,
}

impl<'s> KeyResolver<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Map `raw_key` to the canonical path of an existing leaf.
    ///
    /// The whole key must be consumed and the walk must stop exactly on a
    /// leaf; partial paths into a group are rejected.
    pub fn resolve(&self, raw_key: &str, notation: KeyNotation) -> Result<CanonicalPath, PathMiss> {
        let segments: Vec<&str> = raw_key.split(notation.separator()).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PathMiss::EmptySegment);
        }

        let mut node = self.schema.root();
        let mut walked: Vec<String> = Vec::with_capacity(segments.len());
        for segment in segments {
            match node {
                SchemaNode::Leaf(_) => {
                    return Err(PathMiss::PastLeaf {
                        leaf: walked.join("."),
                    });
                }
                SchemaNode::Group(children) => {
                    node = children.get(segment).ok_or_else(|| PathMiss::NoSuchSegment {
                        parent: walked.join("."),
                        segment: segment.to_string(),
                    })?;
                    walked.push(segment.to_string());
                }
            }
        }

        match node {
            SchemaNode::Leaf(_) => Ok(CanonicalPath::new(walked)),
            SchemaNode::Group(_) => Err(PathMiss::EndsAtGroup {
                group: walked.join("."),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::builder()
            .int("port", 3000)
            .int("database.port", 5432)
            .int("database.max.connections", 10)
            .string("log.level", "info")
            .build()
            .unwrap()
    }

    #[test]
    fn test_dotted_resolves_leaf() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        let path = resolver
            .resolve("database.max.connections", KeyNotation::Dotted)
            .unwrap();
        assert_eq!(path.segments(), ["database", "max", "connections"]);
    }

    #[test]
    fn test_underscored_resolves_same_path() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        let dotted = resolver.resolve("database.max.connections", KeyNotation::Dotted);
        let underscored = resolver.resolve("database_max_connections", KeyNotation::Underscored);
        assert_eq!(dotted, underscored);
    }

    #[test]
    fn test_every_leaf_round_trips_in_both_notations() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        for path in schema.leaf_paths() {
            let underscored = path.segments().join("_");
            assert_eq!(
                resolver.resolve(&path.dotted(), KeyNotation::Dotted).as_ref(),
                Ok(path)
            );
            assert_eq!(
                resolver.resolve(&underscored, KeyNotation::Underscored).as_ref(),
                Ok(path)
            );
        }
    }

    #[test]
    fn test_typo_is_unknown_segment() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        let miss = resolver.resolve("databse.port", KeyNotation::Dotted).unwrap_err();
        assert_eq!(
            miss,
            PathMiss::NoSuchSegment {
                parent: String::new(),
                segment: "databse".into()
            }
        );
    }

    #[test]
    fn test_group_is_not_a_leaf() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        let miss = resolver.resolve("database_max", KeyNotation::Underscored).unwrap_err();
        assert_eq!(miss, PathMiss::EndsAtGroup { group: "database.max".into() });
    }

    #[test]
    fn test_trailing_segments_after_leaf_rejected() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        let miss = resolver.resolve("port_number", KeyNotation::Underscored).unwrap_err();
        assert_eq!(miss, PathMiss::PastLeaf { leaf: "port".into() });
    }

    #[test]
    fn test_empty_segments_rejected() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        for key in ["", "database..port", ".port", "port."] {
            assert_eq!(
                resolver.resolve(key, KeyNotation::Dotted),
                Err(PathMiss::EmptySegment)
            );
        }
        assert_eq!(
            resolver.resolve("database__port", KeyNotation::Underscored),
            Err(PathMiss::EmptySegment)
        );
    }

    #[test]
    fn test_dotted_key_does_not_split_on_underscore() {
        let schema = schema();
        let resolver = KeyResolver::new(&schema);
        assert!(resolver.resolve("log_level", KeyNotation::Dotted).is_err());
    }
}
