//! Schema registry: the shape, types and defaults of the configuration tree.
//!
//! The registry is declared as a flat list of leaves (`"database.port"`,
//! default `5432`, constraints) and folded into a tree once at startup.
//! The leaf type is taken from the default value.

use super::validate::satisfies;
use crate::error::SchemaError;
use crate::types::{CanonicalPath, LeafType, Value};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

/// A full-match regular expression constraint for string leaves.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: regex_lite::Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex_lite::Error> {
        let regex = regex_lite::Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Optional declared constraint on a leaf value.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Int or float strictly greater than zero.
    Positive,
    /// Int or float greater than or equal to zero.
    NonNegative,
    /// Int within `min..=max`.
    IntRange { min: i64, max: i64 },
    /// Float within `min..=max`.
    FloatRange { min: f64, max: f64 },
    /// String with at least one non-whitespace character.
    NonEmpty,
    /// String equal to one of the listed values.
    OneOf(Vec<String>),
    /// String fully matching a regular expression.
    Pattern(Pattern),
}

impl Constraint {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn pattern(source: &str) -> Result<Self, regex_lite::Error> {
        Pattern::new(source).map(Constraint::Pattern)
    }

    /// Whether the constraint can be checked against values of `ty`.
    pub fn applies_to(&self, ty: LeafType) -> bool {
        match self {
            Constraint::Positive | Constraint::NonNegative => {
                matches!(ty, LeafType::Int | LeafType::Float)
            }
            Constraint::IntRange { .. } => ty == LeafType::Int,
            Constraint::FloatRange { .. } => ty == LeafType::Float,
            Constraint::NonEmpty | Constraint::OneOf(_) | Constraint::Pattern(_) => {
                ty == LeafType::String
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Positive => write!(f, "positive"),
            Constraint::NonEmpty => write!(f, "non-empty"),
            Constraint::NonNegative => write!(f, "non-negative"),
            Constraint::IntRange { min, max } => write!(f, "between {} and {}", min, max),
            Constraint::FloatRange { min, max } => write!(f, "between {} and {}", min, max),
            Constraint::OneOf(values) => write!(f, "one of [{}]", values.join(", ")),
            Constraint::Pattern(p) => write!(f, "matches /{}/", p.as_str()),
        }
    }
}

/// Declaration of a single leaf, as written in the compiled-in schema.
#[derive(Debug, Clone)]
pub struct LeafDecl {
    pub path: String,
    pub default: Value,
    pub constraints: Vec<Constraint>,
}

impl LeafDecl {
    pub fn new(path: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            default: default.into(),
            constraints: Vec::new(),
        }
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Type, default and constraints of a leaf.
#[derive(Debug, Clone)]
pub struct LeafSpec {
    pub leaf_type: LeafType,
    pub default: Value,
    pub constraints: Vec<Constraint>,
}

/// A node in the schema tree.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Leaf(LeafSpec),
    Group(BTreeMap<String, SchemaNode>),
}

impl SchemaNode {
    pub fn as_leaf(&self) -> Option<&LeafSpec> {
        match self {
            SchemaNode::Leaf(spec) => Some(spec),
            SchemaNode::Group(_) => None,
        }
    }

    pub fn child(&self, segment: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Group(children) => children.get(segment),
            SchemaNode::Leaf(_) => None,
        }
    }
}

/// Immutable registry of every configuration leaf.
#[derive(Debug, Clone)]
pub struct Schema {
    root: SchemaNode,
    leaves: Vec<CanonicalPath>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Build a registry from flat leaf declarations.
    pub fn from_decls(decls: impl IntoIterator<Item = LeafDecl>) -> Result<Self, SchemaError> {
        let mut root = BTreeMap::new();
        for decl in decls {
            insert_leaf(&mut root, decl)?;
        }
        if root.is_empty() {
            return Err(SchemaError::Empty);
        }

        let root = SchemaNode::Group(root);
        let mut leaves = Vec::new();
        collect_leaves(&root, &mut Vec::new(), &mut leaves);
        Ok(Self { root, leaves })
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Node addressed by `segments`, if any. An empty slice names the root.
    pub fn node_at<S: AsRef<str>>(&self, segments: &[S]) -> Option<&SchemaNode> {
        segments
            .iter()
            .try_fold(&self.root, |node, seg| node.child(seg.as_ref()))
    }

    pub fn lookup(&self, path: &CanonicalPath) -> Option<&SchemaNode> {
        self.node_at(path.segments())
    }

    pub fn leaf(&self, path: &CanonicalPath) -> Option<&LeafSpec> {
        self.lookup(path).and_then(SchemaNode::as_leaf)
    }

    /// Every leaf path in sorted order. Each call starts a fresh iteration.
    pub fn leaf_paths(&self) -> impl Iterator<Item = &CanonicalPath> + Clone + '_ {
        self.leaves.iter()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }
}

/// Accumulates leaf declarations for [`Schema::from_decls`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    decls: Vec<LeafDecl>,
}

impl SchemaBuilder {
    pub fn leaf(mut self, decl: LeafDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn bool(self, path: &str, default: bool) -> Self {
        self.leaf(LeafDecl::new(path, default))
    }

    pub fn int(self, path: &str, default: i64) -> Self {
        self.leaf(LeafDecl::new(path, default))
    }

    pub fn float(self, path: &str, default: f64) -> Self {
        self.leaf(LeafDecl::new(path, default))
    }

    pub fn string(self, path: &str, default: &str) -> Self {
        self.leaf(LeafDecl::new(path, default))
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::from_decls(self.decls)
    }
}

/// Segment names must stay unambiguous in every source notation: `.` and
/// `_` are separators, and uppercase would not survive the uppercase-env
/// lowercasing.
fn check_segment(path: &str, segment: &str) -> Result<(), SchemaError> {
    let invalid = |reason| SchemaError::InvalidSegment {
        path: path.to_string(),
        segment: segment.to_string(),
        reason,
    };
    if segment.is_empty() {
        return Err(invalid("segment is empty"));
    }
    if segment.contains('_') {
        return Err(invalid("'_' separates segments in environment variable names"));
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("only lowercase letters, digits and '-' are allowed"));
    }
    Ok(())
}

fn check_leaf(decl: &LeafDecl) -> Result<LeafSpec, SchemaError> {
    let leaf_type = decl.default.leaf_type();
    if let Value::Float(f) = decl.default
        && !f.is_finite()
    {
        return Err(SchemaError::NonFiniteDefault {
            path: decl.path.clone(),
            default: decl.default.to_string(),
        });
    }
    for constraint in &decl.constraints {
        if !constraint.applies_to(leaf_type) {
            return Err(SchemaError::ConstraintTypeMismatch {
                path: decl.path.clone(),
                constraint: constraint.to_string(),
                leaf_type,
            });
        }
        if !satisfies(constraint, &decl.default) {
            return Err(SchemaError::DefaultViolatesConstraint {
                path: decl.path.clone(),
                default: decl.default.to_string(),
                constraint: constraint.to_string(),
            });
        }
    }
    Ok(LeafSpec {
        leaf_type,
        default: decl.default.clone(),
        constraints: decl.constraints.clone(),
    })
}

fn insert_leaf(root: &mut BTreeMap<String, SchemaNode>, decl: LeafDecl) -> Result<(), SchemaError> {
    let segments: Vec<&str> = decl.path.split('.').collect();
    for segment in &segments {
        check_segment(&decl.path, segment)?;
    }
    let spec = check_leaf(&decl)?;

    let conflict = || SchemaError::LeafGroupConflict {
        path: decl.path.clone(),
    };
    let Some((last, parents)) = segments.split_last() else {
        return Err(SchemaError::Empty);
    };

    let mut children = root;
    for segment in parents {
        let node = children
            .entry(segment.to_string())
            .or_insert_with(|| SchemaNode::Group(BTreeMap::new()));
        children = match node {
            SchemaNode::Group(c) => c,
            SchemaNode::Leaf(_) => return Err(conflict()),
        };
    }

    match children.entry(last.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(SchemaNode::Leaf(spec));
            Ok(())
        }
        Entry::Occupied(existing) => match existing.get() {
            SchemaNode::Leaf(_) => Err(SchemaError::Duplicate {
                path: decl.path.clone(),
            }),
            SchemaNode::Group(_) => Err(conflict()),
        },
    }
}

fn collect_leaves(node: &SchemaNode, prefix: &mut Vec<String>, out: &mut Vec<CanonicalPath>) {
    match node {
        SchemaNode::Leaf(_) => out.push(CanonicalPath::new(prefix.clone())),
        SchemaNode::Group(children) => {
            for (name, child) in children {
                prefix.push(name.clone());
                collect_leaves(child, prefix, out);
                prefix.pop();
            }
        }
    }
}
