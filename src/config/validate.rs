//! Post-merge validation of the working tree against the schema.

use super::schema::{Constraint, Schema};
use crate::error::ConfigError;
use crate::types::{CanonicalPath, ResolvedValue, Value};
use std::collections::BTreeMap;

/// Whether `value` satisfies `constraint`. A constraint that does not apply
/// to the value's type is never satisfied.
pub fn satisfies(constraint: &Constraint, value: &Value) -> bool {
    match (constraint, value) {
        (Constraint::Positive, Value::Int(i)) => *i > 0,
        (Constraint::Positive, Value::Float(f)) => *f > 0.0,
        (Constraint::NonNegative, Value::Int(i)) => *i >= 0,
        (Constraint::NonNegative, Value::Float(f)) => *f >= 0.0,
        (Constraint::IntRange { min, max }, Value::Int(i)) => (*min..=*max).contains(i),
        (Constraint::FloatRange { min, max }, Value::Float(f)) => *min <= *f && *f <= *max,
        (Constraint::NonEmpty, Value::String(s)) => !s.trim().is_empty(),
        (Constraint::OneOf(allowed), Value::String(s)) => allowed.iter().any(|a| a == s),
        (Constraint::Pattern(p), Value::String(s)) => p.is_match(s),
        _ => false,
    }
}

/// Check every schema leaf in `tree` for presence, type and constraints.
///
/// All violations are returned; an empty vector means the tree is valid.
pub fn validate(schema: &Schema, tree: &BTreeMap<CanonicalPath, ResolvedValue>) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    for path in schema.leaf_paths() {
        let Some(spec) = schema.leaf(path) else {
            continue;
        };
        let Some(resolved) = tree.get(path) else {
            errors.push(ConfigError::constraint(path, "<missing>", "required"));
            continue;
        };
        if resolved.value.leaf_type() != spec.leaf_type {
            errors.push(ConfigError::constraint(
                path,
                &resolved.value,
                format!("of type {}", spec.leaf_type),
            ));
            continue;
        }
        for constraint in &spec.constraints {
            if !satisfies(constraint, &resolved.value) {
                errors.push(ConfigError::constraint(path, &resolved.value, constraint));
            }
        }
    }
    errors
}
