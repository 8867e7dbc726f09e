//! Structured error types for configuration resolution.

use crate::types::{CanonicalPath, LayerId, LeafType};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors
    SourceFormat,
    UnknownPath,
    Coercion,

    // Post-merge errors
    Constraint,
}

/// A single fault found while resolving configuration.
///
/// None of these stop a resolution pass; they are collected and reported
/// together through [`ResolutionErrors`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A source handed over input the adapter cannot interpret.
    #[error("{layer}: malformed source input: {detail}")]
    SourceFormat { layer: LayerId, detail: String },

    /// A raw key does not name any schema leaf.
    #[error("{layer}: unknown configuration key '{raw_key}': {reason}")]
    UnknownPath {
        layer: LayerId,
        raw_key: String,
        reason: String,
    },

    /// A value is present but cannot be read as the leaf's type.
    #[error("{layer}: cannot read '{raw_value}' for '{raw_key}' as {expected}: {reason}")]
    Coercion {
        layer: LayerId,
        raw_key: String,
        path: CanonicalPath,
        raw_value: String,
        expected: LeafType,
        reason: String,
    },

    /// A merged value violates a constraint declared in the schema.
    #[error("{path}: value '{value}' violates constraint: {constraint}")]
    Constraint {
        path: CanonicalPath,
        value: String,
        constraint: String,
    },
}

impl ConfigError {
    pub fn source_format(layer: LayerId, detail: impl Into<String>) -> Self {
        ConfigError::SourceFormat {
            layer,
            detail: detail.into(),
        }
    }

    pub fn unknown_path(layer: LayerId, raw_key: &str, reason: impl fmt::Display) -> Self {
        ConfigError::UnknownPath {
            layer,
            raw_key: raw_key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn constraint(
        path: &CanonicalPath,
        value: impl fmt::Display,
        constraint: impl fmt::Display,
    ) -> Self {
        ConfigError::Constraint {
            path: path.clone(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::SourceFormat { .. } => ErrorCode::SourceFormat,
            ConfigError::UnknownPath { .. } => ErrorCode::UnknownPath,
            ConfigError::Coercion { .. } => ErrorCode::Coercion,
            ConfigError::Constraint { .. } => ErrorCode::Constraint,
        }
    }

    /// Layer the fault came from. Constraint errors belong to the merged
    /// tree, not to a single layer.
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            ConfigError::SourceFormat { layer, .. }
            | ConfigError::UnknownPath { layer, .. }
            | ConfigError::Coercion { layer, .. } => Some(*layer),
            ConfigError::Constraint { .. } => None,
        }
    }

    /// The offending key as the user spelled it (or the canonical path for
    /// constraint errors).
    pub fn key(&self) -> Option<String> {
        match self {
            ConfigError::SourceFormat { .. } => None,
            ConfigError::UnknownPath { raw_key, .. } | ConfigError::Coercion { raw_key, .. } => {
                Some(raw_key.clone())
            }
            ConfigError::Constraint { path, .. } => Some(path.dotted()),
        }
    }

    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            layer: self.layer(),
            key: self.key(),
        }
    }
}

/// Serializable form of a [`ConfigError`].
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Every fault found in one resolution pass.
///
/// Resolution either produces a complete configuration or this error;
/// there is no partial result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionErrors(Vec<ConfigError>);

impl ResolutionErrors {
    pub fn new(errors: Vec<ConfigError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<ConfigError> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.0.iter().map(ConfigError::to_report).collect()
    }
}

impl fmt::Display for ResolutionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "configuration resolution failed with {} error(s)",
            self.0.len()
        )?;
        for err in &self.0 {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionErrors {}

impl IntoIterator for ResolutionErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Result type for a resolution pass.
pub type ResolutionResult<T> = std::result::Result<T, ResolutionErrors>;

/// Invalid schema declaration. These are programming errors in the
/// compiled-in schema, not user input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema declares no leaves")]
    Empty,

    #[error("'{path}': segment '{segment}' is invalid: {reason}")]
    InvalidSegment {
        path: String,
        segment: String,
        reason: &'static str,
    },

    #[error("'{path}': default {default} is not a finite number")]
    NonFiniteDefault { path: String, default: String },

    #[error("'{path}' is declared more than once")]
    Duplicate { path: String },

    #[error("'{path}' is declared both as a leaf and as a group")]
    LeafGroupConflict { path: String },

    #[error("'{path}': constraint {constraint} does not apply to {leaf_type} leaves")]
    ConstraintTypeMismatch {
        path: String,
        constraint: String,
        leaf_type: LeafType,
    },

    #[error("'{path}': default '{default}' violates constraint {constraint}")]
    DefaultViolatesConstraint {
        path: String,
        default: String,
        constraint: String,
    },
}
