//! Core types shared by every stage of resolution.

use serde::Serialize;
use std::fmt;

/// Source layer of a configuration value (lowest to highest precedence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    /// Compiled-in schema defaults
    Defaults = 1,
    /// Structured configuration file(s)
    File = 2,
    /// `{prefix}.a.b` environment variables
    LowercaseEnv = 3,
    /// `{PREFIX}_A_B` environment variables
    UppercaseEnv = 4,
    /// `--a.b value` command-line flags
    Cli = 5,
}

impl LayerId {
    /// All layers in the order they are applied.
    pub const ALL: [LayerId; 5] = [
        LayerId::Defaults,
        LayerId::File,
        LayerId::LowercaseEnv,
        LayerId::UppercaseEnv,
        LayerId::Cli,
    ];

    /// Numeric precedence, 1 (lowest) to 5 (highest).
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Key notation used by entries of this layer.
    pub fn notation(self) -> KeyNotation {
        match self {
            LayerId::UppercaseEnv => KeyNotation::Underscored,
            _ => KeyNotation::Dotted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerId::Defaults => "defaults",
            LayerId::File => "file",
            LayerId::LowercaseEnv => "env (dotted)",
            LayerId::UppercaseEnv => "env (underscored)",
            LayerId::Cli => "cli",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (layer {})", self.as_str(), self.rank())
    }
}

/// How a raw key separates its path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyNotation {
    /// `database.max.connections`
    Dotted,
    /// `database_max_connections`
    Underscored,
}

impl KeyNotation {
    pub fn separator(self) -> char {
        match self {
            KeyNotation::Dotted => '.',
            KeyNotation::Underscored => '_',
        }
    }
}

/// Primitive type of a schema leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafType {
    Bool,
    Int,
    Float,
    String,
}

impl LeafType {
    pub fn as_str(self) -> &'static str {
        match self {
            LeafType::Bool => "bool",
            LeafType::Int => "int",
            LeafType::Float => "float",
            LeafType::String => "string",
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn leaf_type(&self) -> LeafType {
        match self {
            Value::Bool(_) => LeafType::Bool,
            Value::Int(_) => LeafType::Int,
            Value::Float(_) => LeafType::Float,
            Value::String(_) => LeafType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a JSON value for nested views and typed extraction.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Renders the value the way a source would spell it, so that the
/// coercer parses it back to the identical value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Schema-defined address of a leaf, independent of source notation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalPath(Vec<String>);

impl CanonicalPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Dotted rendering: `database.max.connections`.
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }

    /// Name of the lowercase-dotted environment variable for this path.
    pub fn lowercase_env_name(&self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.dotted())
    }

    /// Name of the uppercase-underscored environment variable for this path.
    pub fn uppercase_env_name(&self, upper_prefix: &str) -> String {
        format!("{}_{}", upper_prefix, self.0.join("_").to_uppercase())
    }

    /// Command-line flag for this path.
    pub fn flag(&self) -> String {
        format!("--{}", self.dotted())
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// One key/value pair as spelled by a source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub layer: LayerId,
    pub raw_key: String,
    pub raw_value: String,
}

impl RawEntry {
    pub fn new(layer: LayerId, raw_key: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            layer,
            raw_key: raw_key.into(),
            raw_value: raw_value.into(),
        }
    }
}

/// The winning value for one leaf after merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    #[serde(serialize_with = "serialize_path")]
    pub path: CanonicalPath,
    pub value: Value,
    pub source: LayerId,
}

fn serialize_path<S: serde::Serializer>(path: &CanonicalPath, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&path.dotted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_order_matches_precedence() {
        let ranks: Vec<u8> = LayerId::ALL.iter().map(|l| l.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert!(LayerId::Cli > LayerId::UppercaseEnv);
        assert!(LayerId::LowercaseEnv > LayerId::File);
    }

    #[test]
    fn test_only_uppercase_env_uses_underscores() {
        for layer in LayerId::ALL {
            let expected = if layer == LayerId::UppercaseEnv {
                KeyNotation::Underscored
            } else {
                KeyNotation::Dotted
            };
            assert_eq!(layer.notation(), expected);
        }
    }

    #[test]
    fn test_path_renderings() {
        let path = CanonicalPath::new(vec!["database".into(), "max".into(), "connections".into()]);
        assert_eq!(path.dotted(), "database.max.connections");
        assert_eq!(path.lowercase_env_name("app"), "app.database.max.connections");
        assert_eq!(path.uppercase_env_name("APP"), "APP_DATABASE_MAX_CONNECTIONS");
        assert_eq!(path.flag(), "--database.max.connections");
    }

    #[test]
    fn test_float_display_is_shortest_roundtrip() {
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        assert_eq!(Value::Float(2.0).to_string(), "2");
        assert_eq!("0.1".parse::<f64>().unwrap(), 0.1);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_value(Value::Int(42)).unwrap();
        assert_eq!(json, serde_json::json!(42));
        let json = serde_json::to_value(Value::from("x")).unwrap();
        assert_eq!(json, serde_json::json!("x"));
    }
}
