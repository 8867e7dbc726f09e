//! Configuration files feeding the file layer.
//!
//! Files are parsed into a generic JSON tree by extension (YAML, TOML or
//! JSON). Several files are deep-merged into one tree before the file
//! adapter flattens it, so the file layer stays a single layer.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOrigin {
    /// `./{app}.yaml` and friends in the working directory
    Project,
    /// `{config_dir}/{app}/config.yaml` and friends
    User,
    /// Passed explicitly, e.g. with `--config`
    Explicit,
}

impl fmt::Display for FileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOrigin::Project => write!(f, "project"),
            FileOrigin::User => write!(f, "user"),
            FileOrigin::Explicit => write!(f, "explicit"),
        }
    }
}

/// A configuration file to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub origin: FileOrigin,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>, origin: FileOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }
}

/// Supported file syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Toml,
    Json,
}

impl FileFormat {
    /// Extensions probed during discovery, in preference order.
    pub const EXTENSIONS: [&'static str; 4] = ["yaml", "yml", "toml", "json"];

    /// Pick the format from the file extension. Anything unrecognised is
    /// read as YAML, which also accepts plain JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }
}

/// Parse file content into a generic tree.
///
/// Non-finite floats (`inf`, `.nan`) have no JSON number form; they are
/// kept as strings so the coercer rejects them instead of the tree
/// silently losing the value.
pub fn parse_config_str(content: &str, format: FileFormat) -> Result<Value> {
    let tree = match format {
        FileFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
            .context("YAML parse error")
            .and_then(yaml_to_json)?,
        FileFormat::Json => serde_json::from_str::<Value>(content).context("JSON parse error")?,
        FileFormat::Toml => toml::from_str::<toml::Value>(content)
            .map(toml_to_json)
            .context("TOML parse error")?,
    };
    Ok(tree)
}

/// Read and parse one file. The root must be a map of settings (or empty).
pub fn read_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let tree = parse_config_str(&content, FileFormat::from_path(path))
        .with_context(|| path.display().to_string())?;
    ensure_map_root(&tree).with_context(|| path.display().to_string())?;
    Ok(tree)
}

/// Fail unless `tree` is a map or null (an empty file).
pub fn ensure_map_root(tree: &Value) -> Result<()> {
    match tree {
        Value::Object(_) | Value::Null => Ok(()),
        other => bail!(
            "file root must be a map of settings, found {}",
            value_kind(other)
        ),
    }
}

/// Short description of a JSON value's kind for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

/// First existing `{stem}.{ext}` in `dir`, probing [`FileFormat::EXTENSIONS`].
pub fn find_with_extensions(dir: &Path, stem: &str) -> Option<PathBuf> {
    FileFormat::EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.is_file())
}

fn float_to_json(f: f64) -> Value {
    match serde_json::Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None => Value::String(f.to_string()),
    }
}

fn yaml_to_json(yaml: serde_yaml::Value) -> Result<Value> {
    let value = match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                float_to_json(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => bail!("unsupported map key {:?}", other),
                };
                object.insert(key, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    };
    Ok(value)
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => float_to_json(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
