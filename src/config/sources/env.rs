//! Layers 3 and 4: the two environment-variable naming conventions.
//!
//! Both adapters read an injected table rather than the process
//! environment, so tests can hand them synthetic tables.

use super::{LayerEntries, SourceAdapter};
use crate::types::LayerId;
use heck::ToShoutySnakeCase;
use std::collections::BTreeMap;

/// Environment variables by name. Sorted so entries come out in a stable
/// order.
pub type EnvTable = BTreeMap<String, String>;

/// The two spellings of the application prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPrefix {
    /// `my-app` in `my-app.server.port`
    pub lower: String,
    /// `MY_APP` in `MY_APP_SERVER_PORT`
    pub upper: String,
}

impl EnvPrefix {
    /// Derive both spellings from the application name.
    pub fn from_app_name(app: &str) -> Self {
        Self {
            lower: app.to_lowercase(),
            upper: app.to_shouty_snake_case(),
        }
    }
}

/// Layer 3: `{prefix}.{segment}.{segment}` variables, case-sensitive.
#[derive(Debug, Clone, Copy)]
pub struct DottedEnvAdapter<'a> {
    prefix: &'a str,
    env: &'a EnvTable,
}

impl<'a> DottedEnvAdapter<'a> {
    pub fn new(prefix: &'a str, env: &'a EnvTable) -> Self {
        Self { prefix, env }
    }
}

impl SourceAdapter for DottedEnvAdapter<'_> {
    fn layer(&self) -> LayerId {
        LayerId::LowercaseEnv
    }

    fn produce(&self) -> LayerEntries {
        let mut out = LayerEntries::new(self.layer());
        for (name, value) in self.env {
            let Some(rest) = name
                .strip_prefix(self.prefix)
                .and_then(|r| r.strip_prefix('.'))
            else {
                continue;
            };
            if rest.is_empty() {
                out.reject(format!("variable '{}' names no setting", name));
                continue;
            }
            out.push(rest, value.as_str());
        }
        out
    }
}

/// Layer 4: `{PREFIX}_{SEGMENT}_{SEGMENT}` variables.
///
/// The remainder after the prefix is lowercased and keeps its underscores;
/// the resolver splits it against the schema.
#[derive(Debug, Clone, Copy)]
pub struct UnderscoredEnvAdapter<'a> {
    prefix: &'a str,
    env: &'a EnvTable,
}

impl<'a> UnderscoredEnvAdapter<'a> {
    pub fn new(prefix: &'a str, env: &'a EnvTable) -> Self {
        Self { prefix, env }
    }
}

impl SourceAdapter for UnderscoredEnvAdapter<'_> {
    fn layer(&self) -> LayerId {
        LayerId::UppercaseEnv
    }

    fn produce(&self) -> LayerEntries {
        let mut out = LayerEntries::new(self.layer());
        for (name, value) in self.env {
            let Some(rest) = name
                .strip_prefix(self.prefix)
                .and_then(|r| r.strip_prefix('_'))
            else {
                continue;
            };
            if rest.is_empty() {
                out.reject(format!("variable '{}' names no setting", name));
                continue;
            }
            out.push(rest.to_lowercase(), value.as_str());
        }
        out
    }
}
