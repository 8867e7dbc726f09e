//! Configuration loader: gathers the five sources and runs the merge.
//!
//! The loader is the only place that touches process state, and only in
//! [`ConfigLoader::from_process`]. Everything else is injected, which keeps
//! resolution testable with synthetic environments and argument lists.

use super::files::{ConfigFile, FileOrigin, ensure_map_root, find_with_extensions, read_config_file};
use super::merge::{deep_merge_all, merge};
use super::schema::Schema;
use super::sources::{
    CliAdapter, DefaultsAdapter, DottedEnvAdapter, EnvPrefix, EnvTable, FileAdapter, LayerEntries,
    SourceAdapter, UnderscoredEnvAdapter,
};
use super::tree::ConfigTree;
use crate::error::{ConfigError, ResolutionResult};
use crate::types::LayerId;
use serde_json::Value;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{debug, info};

/// Directories searched for configuration files.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Searched for `{app}.{yaml,yml,toml,json}`
    pub project_dir: Option<PathBuf>,
    /// Searched for `config.{yaml,yml,toml,json}`
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Working directory for the project file, the platform config
    /// directory (e.g. `~/.config/{app}`) for the user file.
    pub fn discover(app: &str) -> Self {
        Self {
            project_dir: Some(PathBuf::from(".")),
            user_dir: dirs::config_dir().map(|d| d.join(app)),
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    /// Existing files, lowest precedence first: project, then user.
    pub fn existing_files(&self, app: &str) -> Vec<ConfigFile> {
        let project = self
            .project_dir
            .as_deref()
            .and_then(|dir| find_with_extensions(dir, app))
            .map(|p| ConfigFile::new(p, FileOrigin::Project));
        let user = self
            .user_dir
            .as_deref()
            .and_then(|dir| find_with_extensions(dir, "config"))
            .map(|p| ConfigFile::new(p, FileOrigin::User));
        project.into_iter().chain(user).collect()
    }
}

/// Collects the inputs of every layer and resolves them against a schema.
#[derive(Debug, Clone)]
pub struct ConfigLoader<'s> {
    schema: &'s Schema,
    app: String,
    prefix: EnvPrefix,
    paths: Option<ConfigPaths>,
    files: Vec<PathBuf>,
    file_trees: Vec<Value>,
    env: EnvTable,
    args: Vec<String>,
    malformed_args: Vec<String>,
}

impl<'s> ConfigLoader<'s> {
    /// A loader with no files, an empty environment and no arguments.
    pub fn new(schema: &'s Schema, app: &str) -> Self {
        Self {
            schema,
            app: app.to_string(),
            prefix: EnvPrefix::from_app_name(app),
            paths: None,
            files: Vec::new(),
            file_trees: Vec::new(),
            env: EnvTable::new(),
            args: Vec::new(),
            malformed_args: Vec::new(),
        }
    }

    /// A loader fed from the running process: file discovery on, the
    /// current environment, and `argv` without the program name.
    pub fn from_process(schema: &'s Schema, app: &str) -> Self {
        let env = std::env::vars_os().filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
            (Ok(k), Ok(v)) => Some((k, v)),
            (k, _) => {
                debug!(name = ?k, "Skipping non-UTF-8 environment variable");
                None
            }
        });
        Self::new(schema, app)
            .with_paths(ConfigPaths::discover(app))
            .with_env(env)
            .with_os_args(std::env::args_os().skip(1))
    }

    /// Enable discovery of project and user files.
    pub fn with_paths(mut self, paths: ConfigPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Add a file that must exist. Explicit files take precedence over
    /// discovered ones, later files over earlier ones.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Add an already-parsed file tree, merged after all files on disk.
    pub fn with_file_tree(mut self, tree: Value) -> Self {
        self.file_trees.push(tree);
        self
    }

    /// Replace the environment table.
    pub fn with_env<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Replace the command-line tokens.
    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self.malformed_args.clear();
        self
    }

    /// Replace the command-line tokens with raw OS strings. Tokens that are
    /// not valid UTF-8 are dropped from the stream and reported as
    /// malformed input of the CLI layer.
    pub fn with_os_args<S: Into<OsString>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args.clear();
        self.malformed_args.clear();
        for (position, arg) in args.into_iter().enumerate() {
            match arg.into().into_string() {
                Ok(arg) => self.args.push(arg),
                Err(raw) => self.malformed_args.push(format!(
                    "argument {} is not valid UTF-8: '{}'",
                    position + 1,
                    raw.to_string_lossy()
                )),
            }
        }
        self
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn prefix(&self) -> &EnvPrefix {
        &self.prefix
    }

    /// Every file that will feed the file layer, lowest precedence first.
    pub fn config_files(&self) -> Vec<ConfigFile> {
        let discovered = self
            .paths
            .as_ref()
            .map(|p| p.existing_files(&self.app))
            .unwrap_or_default();
        let explicit = self
            .files
            .iter()
            .map(|p| ConfigFile::new(p.clone(), FileOrigin::Explicit));
        discovered.into_iter().chain(explicit).collect()
    }

    /// Read, parse and deep-merge every file into one tree.
    ///
    /// Each tree's root is checked before merging; a later file must not
    /// hide a malformed earlier one.
    fn file_tree(&self) -> (Value, Vec<ConfigError>) {
        let mut trees = Vec::new();
        let mut errors = Vec::new();
        for file in self.config_files() {
            info!("Loading {} config file: {}", file.origin, file.path.display());
            match read_config_file(&file.path) {
                Ok(tree) => trees.push(tree),
                Err(err) => errors.push(ConfigError::source_format(
                    LayerId::File,
                    format!("{:#}", err),
                )),
            }
        }
        for (index, tree) in self.file_trees.iter().enumerate() {
            match ensure_map_root(tree) {
                Ok(()) => trees.push(tree.clone()),
                Err(err) => errors.push(ConfigError::source_format(
                    LayerId::File,
                    format!("injected tree {}: {:#}", index + 1, err),
                )),
            }
        }
        (deep_merge_all(trees), errors)
    }

    /// Produce the raw entries of all five layers.
    pub fn produce_layers(&self) -> Vec<LayerEntries> {
        let (tree, mut file_errors) = self.file_tree();

        let mut file = FileAdapter::new(&tree).produce();
        file_errors.append(&mut file.errors);
        file.errors = file_errors;

        let mut cli = CliAdapter::new(&self.args).produce();
        for detail in &self.malformed_args {
            cli.reject(detail.as_str());
        }

        vec![
            DefaultsAdapter::new(self.schema).produce(),
            file,
            DottedEnvAdapter::new(&self.prefix.lower, &self.env).produce(),
            UnderscoredEnvAdapter::new(&self.prefix.upper, &self.env).produce(),
            cli,
        ]
    }

    /// Resolve the configuration snapshot.
    pub fn load(&self) -> ResolutionResult<ConfigTree> {
        merge(self.schema, self.produce_layers())
    }
}
