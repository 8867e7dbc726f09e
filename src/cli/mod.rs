//! CLI command definitions for layered-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! Setting overrides for the CLI layer follow `--` and are passed through
//! untouched, e.g. `layered-config show -- --server.port 9000 --debug`.

use clap::{Parser, Subcommand, ValueEnum};

/// Application name used for env prefixes and file discovery by default.
pub const DEFAULT_APP_NAME: &str = "app";

/// Output format for `show` and `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// Markdown tables (default)
    #[default]
    Markdown,
    /// JSON document
    Json,
}

/// Resolve layered configuration from defaults, files, environment and flags
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Application name: sets the `app.` / `APP_` env prefixes and the
    /// discovered file names
    #[arg(short, long, global = true, default_value = DEFAULT_APP_NAME)]
    pub app: String,

    /// Additional configuration file (repeatable, later files win)
    #[arg(short, long, global = true)]
    pub config: Vec<String>,

    /// Do not look for project and user configuration files
    #[arg(long, global = true)]
    pub no_discover: bool,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value_t = FormatArg::Markdown)]
    pub format: FormatArg,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve and print every setting with its source (default)
    Show(OverrideArgs),

    /// Resolve and report only whether the configuration is valid
    Check(OverrideArgs),

    /// List every setting with its type, default and constraints
    Schema,
}

/// Setting overrides for the CLI layer.
#[derive(clap::Args, Debug, Default)]
pub struct OverrideArgs {
    /// `--dotted.path value` pairs, given after `--`
    #[arg(last = true, allow_hyphen_values = true)]
    pub overrides: Vec<String>,
}

impl Cli {
    /// The subcommand to run, defaulting to `show` with no overrides.
    pub fn command_or_default(self) -> (Command, CliOptions) {
        let options = CliOptions {
            app: self.app,
            config: self.config,
            no_discover: self.no_discover,
            format: self.format,
        };
        let command = self
            .command
            .unwrap_or_else(|| Command::Show(OverrideArgs::default()));
        (command, options)
    }
}

/// Global options needed after logging is set up.
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub app: String,
    pub config: Vec<String>,
    pub no_discover: bool,
    pub format: FormatArg,
}
