//! layered-config
//!
//! Resolves the configuration of a small demo service from defaults,
//! configuration files, both environment conventions and `--` overrides,
//! and prints the result with the source of every setting.

use anyhow::Result;
use clap::Parser;
use layered_config::cli::{Cli, CliOptions, Command, FormatArg, OverrideArgs};
use layered_config::config::{ConfigLoader, ConfigPaths, Constraint, LeafDecl, Schema};
use layered_config::format::{
    OutputFormat, format_errors_json, format_errors_markdown, format_schema_markdown,
    format_tree_json, format_tree_markdown,
};
use std::fs::OpenOptions;
use std::process::ExitCode;
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Compiled-in schema of the demo service.
fn demo_schema() -> Result<Schema> {
    let schema = Schema::builder()
        .string("server.host", "127.0.0.1")
        .leaf(
            LeafDecl::new("server.port", 3000i64)
                .with(Constraint::IntRange { min: 1, max: 65535 }),
        )
        .leaf(LeafDecl::new("server.workers", 4i64).with(Constraint::Positive))
        .string("database.host", "localhost")
        .leaf(
            LeafDecl::new("database.port", 5432i64)
                .with(Constraint::IntRange { min: 1, max: 65535 }),
        )
        .leaf(LeafDecl::new("database.name", "app").with(Constraint::NonEmpty))
        .leaf(LeafDecl::new("database.max.connections", 10i64).with(Constraint::Positive))
        .leaf(
            LeafDecl::new("database.timeout", 5.0)
                .with(Constraint::FloatRange { min: 0.1, max: 300.0 }),
        )
        .leaf(
            LeafDecl::new("log.level", "info")
                .with(Constraint::one_of(["trace", "debug", "info", "warn", "error"])),
        )
        .bool("debug", false)
        .build()?;
    Ok(schema)
}

/// `RUST_LOG` wins when set; otherwise everything at `level` and above.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()))
}

fn init_logging(verbose: bool, log: &str) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    match log {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(level))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(level))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(level))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn output_format(arg: FormatArg) -> OutputFormat {
    match arg {
        FormatArg::Markdown => OutputFormat::Markdown,
        FormatArg::Json => OutputFormat::Json,
    }
}

/// Build a loader from the process environment, the configured files and
/// the `--` overrides.
fn loader<'s>(schema: &'s Schema, options: &CliOptions, overrides: OverrideArgs) -> ConfigLoader<'s> {
    let mut loader = ConfigLoader::from_process(schema, &options.app).with_args(overrides.overrides);
    if options.no_discover {
        loader = loader.with_paths(ConfigPaths::default());
    }
    for path in &options.config {
        loader = loader.with_file(path);
    }
    for file in loader.config_files() {
        debug!(origin = %file.origin, path = %file.path.display(), "Config file");
    }
    loader
}

fn run(command: Command, options: &CliOptions, schema: &Schema) -> Result<ExitCode> {
    let format = output_format(options.format);

    let (overrides, show) = match command {
        Command::Schema => {
            let prefix = ConfigLoader::new(schema, &options.app).prefix().upper.clone();
            println!("{}", format_schema_markdown(schema, &prefix));
            return Ok(ExitCode::SUCCESS);
        }
        Command::Show(args) => (args, true),
        Command::Check(args) => (args, false),
    };

    match loader(schema, options, overrides).load() {
        Ok(tree) => {
            match (show, format) {
                (true, OutputFormat::Markdown) => println!("{}", format_tree_markdown(&tree)),
                (true, OutputFormat::Json) => {
                    println!("{}", serde_json::to_string_pretty(&format_tree_json(&tree))?)
                }
                (false, OutputFormat::Markdown) => println!("ok"),
                (false, OutputFormat::Json) => println!("{}", serde_json::json!({ "ok": true })),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            match format {
                OutputFormat::Markdown => eprint!("{}", format_errors_markdown(&errors)),
                OutputFormat::Json => {
                    eprintln!("{}", serde_json::to_string_pretty(&format_errors_json(&errors))?)
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, &cli.log)?;

    let (command, options) = cli.command_or_default();
    let schema = demo_schema()?;
    run(command, &options, &schema)
}
