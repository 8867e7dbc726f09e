//! Integration tests for file-backed configuration loading.

use layered_config::config::{ConfigLoader, ConfigPaths, FileOrigin, Schema};
use layered_config::error::ErrorCode;
use layered_config::types::LayerId;
use serde::Deserialize;
use std::fs;
use tempfile::TempDir;

fn schema() -> Schema {
    Schema::builder()
        .string("server.host", "127.0.0.1")
        .int("server.port", 3000)
        .int("database.port", 5432)
        .bool("debug", false)
        .float("ratio", 0.5)
        .build()
        .expect("schema builds")
}

/// Helper to create project and user directories inside a temp dir.
fn project_and_user_dirs(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let project = temp.path().join("project");
    let user = temp.path().join("user");
    fs::create_dir_all(&project).unwrap();
    fs::create_dir_all(&user).unwrap();
    (project, user)
}

#[test]
fn test_explicit_file_overrides_discovered_files() {
    let temp = TempDir::new().unwrap();
    let (project, user) = project_and_user_dirs(&temp);
    fs::write(project.join("svc.yaml"), "server:\n  port: 1000\n  host: proj\n").unwrap();
    fs::write(user.join("config.json"), r#"{"server": {"port": 2000}}"#).unwrap();
    let explicit = temp.path().join("override.toml");
    fs::write(&explicit, "[server]\nport = 3001\n").unwrap();

    let schema = schema();
    let loader = ConfigLoader::new(&schema, "svc")
        .with_paths(ConfigPaths::with_dirs(Some(project), Some(user)))
        .with_file(&explicit);

    let origins: Vec<FileOrigin> = loader.config_files().iter().map(|f| f.origin).collect();
    assert_eq!(
        origins,
        vec![FileOrigin::Project, FileOrigin::User, FileOrigin::Explicit]
    );

    let tree = loader.load().unwrap();
    assert_eq!(tree.get_int("server.port"), Some(3001));
    assert_eq!(tree.get_str("server.host"), Some("proj"));
}

#[test]
fn test_env_and_cli_beat_files() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("svc.yaml");
    fs::write(&file, "server:\n  port: 1000\ndebug: true\n").unwrap();

    let schema = schema();
    let tree = ConfigLoader::new(&schema, "svc")
        .with_file(&file)
        .with_env([("SVC_SERVER_PORT", "2000")])
        .with_args(["--debug", "no"])
        .load()
        .unwrap();

    assert_eq!(tree.get_int("server.port"), Some(2000));
    assert_eq!(tree.source_of("server.port"), Some(LayerId::UppercaseEnv));
    assert_eq!(tree.get_bool("debug"), Some(false));
    assert_eq!(tree.source_of("debug"), Some(LayerId::Cli));
}

#[test]
fn test_unparseable_file_reported_with_other_errors() {
    let temp = TempDir::new().unwrap();
    let broken = temp.path().join("broken.toml");
    fs::write(&broken, "server = [").unwrap();

    let schema = schema();
    let errors = ConfigLoader::new(&schema, "svc")
        .with_file(&broken)
        .with_args(["--server.port", "eighty"])
        .load()
        .unwrap_err();

    let codes: Vec<ErrorCode> = errors.errors().iter().map(|e| e.code()).collect();
    assert_eq!(codes, vec![ErrorCode::SourceFormat, ErrorCode::Coercion]);
    assert_eq!(errors.errors()[0].layer(), Some(LayerId::File));
}

#[test]
fn test_file_lists_are_rejected() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("svc.yaml");
    fs::write(&file, "server:\n  host: [a, b]\n").unwrap();

    let schema = schema();
    let errors = ConfigLoader::new(&schema, "svc")
        .with_file(&file)
        .load()
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].code(), ErrorCode::SourceFormat);
}

#[test]
fn test_extract_typed_struct() {
    #[derive(Debug, Deserialize)]
    struct Server {
        host: String,
        port: u16,
    }
    #[derive(Debug, Deserialize)]
    struct Settings {
        server: Server,
        debug: bool,
    }

    let schema = schema();
    let tree = ConfigLoader::new(&schema, "svc")
        .with_env([("svc.server.host", "0.0.0.0")])
        .load()
        .unwrap();
    let settings: Settings = tree.extract().unwrap();
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 3000);
    assert!(!settings.debug);
}

#[test]
fn test_non_finite_file_floats_are_coercion_errors() {
    let temp = TempDir::new().unwrap();
    let toml = temp.path().join("svc.toml");
    let yaml = temp.path().join("svc.yaml");
    fs::write(&toml, "ratio = inf\n").unwrap();
    fs::write(&yaml, "ratio: .inf\n").unwrap();

    let schema = schema();
    for file in [&toml, &yaml] {
        let errors = ConfigLoader::new(&schema, "svc")
            .with_file(file)
            .load()
            .unwrap_err();
        assert_eq!(errors.len(), 1, "{}", file.display());
        let err = &errors.errors()[0];
        assert_eq!(err.code(), ErrorCode::Coercion);
        assert_eq!(err.layer(), Some(LayerId::File));
        assert_eq!(err.key().as_deref(), Some("ratio"));
    }
}

#[test]
fn test_malformed_first_file_not_hidden_by_later_file() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("a.yaml");
    let second = temp.path().join("b.yaml");
    fs::write(&first, "port=8080\n").unwrap();
    fs::write(&second, "ratio: 0.75\n").unwrap();

    let schema = schema();
    let errors = ConfigLoader::new(&schema, "svc")
        .with_file(&first)
        .with_file(&second)
        .load()
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    let err = &errors.errors()[0];
    assert_eq!(err.code(), ErrorCode::SourceFormat);
    assert_eq!(err.layer(), Some(LayerId::File));
    assert!(err.to_string().contains("a.yaml"));
}
