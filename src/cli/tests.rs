use crate::cli::{build_app, init_db, inspect, Cli, Commands, ServeArgs};
use crate::config::AppConfig;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

const ROOT: &str = "openapi: 3.0.0
info: !include info.yml
servers:
  - url: /api
paths:
  /people: !include paths/people.yml
";

const INFO: &str = "title: People\nversion: \"1.0\"\n";

const PEOPLE: &str = "get:
  operationId: read_all_people
  responses:
    200:
      description: OK
";

fn spec_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("paths")).unwrap();
    fs::write(dir.path().join("swagger.yml"), ROOT).unwrap();
    fs::write(dir.path().join("info.yml"), INFO).unwrap();
    fs::write(dir.path().join("paths/people.yml"), PEOPLE).unwrap();
    dir
}

#[test]
fn test_serve_flags_parse() {
    let cli = Cli::try_parse_from([
        "people-api",
        "serve",
        "--spec",
        "swagger/swagger.yml",
        "--port",
        "8080",
        "--watch",
    ])
    .unwrap();

    match cli.command {
        Commands::Serve(args) => {
            assert_eq!(args.spec, Some(PathBuf::from("swagger/swagger.yml")));
            assert_eq!(args.port, Some(8080));
            assert!(args.watch);
        }
        _ => panic!("Expected Serve command"),
    }
}

#[test]
fn test_init_db_and_inspect_parse() {
    let cli = Cli::try_parse_from(["people-api", "init-db", "--seed"]).unwrap();
    assert!(matches!(cli.command, Commands::InitDb { seed: true, .. }));

    let cli = Cli::try_parse_from(["people-api", "inspect", "--spec", "s.yml"]).unwrap();
    assert!(matches!(cli.command, Commands::Inspect { .. }));

    assert!(Cli::try_parse_from(["people-api", "inspect"]).is_err());
}

#[test]
fn test_flags_override_config() {
    let args = ServeArgs {
        spec: Some(PathBuf::from("specs/root.yml")),
        host: Some("0.0.0.0".to_string()),
        port: Some(9000),
        database: Some("sqlite::memory:".to_string()),
        templates: Some(PathBuf::from("tpl")),
        static_dir: Some(PathBuf::from("assets")),
        watch: true,
        ..ServeArgs::default()
    };
    let config = args.resolve().unwrap();
    assert_eq!(config.server.addr(), "0.0.0.0:9000");
    assert_eq!(config.spec.dir, PathBuf::from("specs"));
    assert_eq!(config.spec.file, PathBuf::from("root.yml"));
    assert_eq!(config.database.url, "sqlite::memory:");
    assert_eq!(config.templates_dir, PathBuf::from("tpl"));
    assert_eq!(config.static_dir, Some(PathBuf::from("assets")));
    assert!(config.watch);
}

#[test]
fn test_config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "server:\n  port: 7000\nwatch: true\n").unwrap();
    let args = ServeArgs {
        config: Some(path),
        ..ServeArgs::default()
    };
    let config = args.resolve().unwrap();
    assert_eq!(config.server.port, 7000);
    assert!(config.watch);
}

#[test]
fn test_build_app_adds_home_view() {
    let dir = spec_tree();
    let mut config = AppConfig::default();
    config.spec.dir = dir.path().to_path_buf();
    config.spec.file = PathBuf::from("swagger.yml");

    let app = build_app(&config).unwrap();
    let routes = app.routes();
    assert_eq!(routes[0].handler_name, "list_people");
    assert!(routes.iter().any(|r| r.full_path() == "/api/people"));
    assert_eq!(app.extra_files().len(), 3);
}

#[test]
fn test_inspect_report() {
    let dir = spec_tree();
    let report = inspect(&dir.path().join("swagger.yml")).unwrap();
    assert!(report.contains("title:      People"));
    assert!(report.contains("3.0.0 (openapi)"));
    assert!(report.contains("base paths: /api"));
    assert!(report.contains("read_all_people"));
    assert!(report.contains("people.yml"));
}

#[test]
fn test_init_db_seed() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("people.db").display());
    assert_eq!(init_db(&url, true).unwrap(), 3);
    assert_eq!(init_db(&url, true).unwrap(), 0);
    assert_eq!(init_db(&url, false).unwrap(), 0);
}
