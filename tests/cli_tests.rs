use std::process::Command;

mod common;
use common::temp_files::people_tree;

#[test]
fn test_inspect_command_prints_routes() {
    let dir = people_tree();
    let output = Command::new(env!("CARGO_BIN_EXE_people-api"))
        .arg("inspect")
        .arg("--spec")
        .arg(dir.path().join("swagger.yml"))
        .env("PEOPLE_LOG_LEVEL", "error")
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("base paths: /api"));
    assert!(stdout.contains("read_one_person"));
    assert!(stdout.contains("/people/{person_id}"));
    assert!(stdout.contains("person.yml"));
}

#[test]
fn test_inspect_missing_spec_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_people-api"))
        .arg("inspect")
        .arg("--spec")
        .arg(dir.path().join("missing.yml"))
        .env("PEOPLE_LOG_LEVEL", "error")
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.yml"));
}

#[test]
fn test_init_db_command_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("people.db").display());
    let output = Command::new(env!("CARGO_BIN_EXE_people-api"))
        .args(["init-db", "--seed", "--database", &url])
        .env("PEOPLE_LOG_LEVEL", "error")
        .output()
        .expect("run cli");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("3 people inserted"));
}
