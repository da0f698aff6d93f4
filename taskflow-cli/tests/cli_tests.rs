//! Integration tests for the CLI binary. None of them need a running backend.

use std::{fs, path::Path, time::Duration};

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::PredicateBooleanExt;
use tempfile::TempDir;

/// The binary with a private session file and a clean environment.
fn taskflow(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("taskflow");
    cmd.current_dir(dir)
        .env("TASKFLOW_SESSION_PATH", dir.join("session.json"))
        .env_remove("TASKFLOW_API_URL")
        .env_remove("TASKFLOW_REQUEST_TIMEOUT")
        .env_remove("RUST_LOG")
        .env("TASKFLOW_LOG_LEVEL", "warn")
        .timeout(Duration::from_secs(10));
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("login"))
        .stdout(predicates::str::contains("logout"))
        .stdout(predicates::str::contains("status"))
        .stdout(predicates::str::contains("tasks"))
        .stdout(predicates::str::contains("--api-url"));
}

#[test]
fn test_tasks_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["tasks", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("list"))
        .stdout(predicates::str::contains("add"))
        .stdout(predicates::str::contains("done"))
        .stdout(predicates::str::contains("delete"));
}

#[test]
fn test_tasks_add_requires_title() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["tasks", "add"])
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "the following required arguments were not provided",
        ))
        .stderr(predicates::str::contains("<TITLE>"));
}

#[test]
fn test_status_without_session() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicates::str::contains("Not logged in to http://localhost:8000"))
        .stdout(predicates::str::contains("refresh token: absent"))
        .stdout(predicates::str::contains("landing view: /login"));
}

#[test]
fn test_status_with_stored_session() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("session.json"),
        r#"{"accessToken":"A1","refreshToken":"R1"}"#,
    )
    .unwrap();

    taskflow(dir.path())
        .args(["status", "--api-url", "https://tasks.example.com"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Logged in to https://tasks.example.com"))
        .stdout(predicates::str::contains("refresh token: present"))
        .stdout(predicates::str::contains("landing view: /dashboard"));
}

#[test]
fn test_logout_removes_session_file() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    fs::write(&session, r#"{"accessToken":"A1","refreshToken":"R1"}"#).unwrap();

    taskflow(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicates::str::contains("Logged out"));
    assert!(!session.exists());

    taskflow(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicates::str::contains("No active session"));
}

#[test]
fn test_tasks_without_session_asks_for_login() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["tasks", "list"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("run `taskflow login` first"));
}

#[test]
fn test_update_without_fields_is_rejected() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["tasks", "update", "3"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("nothing to update"));
}

#[test]
fn test_login_reports_unreachable_backend() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args([
            "login",
            "--email",
            "a@b.com",
            "--password-stdin",
            "--api-url",
            "http://127.0.0.1:9",
        ])
        .write_stdin("secret\n")
        .assert()
        .failure()
        .stderr(predicates::str::contains("login failed"))
        .stderr(predicates::str::contains("network error"));
    assert!(!dir.path().join("session.json").exists());
}

#[test]
fn test_login_rejects_empty_stdin_password() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["login", "--email", "a@b.com", "--password-stdin"])
        .write_stdin("  \n")
        .assert()
        .failure()
        .stderr(predicates::str::contains("password must not be empty"))
        .stderr(predicates::str::contains("input must not be empty").not());
}

#[test]
fn test_debug_logging_traces_task_commands() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .env("RUST_LOG", "debug")
        .args(["tasks", "list"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("running task command"));
}

#[test]
fn test_invalid_api_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["status", "--api-url", "not a url"])
        .assert()
        .failure()
        .stderr(
            predicates::str::contains("invalid value")
                .and(predicates::str::contains("--api-url")),
        );
}

#[test]
fn test_config_generates_json() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("taskflow.json");

    taskflow(dir.path())
        .args(["config", "--format", "json", "--output"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicates::str::contains("generated successfully"));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written["api_url"], "http://localhost:8000/");
    assert_eq!(written["request_timeout_secs"], 30);
}

#[test]
fn test_config_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["config", "--format", "toml"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unsupported format 'toml'"));
}

#[test]
fn test_completion_script_mentions_binary() {
    let dir = TempDir::new().unwrap();
    taskflow(dir.path())
        .args(["completion", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicates::str::contains("taskflow"));
}
