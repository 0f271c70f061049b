//! End-to-end runs of the `entrypoint` binary against a scratch application tree.

#![allow(deprecated)]
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod common;

struct App {
    dir: TempDir,
    stub_log: PathBuf,
}

impl App {
    fn new() -> Self {
        let dir = common::app_tree();
        let stub_log = dir.path().join("artisan.log");
        Self { dir, stub_log }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn entrypoint(&self, mode: &str) -> Command {
        let stub = common::write_artisan_stub(self.root());
        let mut cmd = Command::cargo_bin("entrypoint").unwrap();
        cmd.current_dir(self.root())
            .env_remove("ENTRYPOINT_CONFIG")
            .env_remove("ENTRYPOINT_OWNER")
            .env_remove("ENTRYPOINT_DB_WAIT_MAX_ATTEMPTS")
            .env_remove("STUB_FAIL")
            .env("APP_ENV", mode)
            .env("DB_HOST", "127.0.0.1")
            .env("DB_PORT", "3306")
            .env("ENTRYPOINT_APP_ROOT", self.root())
            .env("ENTRYPOINT_ARTISAN", format!("sh {}", stub.display()))
            .env("ENTRYPOINT_LOG", "info")
            .env("ENTRYPOINT_LOG_FORMAT", "pretty")
            .env("STUB_LOG", &self.stub_log);
        cmd
    }

    fn calls(&self) -> Vec<String> {
        common::stub_calls(&self.stub_log)
    }

    fn count(&self, subcommand: &str) -> usize {
        self.calls().iter().filter(|c| *c == subcommand).count()
    }
}

#[test]
fn production_without_env_file_fails_and_creates_nothing() {
    let app = App::new();

    app.entrypoint("production")
        .args(["sh", "-c", "echo handed-off"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("handed-off").not())
        .stderr(predicate::str::contains("environment file"));

    assert!(!app.root().join(".env").exists());
    assert!(app.calls().is_empty());
}

#[test]
fn production_with_empty_key_never_generates_one() {
    let app = App::new();
    fs::write(app.root().join(".env"), "APP_ENV=production\nAPP_KEY=\n").unwrap();

    app.entrypoint("production")
        .args(["sh", "-c", "echo handed-off"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("APP_KEY"));

    assert_eq!(app.count("key:generate"), 0);
    assert_eq!(
        fs::read_to_string(app.root().join(".env")).unwrap(),
        "APP_ENV=production\nAPP_KEY=\n"
    );
}

#[test]
fn development_copies_template_verbatim_and_hands_off() {
    let app = App::new();
    let template = "APP_NAME=\"Shop\"\r\nAPP_KEY=base64:cHJlc2V0\r\n# trailing comment";
    fs::write(app.root().join(".env.example"), template).unwrap();

    app.entrypoint("development")
        .args(["sh", "-c", "echo handed-off \"$1\"", "sh", "--port=9000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("handed-off --port=9000"));

    assert_eq!(fs::read(app.root().join(".env")).unwrap(), template.as_bytes());
    assert_eq!(app.count("key:generate"), 0);
    for clear in ["config:clear", "route:clear", "view:clear", "cache:clear"] {
        assert_eq!(app.count(clear), 1, "{clear}");
    }
}

#[test]
fn production_builds_caches_then_execs() {
    let app = App::new();
    fs::write(app.root().join(".env"), "APP_KEY=base64:cHJvZA==\n").unwrap();

    app.entrypoint("production")
        .args(["sh", "-c", "echo handed-off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("handed-off"));

    let calls = app.calls();
    let builds: Vec<&str> = calls
        .iter()
        .map(String::as_str)
        .filter(|c| c.ends_with(":cache"))
        .collect();
    assert_eq!(builds, vec!["config:cache", "route:cache", "view:cache"]);
    assert!(!calls.iter().any(|c| c.ends_with(":clear")));
    assert!(app.root().join("public/storage").symlink_metadata().is_ok());
}

#[test]
fn production_cache_failure_exits_with_command_status() {
    let app = App::new();
    fs::write(app.root().join(".env"), "APP_KEY=base64:cHJvZA==\n").unwrap();

    app.entrypoint("production")
        .env("STUB_FAIL", "route:cache")
        .args(["sh", "-c", "echo handed-off"])
        .assert()
        .failure()
        .code(7)
        .stdout(predicate::str::contains("handed-off").not())
        .stderr(predicate::str::contains("route"));

    assert_eq!(app.count("view:cache"), 0);
}

#[test]
fn second_run_does_not_regenerate_key() {
    let app = App::new();
    fs::write(app.root().join(".env.example"), "APP_ENV=local\nAPP_KEY=\n").unwrap();

    app.entrypoint("local").assert().success();
    let env_after_first = fs::read_to_string(app.root().join(".env")).unwrap();
    assert!(env_after_first.contains("APP_KEY=base64:c3R1Yi1rZXktZm9yLXRlc3Rz"));

    app.entrypoint("local").assert().success();

    assert_eq!(fs::read_to_string(app.root().join(".env")).unwrap(), env_after_first);
    assert_eq!(app.count("key:generate"), 1);
    assert_eq!(app.count("storage:link"), 1);
}

#[test]
fn unreachable_dependency_with_cap_fails() {
    let app = App::new();
    fs::write(app.root().join(".env"), "APP_KEY=base64:cHJvZA==\n").unwrap();

    app.entrypoint("production")
        // TEST-NET-1: never routable.
        .env("DB_HOST", "192.0.2.1")
        .env("ENTRYPOINT_DB_WAIT_MAX_ATTEMPTS", "2")
        .env("ENTRYPOINT_DB_WAIT_INTERVAL_MS", "10")
        .args(["sh", "-c", "echo handed-off"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unreachable after 2 attempts"));

    assert!(app.calls().is_empty());
}

#[test]
fn invalid_environment_is_a_config_error() {
    let app = App::new();

    app.entrypoint("production")
        .env("DB_PORT", "not-a-port")
        .assert()
        .failure()
        .code(78)
        .stderr(predicate::str::contains("DB_PORT"));
}

#[test]
fn print_config_shows_resolved_values() {
    let app = App::new();

    app.entrypoint("local")
        .env("DB_HOST", "db")
        .arg("--print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"host\": \"db\""))
        .stdout(predicate::str::contains("\"env\": \"local\""));

    assert!(app.calls().is_empty());
}
