//! Integration tests for the `octopus` binary.
//!
//! Each test runs the built binary with its configuration and home
//! directory pointed into a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Test fixture isolating the binary from the user's configuration.
struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn octopus(&self) -> Command {
        let mut cmd = Command::cargo_bin("octopus").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("OCTOPUS_CLI_CONFIG", self.dir.path().join("config.toml"))
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("OCTOPUS_URL")
            .env_remove("OCTOPUS_API_KEY")
            .env_remove("OCTOPUS_SPACE")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn help_lists_commands() {
    TestEnv::new()
        .octopus()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn version_flag() {
    TestEnv::new()
        .octopus()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("octopus "));
}

#[test]
fn create_help_lists_scope_flags() {
    let assert = TestEnv::new()
        .octopus()
        .args(["project", "variable", "create", "--help"])
        .assert()
        .success();

    for flag in [
        "--environment-scope",
        "--target-scope",
        "--step-scope",
        "--role-scope",
        "--channel-scope",
        "--tag-scope",
        "--process-scope",
        "--prompt-dropdown-option",
    ] {
        assert_stdout_contains(&assert, flag);
    }
}

#[test]
fn variable_help_lists_library_set_commands() {
    let assert = TestEnv::new()
        .octopus()
        .args(["project", "variable", "--help"])
        .assert()
        .success();

    for command in ["include", "exclude"] {
        assert_stdout_contains(&assert, command);
    }
}

fn assert_stdout_contains(assert: &assert_cmd::assert::Assert, needle: &str) {
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains(needle), "help output is missing {}", needle);
}

#[test]
fn variable_command_without_server_fails() {
    TestEnv::new()
        .octopus()
        .args(["--no-prompt", "project", "variable", "list", "Deploy Website"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no Octopus server configured"));
}

#[test]
fn unknown_type_rejected_by_parser() {
    TestEnv::new()
        .octopus()
        .args(["project", "variable", "create", "-n", "Port", "-t", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'bogus'"));
}

#[test]
fn config_set_then_get() {
    let env = TestEnv::new();

    env.octopus()
        .args(["config", "set", "output-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set output-format = json"));

    env.octopus()
        .args(["config", "get", "output-format"])
        .assert()
        .success()
        .stdout("json\n");

    env.octopus()
        .args(["config", "set", "output-format", "yaml"])
        .assert()
        .failure();
}

#[test]
fn login_status_when_logged_out() {
    TestEnv::new()
        .octopus()
        .args(["-q", "login", "--status"])
        .assert()
        .success()
        .stdout("not_authenticated\n");
}

#[test]
fn bash_completion() {
    TestEnv::new()
        .octopus()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("octopus"));
}
