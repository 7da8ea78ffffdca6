//! Integration tests for the `wakelight` CLI binary.
//!
//! None of these reach a real server: they cover argument parsing, config
//! handling, exit codes and a loopback magic packet.
#![allow(clippy::unwrap_used)]

use std::net::UdpSocket;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `wakelight` binary with env isolation.
///
/// Clears the `WAKELIGHT_*` variables the binary reads and points config
/// directories at a nonexistent path so tests never touch real settings.
fn wakelight_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("wakelight");
    cmd.env("HOME", "/tmp/wakelight-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/wakelight-cli-test-nonexistent")
        .env_remove("WAKELIGHT_CONFIG")
        .env_remove("WAKELIGHT_SECRET")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = wakelight_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    wakelight_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Wake-on-LAN")
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("wake"))
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    wakelight_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    wakelight_cmd().arg("frobnicate").assert().code(2);
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    wakelight_cmd()
        .args(["-q", "-v", "config", "path"])
        .assert()
        .code(2);
}

#[test]
fn test_completions_bash() {
    wakelight_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wakelight"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");

    wakelight_cmd()
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_writes_defaults_and_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    wakelight_cmd()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[server]"), "missing [server]:\n{written}");
    assert!(written.contains("ws://127.0.0.1:8080/ws"));
    assert!(written.contains("255.255.255.255:9"));

    let output = wakelight_cmd()
        .args(["config", "init", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--force"));

    wakelight_cmd()
        .args(["config", "init", "--force", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_config_show_masks_secret() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[server]\nurl = \"wss://hub.example.com/ws\"\nsecret = \"hunter2\"\n\n[device]\nname = \"desk\"\n",
    )
    .unwrap();

    wakelight_cmd()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("wss://hub.example.com/ws")
                .and(predicate::str::contains("desk"))
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_show_applies_env_overrides() {
    wakelight_cmd()
        .env("WAKELIGHT_DEVICE__NAME", "from-env")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env"));
}

#[test]
fn test_config_show_rejects_broken_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[server\nurl = ").unwrap();

    wakelight_cmd()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .code(2);
}

// ── Wake ────────────────────────────────────────────────────────────

#[test]
fn test_wake_rejects_bad_mac() {
    let output = wakelight_cmd()
        .args(["wake", "not-a-mac", "--broadcast", "127.0.0.1:9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Invalid MAC address"));
}

#[test]
fn test_wake_rejects_bad_broadcast() {
    wakelight_cmd()
        .args(["wake", "AA:BB:CC:DD:EE:FF", "--broadcast", "nowhere"])
        .assert()
        .code(2);
}

#[test]
fn test_wake_sends_magic_packet() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let target = socket.local_addr().unwrap().to_string();

    wakelight_cmd()
        .args(["wake", "aa-bb-cc-dd-ee-ff", "--broadcast", &target])
        .assert()
        .success()
        .stdout(predicate::str::contains("AA:BB:CC:DD:EE:FF"));

    let mut buf = [0u8; 256];
    let len = socket.recv(&mut buf).unwrap();
    assert_eq!(len, 102);
    assert!(buf[..6].iter().all(|&b| b == 0xFF));
    for chunk in buf[6..102].chunks(6) {
        assert_eq!(chunk, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }
}

// ── Run ─────────────────────────────────────────────────────────────

#[test]
fn test_run_rejects_http_url() {
    let output = wakelight_cmd()
        .args(["run", "--url", "http://127.0.0.1:8080/ws", "--secret", "s3cret"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("server.url"));
}

#[test]
fn test_run_rejects_invalid_device_mac() {
    wakelight_cmd()
        .env("WAKELIGHT_DEVICE__MAC", "zz:zz")
        .args(["run", "--secret", "s3cret"])
        .assert()
        .code(2);
}

#[test]
fn test_run_without_secret_is_auth_error() {
    let output = wakelight_cmd()
        .env("WAKELIGHT_DEVICE__NAME", "wakelight-cli-test-no-secret")
        .arg("run")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("No shared secret"), "unexpected output:\n{text}");
    assert!(text.contains("set-secret"));
}
