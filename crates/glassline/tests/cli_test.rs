//! Integration tests for the `glassline` binary.
//!
//! Argument parsing, configuration handling, rejections and REST-backed
//! queries against a wiremock agent. No SSH device is ever contacted.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `glassline` binary with env isolation.
fn glassline_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("glassline");
    cmd.env("HOME", "/tmp/glassline-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/glassline-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("GLASSLINE_CONFIG")
        .env_remove("GLASSLINE_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// A config file and a private results file, removed together.
struct Fixture {
    _dir: TempDir,
    config: PathBuf,
    cache: PathBuf,
}

impl Fixture {
    fn path(&self) -> &Path {
        &self.config
    }
}

/// A scrape device that must never be dialled and, optionally, a REST
/// agent device.
fn config_with_agent(agent_port: Option<u16>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("results.json");
    let mut toml = format!(
        r#"
[logging]
level = "warn"

[cache]
path = '{}'

[credentials.routers]
username = "lg"
password = "router-secret"

[devices.nyc1]
address = "192.0.2.1"
platform = "cisco_ios"
credential = "routers"
display_name = "New York"
"#,
        cache.display()
    );
    if let Some(port) = agent_port {
        toml.push_str(&format!(
            r#"
[credentials.agent]
username = "agent"
password = "agent-key"

[devices.fra1]
address = "127.0.0.1"
port = {port}
platform = "frr"
credential = "agent"
"#
        ));
    }
    let config = dir.path().join("glassline.toml");
    std::fs::write(&config, toml).unwrap();
    Fixture {
        _dir: dir,
        config,
        cache,
    }
}

fn with_config(file: &Path) -> assert_cmd::Command {
    let mut cmd = glassline_cmd();
    cmd.arg("--config").arg(file);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = glassline_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr:\n{stderr}");
}

#[test]
fn test_help_lists_commands() {
    glassline_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("query")
            .and(predicate::str::contains("batch"))
            .and(predicate::str::contains("devices")),
    );
}

#[test]
fn test_completions_bash() {
    glassline_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("glassline"));
}

#[test]
fn test_unknown_query_type_is_usage_error() {
    let cfg = config_with_agent(None);
    with_config(cfg.path())
        .args(["query", "nyc1", "show-run", "192.0.2.1"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_echoes_explicit_file() {
    glassline_cmd()
        .args(["--config", "/etc/glassline/custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/etc/glassline/custom.toml"));
}

#[test]
fn test_config_check_summarizes() {
    let cfg = config_with_agent(Some(8080));
    with_config(cfg.path())
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK").and(predicate::str::contains("devices:     2")));
}

#[test]
fn test_config_check_rejects_dangling_credential() {
    let cfg = write_config(
        r#"
[devices.nyc1]
address = "192.0.2.1"
platform = "juniper"
credential = "nobody"
"#,
    );
    with_config(cfg.path())
        .args(["config", "check"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("unknown credential 'nobody'"));
}

#[test]
fn test_config_show_masks_passwords() {
    let cfg = config_with_agent(None);
    with_config(cfg.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********").and(predicate::str::contains("router-secret").not()));
}

#[test]
fn test_missing_config_file_exits_4() {
    glassline_cmd()
        .args(["--config", "/tmp/glassline-cli-test-nonexistent/none.toml", "devices"])
        .assert()
        .code(4);
}

// ── Devices ─────────────────────────────────────────────────────────

#[test]
fn test_devices_plain_lists_locations() {
    let cfg = config_with_agent(Some(8080));
    with_config(cfg.path())
        .args(["devices", "-o", "plain"])
        .assert()
        .success()
        .stdout("fra1\nnyc1\n");
}

#[test]
fn test_devices_json() {
    let cfg = config_with_agent(None);
    let output = with_config(cfg.path())
        .args(["devices", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(devices[0]["location"], "nyc1");
    assert_eq!(devices[0]["platform"], "cisco_ios");
    assert_eq!(devices[0]["port"], 22);
}

// ── Queries ─────────────────────────────────────────────────────────

#[test]
fn test_unknown_location_exits_4() {
    let cfg = config_with_agent(None);
    with_config(cfg.path())
        .args(["query", "mars1", "ping", "198.51.100.1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown location 'mars1'"));
}

#[test]
fn test_rejected_target_exits_3() {
    let cfg = config_with_agent(None);
    with_config(cfg.path())
        .args(["query", "nyc1", "ping", "127.0.0.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("127.0.0.1 is not allowed."));
}

#[test]
fn test_rejection_is_reported_in_json() {
    let cfg = config_with_agent(None);
    let output = with_config(cfg.path())
        .args(["-o", "json", "query", "nyc1", "community", "not-a-community"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcome"], "rejected");
    assert_eq!(report["status_code"], 415);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rest_query_prints_agent_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("65000:1 prefixes: 198.51.100.0/24"))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = config_with_agent(Some(server.address().port()));
    with_config(cfg.path())
        .args(["-o", "plain", "query", "fra1", "bgp_community", "65000:1"])
        .assert()
        .success()
        .stdout("65000:1 prefixes: 198.51.100.0/24\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rest_error_status_exits_1() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("agent crashed"))
        .mount(&server)
        .await;

    let cfg = config_with_agent(Some(server.address().port()));
    with_config(cfg.path())
        .args(["query", "fra1", "bgp_route", "198.51.100.0/24"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("agent crashed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_deduplicates_identical_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frr"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("route via 192.0.2.9")
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cfg = config_with_agent(Some(server.address().port()));
    let batch = write_config(
        "# same lookup three times\n\
         fra1 bgp_route 198.51.100.0/24\n\
         fra1 bgp_route 198.51.100.0/24\n\
         fra1 route  198.51.100.0/24 \n",
    );
    let output = with_config(cfg.path())
        .args(["-o", "json", "batch"])
        .arg(batch.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 3);
    assert!(reports
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["output"] == "route via 192.0.2.9"));
}

#[test]
fn test_batch_reports_bad_line() {
    let cfg = config_with_agent(None);
    let batch = write_config("nyc1 ping 198.51.100.1\nnyc1 reboot now\n");
    with_config(cfg.path())
        .arg("batch")
        .arg(batch.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Line 2"));
}

// ── Result cache ────────────────────────────────────────────────────

#[test]
fn test_cache_path_uses_configured_file() {
    let cfg = config_with_agent(None);
    with_config(cfg.path())
        .args(["cache", "path"])
        .assert()
        .success()
        .stdout(format!("{}\n", cfg.cache.display()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_results_are_shared_between_invocations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("route via 192.0.2.9"))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = config_with_agent(Some(server.address().port()));
    for _ in 0..2 {
        with_config(cfg.path())
            .args(["-o", "plain", "query", "fra1", "bgp_route", "198.51.100.0/24"])
            .assert()
            .success()
            .stdout("route via 192.0.2.9\n");
    }
    assert!(cfg.cache.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_cache_and_cache_clear_reach_the_agent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("route via 192.0.2.9"))
        .expect(3)
        .mount(&server)
        .await;

    let cfg = config_with_agent(Some(server.address().port()));
    let query = ["-o", "plain", "query", "fra1", "bgp_route", "198.51.100.0/24"];

    // 1: fills the cache.
    with_config(cfg.path()).args(query).assert().success();
    // 2: bypasses it.
    with_config(cfg.path())
        .args(query)
        .arg("--no-cache")
        .assert()
        .success();
    // Served from the file.
    with_config(cfg.path()).args(query).assert().success();

    with_config(cfg.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache cleared"));
    assert!(!cfg.cache.exists());

    // 3: the cache is empty again.
    with_config(cfg.path()).args(query).assert().success();
}
