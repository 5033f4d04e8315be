//! End-to-end tests for the jarvis binary.
//!
//! Every invocation runs with HOME and XDG_CONFIG_HOME pointed into a temp
//! directory so no real configuration is read or written.

use std::fs;
use std::path::Path;

use assert_cmd::assert::{Assert, OutputAssertExt};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Fixtures
// =============================================================================

/// Isolated home directory plus an explicit config path inside it.
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.dir.path().join("config.toml")
    }

    fn write_config(&self, contents: &str) {
        fs::write(self.config_path(), contents).unwrap();
    }

    fn jarvis(&self) -> Command {
        let mut cmd = Command::cargo_bin("jarvis").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg"))
            .env_remove("JARVIS_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

// =============================================================================
// Misc
// =============================================================================

#[test]
fn ping_prints_pang() {
    Env::new()
        .jarvis()
        .arg("ping")
        .assert()
        .success()
        .stdout("pang\n");
}

#[test]
fn completion_bash_mentions_binary() {
    Env::new()
        .jarvis()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jarvis"));
}

#[test]
fn unknown_command_fails() {
    Env::new().jarvis().arg("frobnicate").assert().failure();
}

// =============================================================================
// Config
// =============================================================================

#[test]
fn config_set_then_get() {
    let env = Env::new();
    env.jarvis()
        .args(["config", "set", "panel.host", "https://panel.example.com:8888"])
        .assert()
        .success();
    env.jarvis()
        .args(["config", "get", "panel.host"])
        .assert()
        .success()
        .stdout("https://panel.example.com:8888\n");

    let written = fs::read_to_string(env.config_path()).unwrap();
    assert!(written.contains("[panel]"));
}

#[test]
fn config_list_masks_secrets() {
    let env = Env::new();
    env.write_config("[panel]\nkey = \"abcdefghijklmnop\"\n");
    env.jarvis()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("panel.key = ********mnop"))
        .stdout(predicate::str::contains("abcdefghijkl").not());
}

#[test]
fn config_rejects_unknown_key() {
    Env::new()
        .jarvis()
        .args(["config", "set", "panel.token", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn config_rejects_invalid_port() {
    Env::new()
        .jarvis()
        .args(["config", "set", "mysql.port", "0"])
        .assert()
        .failure();
}

#[test]
fn config_path_prints_explicit_path() {
    let env = Env::new();
    env.jarvis()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn malformed_config_is_reported() {
    let env = Env::new();
    env.write_config("[panel\nhost = ");
    env.jarvis()
        .arg("ping")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

// =============================================================================
// Panel
// =============================================================================

#[test]
fn bt_without_key_fails_before_any_request() {
    Env::new()
        .jarvis()
        .args(["bt", "site", "show", "--host", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Panel key not set"));
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_blocking(mut cmd: Command) -> Assert {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
        .assert()
}

#[tokio::test]
async fn bt_http_posts_data_and_prints_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/system"))
        .and(query_param("action", "GetSystemTotal"))
        .and(body_string_contains("a=1&b=2&request_time="))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"cpuNum":8}"#))
        .expect(1)
        .mount(&server)
        .await;

    let env = Env::new();
    let uri = server.uri();
    let mut cmd = env.jarvis();
    cmd.args(["-q", "bt", "-k", "K", "-s", uri.as_str()])
        .args(["http", "--query", "/system?action=GetSystemTotal", "--data", "a=1&b=2"]);
    run_blocking(cmd)
        .await
        .success()
        .stdout("{\"cpuNum\":8}\n");
}

#[tokio::test]
async fn bt_crontab_get_lists_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crontab"))
        .and(query_param("action", "GetCrontab"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"id":4,"name":"backup","type":"day"}]"#),
        )
        .mount(&server)
        .await;

    let env = Env::new();
    env.write_config(&format!("[panel]\nhost = \"{}\"\nkey = \"K\"\n", server.uri()));
    let mut cmd = env.jarvis();
    cmd.args(["-q", "bt", "crontab", "get"]);
    run_blocking(cmd)
        .await
        .success()
        .stdout(predicate::str::diff(format!("4 day{} backup\n", " ".repeat(13))));
}

#[tokio::test]
async fn bt_crontab_get_reports_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":"0","msg":"bad key"}"#),
        )
        .mount(&server)
        .await;

    let env = Env::new();
    let uri = server.uri();
    let mut cmd = env.jarvis();
    cmd.args(["bt", "-k", "K", "-s", uri.as_str(), "crontab", "get"]);
    run_blocking(cmd)
        .await
        .failure()
        .stderr(predicate::str::contains("bad key"));
}

#[tokio::test]
async fn bt_site_delete_unknown_name_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"data":[{"id":1,"name":"a.com"}]}"#),
        )
        .mount(&server)
        .await;

    let env = Env::new();
    let uri = server.uri();
    let mut cmd = env.jarvis();
    cmd.args(["bt", "-k", "K", "-s", uri.as_str(), "site", "delete", "--name", "b.com"]);
    run_blocking(cmd)
        .await
        .failure()
        .stderr(predicate::str::contains("site not found: b.com"));
}

#[test]
fn bt_site_conf_requires_source() {
    Env::new()
        .jarvis()
        .args(["bt", "-k", "K", "-s", "http://127.0.0.1:1", "site", "conf", "--name", "a.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Use --file or --content"));
}

// =============================================================================
// Xcode
// =============================================================================

fn xcode_project(root: &Path, version: &str) -> std::path::PathBuf {
    let proj = root.join("App.xcodeproj");
    fs::create_dir_all(&proj).unwrap();
    let pbxproj = proj.join("project.pbxproj");
    fs::write(
        &pbxproj,
        format!(
            "\t\tMARKETING_VERSION = {v};\n\t\tCURRENT_PROJECT_VERSION = 1;\n\t\tMARKETING_VERSION = {v};\n",
            v = version
        ),
    )
    .unwrap();
    pbxproj
}

#[test]
fn xcode_version_reads_marketing_version() {
    let env = Env::new();
    let work = TempDir::new().unwrap();
    xcode_project(work.path(), "2.3.4");
    env.jarvis()
        .current_dir(work.path())
        .args(["-q", "xcode", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marketing version: 2.3.4"));
}

#[test]
fn xcode_bump_dry_run_leaves_file() {
    let env = Env::new();
    let work = TempDir::new().unwrap();
    let pbxproj = xcode_project(work.path(), "1.0.9");
    env.jarvis()
        .current_dir(work.path())
        .args(["xcode", "bump", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New: 1.0.10"))
        .stdout(predicate::str::contains("Version management"));
    let content = fs::read_to_string(pbxproj).unwrap();
    assert_eq!(content.matches("MARKETING_VERSION = 1.0.9;").count(), 2);
}

#[test]
fn xcode_bump_rewrites_every_occurrence() {
    let env = Env::new();
    let work = TempDir::new().unwrap();
    let pbxproj = xcode_project(work.path(), "1.0.9");
    env.jarvis()
        .current_dir(work.path())
        .args(["-q", "xcode", "bump", "-p"])
        .arg(&pbxproj)
        .assert()
        .success();
    let content = fs::read_to_string(pbxproj).unwrap();
    assert_eq!(content.matches("MARKETING_VERSION = 1.0.10;").count(), 2);
}

#[test]
fn xcode_version_without_project_fails() {
    let env = Env::new();
    let work = TempDir::new().unwrap();
    env.jarvis()
        .current_dir(work.path())
        .args(["xcode", "version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".pbxproj"));
}
