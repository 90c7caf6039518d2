use std::path::Path;

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

fn bin() -> Command {
    Command::cargo_bin("milestone-sync").unwrap()
}

/// Command running in `dir` against `server`, isolated from the caller's env.
fn tracker_cmd(dir: &Path, server: &MockServer) -> Command {
    let mut cmd = bin();
    cmd.current_dir(dir)
        .env_clear()
        .env("BACKLOG_SPACE_URL", server.base_url())
        .env("BACKLOG_API_KEY", "secret")
        .env("BACKLOG_PROJECT_KEY", "PRJ")
        .env("BACKLOG_DELAY_MS", "0")
        .env("BACKLOG_RETRY_BASE_DELAY_MS", "1");
    cmd
}

fn mock_versions(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v2/projects/PRJ/versions")
            .query_param("apiKey", "secret");
        then.status(200).json_body(json!([
            {"id": 1, "projectId": 9, "name": "v1", "archived": false},
            {"id": 2, "projectId": 9, "name": "v2", "archived": false},
            {"id": 3, "projectId": 9, "name": "v0", "archived": true}
        ]));
    });
}

fn mock_issue(server: &MockServer, key: &str, milestones: Value) {
    let path = format!("/api/v2/issues/{key}");
    let body = json!({
        "id": 100,
        "issueKey": key,
        "summary": format!("Summary of {key}"),
        "milestone": milestones
    });
    server.mock(move |when, then| {
        when.method(GET).path(path);
        then.status(200).json_body(body);
    });
}

fn write_csv(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("issues.csv");
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn robot_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn only_log_file(dir: &Path) -> String {
    let entries: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "expected one log file in {}", dir.display());
    std::fs::read_to_string(&entries[0]).unwrap()
}

#[test]
fn test_cli_help() {
    bin().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("update"));
}

#[test]
fn test_cli_version() {
    bin().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_add_without_milestone_fails_before_network() {
    let dir = tempdir().unwrap();
    let output = bin()
        .current_dir(dir.path())
        .env_clear()
        .args(["--robot", "add", "--csv", "issues.csv"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let json = robot_json(&output);
    assert_eq!(json["status"]["error"]["code"], "CONFIG_MISSING_REQUIRED");
}

#[test]
fn test_missing_credentials_is_reported() {
    let dir = tempdir().unwrap();
    bin().current_dir(dir.path())
        .env_clear()
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BACKLOG_SPACE_URL"));
}

#[test]
fn test_list_milestones() {
    let server = MockServer::start();
    mock_versions(&server);
    let dir = tempdir().unwrap();

    let output = tracker_cmd(dir.path(), &server)
        .args(["--robot", "list", "--log-dir", "logs"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json = robot_json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["count"], 3);
    assert_eq!(json["data"]["milestones"][2]["archived"], true);

    let log = only_log_file(&dir.path().join("logs"));
    assert!(log.contains("1\tv1\n"));
    assert!(log.contains("3\tv0\t(archived)\n"));
}

#[test]
fn test_add_dry_run_never_patches() {
    let server = MockServer::start();
    mock_versions(&server);
    mock_issue(&server, "PRJ-1", json!([{"id": 1, "name": "v1"}]));
    let dir = tempdir().unwrap();
    let csv = write_csv(&dir, "キー,件名\nPRJ-1,first\n,blank\n");

    // no PATCH mock: a mutation would 404 and show up as a failure
    let output = tracker_cmd(dir.path(), &server)
        .env("DRY_RUN", "true")
        .args(["--robot", "add", "--milestone", "v2", "--csv", &csv])
        .output()
        .unwrap();

    assert!(output.status.success());
    let data = &robot_json(&output)["data"];
    assert_eq!(data["dry_run"], true);
    assert_eq!(data["rows"], 2);
    assert_eq!(data["processed"], 1);
    assert_eq!(data["skipped"], 1);
    assert_eq!(data["held"], 1);
    assert_eq!(data["failed"], 0);

    let log = only_log_file(&dir.path().join("logs"));
    assert!(log.contains("Mode: DRY-RUN"));
    assert!(log.contains("[DRY-RUN] PRJ-1 Summary of PRJ-1"));
    assert!(log.contains("changed: v1 -> v1, v2"));
    assert!(log.contains("row#2: skipped (キー is empty)"));
    assert!(log.contains("All issues processed (rows=2, processed=1, skipped=1)"));
}

#[test]
fn test_add_applies_and_logs() {
    let server = MockServer::start();
    mock_versions(&server);
    mock_issue(&server, "PRJ-1", json!([{"id": 1, "name": "v1"}]));
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/v2/issues/PRJ-1")
            .body("milestoneId%5B%5D=1&milestoneId%5B%5D=2");
        then.status(200).json_body(json!({"issueKey": "PRJ-1"}));
    });
    let dir = tempdir().unwrap();
    let csv = write_csv(&dir, "キー\nPRJ-1\n");

    let output = tracker_cmd(dir.path(), &server)
        .env("DRY_RUN", "true")
        .args(["--robot", "add", "-m", "v2", "--no-dry-run", "--csv", &csv])
        .output()
        .unwrap();

    assert!(output.status.success());
    patch.assert();
    let data = &robot_json(&output)["data"];
    assert_eq!(data["command"], "add-milestone");
    assert_eq!(data["applied"], 1);

    let log = only_log_file(&dir.path().join("logs"));
    assert!(log.contains("[APPLY] PRJ-1"));
    assert!(log.contains("updated"));
}

#[test]
fn test_update_reconciles_from_column_and_honors_skip() {
    let server = MockServer::start();
    mock_versions(&server);
    mock_issue(&server, "PRJ-1", json!([{"id": 1, "name": "v1"}]));
    mock_issue(&server, "PRJ-2", json!([{"id": 3, "name": "v0"}]));
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/v2/issues/PRJ-1")
            .body("milestoneId%5B%5D=2");
        then.status(200).json_body(json!({"issueKey": "PRJ-1"}));
    });
    let dir = tempdir().unwrap();
    let csv = write_csv(&dir, "キー,マイルストーン\nPRJ-1,\"v2, unknown\"\nPRJ-2,v1\n");

    let output = tracker_cmd(dir.path(), &server)
        .args(["--robot", "update", "--skip-if-present", "v0", "--csv", &csv])
        .output()
        .unwrap();

    assert!(output.status.success());
    patch.assert();
    let data = &robot_json(&output)["data"];
    assert_eq!(data["command"], "update");
    assert_eq!(data["applied"], 1);
    assert_eq!(data["gated"], 1);
    assert_eq!(data["processed"], 2);
}

#[test]
fn test_directory_failure_aborts_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/projects/PRJ/versions");
        then.status(401)
            .json_body(json!({"errors": [{"message": "Authentication failure."}]}));
    });
    let dir = tempdir().unwrap();
    let csv = write_csv(&dir, "キー\nPRJ-1\n");

    let output = tracker_cmd(dir.path(), &server)
        .args(["--robot", "delete", "--milestone", "v1", "--csv", &csv])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let json = robot_json(&output);
    assert_eq!(json["status"]["error"]["code"], "DIRECTORY_FETCH_FAILED");
    let log = only_log_file(&dir.path().join("logs"));
    assert!(log.contains("ERROR: Failed to fetch milestones"));
}

#[test]
fn test_convert_shift_jis_directory() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sjis");
    std::fs::create_dir_all(&input).unwrap();
    // "キー" in Shift_JIS
    std::fs::write(input.join("export.csv"), [0x83, 0x4c, 0x81, 0x5b, b'\n']).unwrap();

    bin().current_dir(dir.path())
        .env_clear()
        .args(["convert", "--input", "sjis", "--output", "utf8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted:"));

    let text = std::fs::read_to_string(dir.path().join("utf8/export.csv")).unwrap();
    assert_eq!(text, "キー\n");
}
