use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// End-to-end tests for the `mdb-review` binary.
/// Each test runs from an empty temp directory with HOME pointed at it so no
/// developer configuration leaks in.

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn mdb_review(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mdb-review").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_review_yaml_request_as_json() {
    let home = TempDir::new().unwrap();
    let output = mdb_review(&home)
        .args(["review", "--format", "json"])
        .arg(fixture("standalone.yaml"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["cluster_name"], "shop");
    assert_eq!(report["topology_type"], "standalone");
    assert!(report["recommendations"].as_array().is_some());
}

#[test]
fn test_review_critical_cluster_succeeds_without_flag() {
    let home = TempDir::new().unwrap();
    let output = mdb_review(&home)
        .args(["review", "-f", "json"])
        .arg(fixture("galera_partitioned.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["overall_status"], "critical");
}

#[test]
fn test_fail_on_critical_sets_exit_code() {
    let home = TempDir::new().unwrap();
    mdb_review(&home)
        .args(["review", "-f", "summary", "--fail-on-critical"])
        .arg(fixture("galera_partitioned.json"))
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Cluster orders (galera): CRITICAL"))
        .stderr(predicate::str::contains(
            "Error: Review of 'orders' finished with critical status",
        ));
}

#[test]
fn test_unknown_topology_is_rejected() {
    let home = TempDir::new().unwrap();
    mdb_review(&home)
        .args(["review", "--topology", "ring"])
        .arg(fixture("standalone.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported topology type: ring"));
}

#[test]
fn test_review_writes_output_file() {
    let home = TempDir::new().unwrap();
    let report_path = home.path().join("report.yaml");
    mdb_review(&home)
        .args(["review", "--format", "yaml", "--output"])
        .arg(&report_path)
        .arg(fixture("standalone.yaml"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Report saved to:"));

    let written = fs::read_to_string(&report_path).unwrap();
    assert!(written.contains("cluster_name: shop"));
}

#[test]
fn test_local_config_sets_default_format() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".mdb-review.toml"),
        "[output]\nformat = \"json\"\ncolor = false\n",
    )
    .unwrap();

    let output = mdb_review(&home)
        .arg("review")
        .arg(fixture("standalone.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["cluster_name"], "shop");
}

#[test]
fn test_missing_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    mdb_review(&home)
        .args(["--config", "does-not-exist.toml", "thresholds"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_detect_galera() {
    let home = TempDir::new().unwrap();
    let output = mdb_review(&home)
        .args(["detect", "--format", "json"])
        .arg(fixture("galera_partitioned.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let detection = stdout_json(&output);
    assert_eq!(detection["topology"], "galera");
    assert_eq!(detection["confidence"], "high");
}

#[test]
fn test_logs_from_files() {
    let home = TempDir::new().unwrap();
    let output = mdb_review(&home)
        .arg("logs")
        .arg("--mariadb")
        .arg(format!("g1={}", fixture("logs/error.log").display()))
        .arg("--proxy")
        .arg(format!("mx1={}", fixture("logs/maxscale.log").display()))
        .arg("--slow-query")
        .arg(format!("g1={}", fixture("logs/slow.log").display()))
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["summary"]["disk_issues_detected"], true);
    assert_eq!(result["summary"]["inconsistency_detected"], false);
    assert_eq!(result["timeline"][0]["node"], "g1");
    assert_eq!(result["timeline"][0]["type"], "disk_full");
    assert_eq!(
        result["slow_query_logs"]["g1"]["summary"]["queries_over_60s"],
        1
    );
    assert!(result["proxy_logs"]["mx1"].is_object());
}

#[test]
fn test_logs_without_sources_fails() {
    let home = TempDir::new().unwrap();
    mdb_review(&home)
        .arg("logs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no logs given"));
}

#[test]
fn test_compare_and_sizing_render() {
    let home = TempDir::new().unwrap();
    let output = mdb_review(&home)
        .args(["compare", "-f", "json"])
        .arg(fixture("standalone.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["current_topology"], "standalone");

    let output = mdb_review(&home)
        .args(["sizing", "-f", "json", "--topology", "galera"])
        .arg(fixture("standalone.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["current_sizing"]["node_count"], 1);
}

#[test]
fn test_thresholds_prints_yaml() {
    let home = TempDir::new().unwrap();
    mdb_review(&home)
        .arg("thresholds")
        .assert()
        .success()
        .stdout(predicate::str::contains("galera:"))
        .stdout(predicate::str::contains("server:"));
}
