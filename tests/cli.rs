//! CLI tests
//!
//! These tests go through `cli::dispatch` and the built binary with:
//! 1. a temporary config file whose test command is `test -f`
//! 2. a temporary tests directory holding the test files and fixtures
//! 3. an explicit SDK root, pre-seeded where a download must not happen

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use systest::cli::dispatch;
use systest::commands::{Commands, PathArgs, TableArgs};
use systest::Error;

/// One passing and one failing scenario under `test -f`
const TABLE: &str = r#"
- name: present
  test_file: present.py
- name: missing
  test_file: missing.py
"#;

struct TestContext {
    _tmp: TempDir,
    config: PathBuf,
    scenarios: PathBuf,
    tests_dir: PathBuf,
    sdk_dir: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");

        let config = tmp.path().join("config.toml");
        std::fs::write(&config, "[tests]\ncommand = [\"test\", \"-f\"]\n").unwrap();

        let scenarios = tmp.path().join("scenarios.yaml");
        std::fs::write(&scenarios, TABLE).unwrap();

        let tests_dir = tmp.path().join("system_tests");
        std::fs::create_dir_all(tests_dir.join("data")).unwrap();
        std::fs::write(tests_dir.join("present.py"), "").unwrap();
        std::fs::write(tests_dir.join("data").join("service_account.json"), "{}").unwrap();

        let sdk_dir = tmp.path().join("sdk");

        Self {
            _tmp: tmp,
            config,
            scenarios,
            tests_dir,
            sdk_dir,
        }
    }

    fn paths(&self) -> PathArgs {
        PathArgs {
            tests_dir: Some(self.tests_dir.clone()),
            sdk_root: Some(self.sdk_dir.clone()),
        }
    }

    fn table(&self) -> TableArgs {
        TableArgs {
            scenarios: Some(self.scenarios.clone()),
        }
    }

    fn run(&self, names: &[&str], table: TableArgs, dry_run: bool) -> Commands {
        Commands::Run {
            names: names.iter().map(|n| n.to_string()).collect(),
            table,
            paths: self.paths(),
            keep_sdk_root: false,
            fail_fast: false,
            dry_run,
            json: true,
        }
    }

    fn seed_gcloud(&self) -> PathBuf {
        let bin = self.sdk_dir.join("google-cloud-sdk").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let gcloud = bin.join("gcloud");
        std::fs::write(&gcloud, "#!/bin/sh\n").unwrap();
        gcloud
    }

    fn config(&self) -> Option<PathBuf> {
        Some(self.config.clone())
    }
}

fn systest(args: &[&str], config: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_systest"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("Failed to run systest")
}

#[tokio::test]
async fn test_run_passes_with_table_from_file() {
    let ctx = TestContext::new();
    let command = ctx.run(&["present"], ctx.table(), false);
    dispatch(command, ctx.config()).await.unwrap();
}

#[tokio::test]
async fn test_run_reports_failed_scenarios() {
    let ctx = TestContext::new();
    let command = ctx.run(&[], ctx.table(), false);
    match dispatch(command, ctx.config()).await {
        Err(Error::ScenariosFailed(n)) => assert_eq!(n, 1),
        other => panic!("expected ScenariosFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_rejects_unknown_scenario() {
    let ctx = TestContext::new();
    let command = ctx.run(&["nope"], ctx.table(), false);
    let err = dispatch(command, ctx.config()).await.unwrap_err();
    assert!(matches!(err, Error::UnknownScenario { .. }));
}

#[tokio::test]
async fn test_dry_run_leaves_sdk_root_untouched() {
    let ctx = TestContext::new();
    let command = ctx.run(
        &["default_cloud_sdk_service_account", "app_engine"],
        TableArgs::default(),
        true,
    );
    dispatch(command, ctx.config()).await.unwrap();
    assert!(!ctx.sdk_dir.exists());
}

#[tokio::test]
async fn test_list_json_with_table_from_file() {
    let ctx = TestContext::new();
    let command = Commands::List {
        table: ctx.table(),
        json: true,
    };
    dispatch(command, ctx.config()).await.unwrap();
}

#[tokio::test]
async fn test_list_rejects_invalid_table() {
    let ctx = TestContext::new();
    std::fs::write(&ctx.scenarios, "- {name: a, test_file: t.py}\n- {name: a, test_file: u.py}\n")
        .unwrap();
    let command = Commands::List {
        table: ctx.table(),
        json: false,
    };
    assert!(dispatch(command, ctx.config()).await.is_err());
}

#[tokio::test]
async fn test_provision_on_installed_root_is_noop() {
    let ctx = TestContext::new();
    let gcloud = ctx.seed_gcloud();
    let command = Commands::Provision { paths: ctx.paths() };
    dispatch(command, ctx.config()).await.unwrap();

    assert!(gcloud.exists());
    assert!(!ctx.sdk_dir.join("google-cloud-sdk.tar.gz").exists());
}

#[test]
fn test_binary_exit_codes() {
    let ctx = TestContext::new();
    let tests_dir = ctx.tests_dir.display().to_string();
    let sdk_dir = ctx.sdk_dir.display().to_string();
    let scenarios = ctx.scenarios.display().to_string();
    let base = [
        "run",
        "--scenarios",
        &scenarios,
        "--tests-dir",
        &tests_dir,
        "--sdk-root",
        &sdk_dir,
        "--json",
    ];

    let mut args = base.to_vec();
    args.push("present");
    let output = systest(&args, &ctx.config);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["results"][0]["status"], "passed");

    let output = systest(&base, &ctx.config);
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["results"][1]["status"], "failed");
}

#[test]
fn test_binary_list_json() {
    let ctx = TestContext::new();
    let output = systest(&["list", "--json"], &ctx.config);
    assert!(output.status.success());
    let table: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = table
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(names.len(), 11);
    assert!(names.contains(&"app_engine"));
}
