use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cycle() -> Command {
    Command::cargo_bin("cycle").unwrap()
}

#[test]
fn test_run_fixed_pool_reports_balanced() {
    cycle()
        .args([
            "run",
            "--resources",
            "2",
            "--workers",
            "4",
            "--iterations",
            "20",
            "--hold-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pool: fixed with 2 initial sprites"))
        .stdout(predicate::str::contains("Acquired: 80"))
        .stdout(predicate::str::contains("Balanced: yes"));
}

#[test]
fn test_run_json_with_leaked_sprites() {
    let output = cycle()
        .args([
            "run",
            "--resources",
            "3",
            "--iterations",
            "5",
            "--hold-ms",
            "0",
            "--leak",
            "2",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["force_released"], 2);
    assert_eq!(report["destroyed"], 3);
    assert_eq!(report["balanced"], true);
    assert_eq!(report["stats"]["acquired"], 22);
}

#[test]
fn test_run_growable_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pool.toml");
    fs::write(&path, "initial_size = 1\ngrowable = true\nupdate_interval_ms = 2\n").unwrap();

    let output = cycle()
        .args(["run", "--workers", "3", "--iterations", "10", "--json"])
        .arg("--config")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["config"]["growable"], true);
    assert_eq!(report["config"]["update_interval_ms"], 2);
    assert_eq!(report["stats"]["waits"], 0);
    assert_eq!(report["balanced"], true);
}

#[test]
fn test_run_rejects_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "initial_size = \"lots\"\n").unwrap();

    cycle()
        .arg("run")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pool configuration"));
}

#[test]
fn test_run_rejects_empty_fixed_pool() {
    cycle()
        .args(["run", "--resources", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs at least one resource"));
}

#[test]
fn test_config_prints_defaults() {
    cycle()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("initial_size = 4"))
        .stdout(predicate::str::contains("growable = false"))
        .stdout(predicate::str::contains("update_interval_ms = 10"));
}
