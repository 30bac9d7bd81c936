//! Runs against valid config files and scratch system files.

use std::fs;

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{swapplan_command, ScratchHost, FSTAB};

#[test]
fn test_empty() {
    swapplan_command(&[
        "-C",
        "./tests/valid_configs/empty_config.toml",
        "plan",
        "--memory",
        "2048",
        "--current-swap",
        "8192",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Recommended:   3072 MiB"));
}

#[test]
fn test_all_proper() {
    swapplan_command(&[
        "-C",
        "./tests/valid_configs/all_proper.toml",
        "plan",
        "--memory",
        "4096",
        "--current-swap",
        "8192",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("no action needed"));
}

#[test]
fn test_raised_minimum() {
    swapplan_command(&[
        "-C",
        "./tests/valid_configs/all_proper.toml",
        "plan",
        "--memory",
        "1024",
        "--current-swap",
        "0",
        "--size",
        "256",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("below the minimum of 512 MiB"));
}

#[test]
fn test_creates_missing_config() {
    let host = ScratchHost::new();
    let config = host.path("nested/swapplan.toml");

    swapplan_command(&["-C", &config, "plan", "--memory", "1024", "--current-swap", "4096"])
        .assert()
        .success();

    let written = fs::read_to_string(&config).unwrap();
    assert!(written.contains("[swap]"));
    assert!(written.contains("#swappiness = 10"));
}

#[test]
fn test_status_is_read_only() {
    let host = ScratchHost::new();

    swapplan_command(&["-C", "./tests/valid_configs/empty_config.toml", "status"])
        .args(host.args())
        .assert()
        .success()
        .stdout(predicate::str::contains("Mount table:   unmodified"))
        .stdout(predicate::str::contains("/dev/vda2 none swap sw 0 0"))
        .stdout(predicate::str::contains("(missing)"));

    assert_eq!(fs::read_to_string(host.path("fstab")).unwrap(), FSTAB);
    assert!(!host.dir.path().join("fstab.swapplan.bak").exists());
    assert!(!host.dir.path().join("swapplan.lock").exists());
}

#[test]
fn test_dry_run_changes_nothing() {
    let host = ScratchHost::new();

    swapplan_command(&["-C", "./tests/valid_configs/empty_config.toml", "apply", "-y", "--dry-run"])
        .args(["--size", "128"])
        .args(host.args())
        .assert()
        .success()
        .stdout(predicate::str::contains("Action:"));

    assert_eq!(fs::read_to_string(host.path("fstab")).unwrap(), FSTAB);
    assert!(!host.dir.path().join("swapfile").exists());
    assert!(!host.dir.path().join("fstab.swapplan.bak").exists());
    assert!(!host.dir.path().join("sysctl.conf").exists());
}

#[test]
fn test_dry_run_from_config() {
    let host = ScratchHost::new();

    swapplan_command(&["-C", "./tests/valid_configs/dry_run.toml", "apply", "--size", "128"])
        .args(host.args())
        .assert()
        .success();

    assert_eq!(fs::read_to_string(host.path("fstab")).unwrap(), FSTAB);
    assert!(!host.dir.path().join("swapfile").exists());
}
