//! These tests are mostly here just to ensure that invalid results will be
//! caught when passing arguments.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{no_cfg_swapplan_command, swapplan_command};

#[test]
fn test_no_command() {
    no_cfg_swapplan_command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help() {
    swapplan_command(&["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("General Options"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_version() {
    swapplan_command(&["-V"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_sizes() {
    for size in ["abc", "-5", "12.5", "2048M"] {
        no_cfg_swapplan_command()
            .args(["plan", "--memory", "1024", "--current-swap", "0", "--size", size])
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not a whole number of MiB"));
    }
}

#[test]
fn test_size_below_minimum() {
    no_cfg_swapplan_command()
        .args(["plan", "--memory", "1024", "--current-swap", "0", "--size", "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("below the minimum of 128 MiB"));
}

#[test]
fn test_no_action_needed() {
    no_cfg_swapplan_command()
        .args(["plan", "--memory", "4096", "--current-swap", "4096"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended:   4096 MiB"))
        .stdout(predicate::str::contains("no action needed"));
}

#[test]
fn test_recommendation() {
    no_cfg_swapplan_command()
        .args(["plan", "--memory", "1024", "--current-swap", "4096"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended:   2048 MiB"));
}

#[test]
fn test_relative_swap_file() {
    no_cfg_swapplan_command()
        .args(["status", "--swap-file", "swapfile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'--swap-file' must be an absolute path"));
}

#[test]
fn test_large_swappiness() {
    no_cfg_swapplan_command()
        .args(["status", "--swappiness", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--swappiness' must be between 0 and 100",
        ));
}

#[test]
fn test_swappiness_not_a_number() {
    no_cfg_swapplan_command()
        .args(["status", "--swappiness", "high"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
