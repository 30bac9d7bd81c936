//! These tests are for testing some invalid config-file-specific options.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::swapplan_command;

#[test]
fn test_toml_mismatch_type() {
    swapplan_command(&["-C", "./tests/invalid_configs/toml_mismatch_type.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid type"));
}

#[test]
fn test_unknown_key() {
    swapplan_command(&["-C", "./tests/invalid_configs/unknown_key.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field"));
}

#[test]
fn test_duplicate_key() {
    swapplan_command(&["-C", "./tests/invalid_configs/duplicate_key.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate key"));
}

#[test]
fn test_relative_swap_file() {
    swapplan_command(&["-C", "./tests/invalid_configs/relative_swap_file.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'file' must be an absolute path"));
}

#[test]
fn test_whitespace_swap_file() {
    swapplan_command(&["-C", "./tests/invalid_configs/whitespace_swap_file.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'file' cannot contain whitespace"));
}

#[test]
fn test_large_swappiness() {
    swapplan_command(&["-C", "./tests/invalid_configs/large_swappiness.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'swappiness' must be between 0 and 100"));
}

#[test]
fn test_small_min_size() {
    swapplan_command(&["-C", "./tests/invalid_configs/small_min_size.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'min_size_mb' cannot be below 128"));
}
