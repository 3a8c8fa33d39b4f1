//! # Tawa Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test crates (`outer.rs`, `inner.rs`).
//! Each `.rs` file in `cli/tests/` is compiled as its own test crate and
//! drives the compiled binaries through `assert_cmd`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

/// # Get Outer Command (`tawa_cmd`)
///
/// An `assert_cmd::Command` for the compiled `tawa-cli` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn tawa_cmd() -> Command {
    Command::cargo_bin("tawa-cli").expect("Failed to find tawa-cli binary for testing")
}

/// # Get Inner Command (`inner_cmd`)
///
/// An `assert_cmd::Command` for the compiled `tawa-inner-cli` binary.
pub fn inner_cmd() -> Command {
    Command::cargo_bin("tawa-inner-cli").expect("Failed to find tawa-inner-cli binary for testing")
}

/// A throwaway repository root: a directory holding an empty `.git`, so
/// configuration lookup stops there.
pub fn temp_repository() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir(dir.path().join(".git")).expect("Failed to create .git");
    dir
}
