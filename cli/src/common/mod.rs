//! # Tawa Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared utilities used by the command handlers of both binaries, kept apart
//! from command-specific logic (`commands::`, `tools::`) and core
//! infrastructure (`core::`).
//!
//! - **`docker`**: image builds, container runs and the daemon connection.
//! - **`process`**: the `ProcessRunner` seam every subprocess goes through.
//! - **`system`**: host identity, credential variables, repository naming.
//! - **`ui`**: colored status lines and command echo.
//!

/// Image builds, container runs and the daemon connection.
pub mod docker;
/// External process execution behind the `ProcessRunner` trait.
pub mod process;
/// Host identity, credentials and repository naming.
pub mod system;
/// Terminal status lines.
pub mod ui;
