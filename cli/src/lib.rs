//! # Tawa Library
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! Shared implementation behind the two tawa binaries:
//!
//! - `tawa-cli` (host side): builds runtime environment images and runs
//!   commands in them (`commands`).
//! - `tawa-inner-cli` (container side): runs one developer tool per command
//!   (`tools`).
//!
//! Both sides are generated from the single command table in `link`, so an
//! option added there exists on both.
//!
pub mod commands;
pub mod common;
pub mod core;
pub mod link;
pub mod tools;
