//! # Tawa Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces used by every command in both binaries.
//!
//! ## Architecture
//!
//! - `config`: layered `.tawa.toml` settings (loading, merging, validation)
//! - `context`: the per-invocation `CommandContext` handed to handlers
//! - `environments`: the runtime environment table and Dockerfile resolution
//! - `error`: `TawaError` and the crate-wide `Result` alias
//! - `logging`: `tracing` subscriber setup keyed off `-v`
//!
//! ## Usage
//!
//! ```rust
//! use tawa::core::config; // For loading settings
//! use tawa::core::error::{Result, TawaError}; // For error handling
//! use tawa::core::environments::{resolve_dockerfile, DockerfileRole};
//! ```
//!
pub mod config;
pub mod context;
pub mod environments;
pub mod error;
pub mod logging;
