//! # Tawa Docker Module Interface
//!
//! File: cli/src/common/docker/mod.rs
//!
//! ## Overview
//!
//! Everything tawa does with Docker. Builds and runs shell out to the `docker`
//! CLI (so BuildKit secrets, buildx and interactive TTYs behave exactly as they
//! do for a user typing the command); the daemon API is used only to check
//! whether an image already exists.
//!
//! ## Architecture
//!
//! - **`connect`**: opens the `bollard` connection to the daemon.
//! - **`images`**: image tag naming and the existence check.
//! - **`build`**: `docker build` assembly and execution, credential forwarding.
//! - **`run`**: `docker run` assembly, build policy and execution.
//!

/// Handles establishing a connection to the local Docker daemon.
pub mod connect;
/// Image tag naming and existence checks.
pub mod images;
/// Assembles and runs `docker build`.
pub mod build;
/// Assembles and runs `docker run`.
pub mod run;

pub use build::{build_image, BuildRequest, BuilderOptions};
pub use run::{run_in_environment, BuildPolicy, RunOptions};
