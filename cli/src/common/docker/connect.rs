//! # Tawa Docker Connection Helper
//!
//! File: cli/src/common/docker/connect.rs
//!
//! ## Overview
//!
//! Builds and runs go through the `docker` CLI, but the image existence check
//! used by `--build-policy missing` talks to the Docker Engine API directly.
//! This module owns that connection: `connect_docker` opens it with
//! `bollard`'s local defaults and maps failures onto `TawaError::DockerApi`
//! with a hint about the daemon.
//!
use crate::core::error::{Result, TawaError};
use anyhow::{anyhow, Context};
use bollard::Docker;
use tracing::instrument;

/// Establishes a connection to the local Docker daemon using default settings
/// (`DOCKER_HOST`, else the platform socket or named pipe).
///
/// # Errors
///
/// Returns an `Err` wrapping `TawaError::DockerApi` if the connection fails.
#[instrument]
pub async fn connect_docker() -> Result<Docker> {
    Docker::connect_with_local_defaults()
        .map_err(|e| anyhow!(TawaError::DockerApi { source: e }))
        .context("Failed to connect to Docker daemon. Is it running and accessible?")
}
