//! # Command Context
//!
//! File: cli/src/core/context.rs
//!
//! ## Overview
//!
//! Everything an outer command handler needs besides its own arguments,
//! gathered once per invocation and passed down explicitly: the merged
//! settings, the project directory that is mounted and used as the build
//! context, the image repository name, the host user mapping, the process
//! runner and the environment lookup used for credential forwarding.
//!
//! Handlers never read process-wide state directly, which keeps them
//! testable with a recording runner and a fixed environment.
//!
use crate::{
    common::{
        process::ProcessRunner,
        system::{self, EnvLookup, HostIdentity},
    },
    core::{
        config::{self, Settings},
        environments::{resolve_dockerfile, DockerfileRole},
        error::Result,
    },
};
use anyhow::Context;
use std::path::PathBuf;
use tracing::debug;

/// Per-invocation state shared by the outer command handlers.
pub struct CommandContext<'a> {
    pub settings: Settings,
    /// Working directory: mount source and `docker build` context.
    pub project_dir: PathBuf,
    /// Prefix for image tags (`<repository>-<env>`).
    pub repository: String,
    pub identity: HostIdentity,
    pub runner: &'a dyn ProcessRunner,
    pub env: EnvLookup,
}

impl<'a> CommandContext<'a> {
    /// Builds the context for the current working directory, loading settings
    /// and discovering the repository name.
    pub async fn discover(runner: &'a dyn ProcessRunner) -> Result<Self> {
        let project_dir =
            std::env::current_dir().context("Failed to determine the current directory")?;
        let settings = config::load_config(&project_dir).context("Failed to load tawa configuration")?;
        let repository = system::repository_name(&settings, &project_dir).await;
        debug!(
            "Project directory {} (repository '{}')",
            project_dir.display(),
            repository
        );
        Ok(Self {
            settings,
            project_dir,
            repository,
            identity: HostIdentity::current(),
            runner,
            env: system::host_env,
        })
    }

    /// The runtime environment to use when the user did not name one.
    pub fn runtime_environment(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .unwrap_or_else(|| self.settings.project.default_runtime_environment.clone())
    }

    /// Resolves the Dockerfile for `environment` using the configured table location.
    pub fn dockerfile(&self, environment: &str, role: DockerfileRole) -> Result<PathBuf> {
        let environments_dir = self.settings.environments_dir(&self.project_dir);
        resolve_dockerfile(&self.project_dir, &environments_dir, environment, role)
    }
}
