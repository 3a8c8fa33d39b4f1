//! # Runtime Environment Resolver
//!
//! File: cli/src/core/environments.rs
//!
//! ## Overview
//!
//! Maps a runtime environment name (`cuda12`, `cpu`, ...) and a Dockerfile
//! role (`base` or `project`) to the Dockerfile that builds it. The mapping is
//! kept in `<environments_dir>/environments.yml`:
//!
//! ```yaml
//! environments:
//!   cuda12:
//!     base: Dockerfile.base
//!     project: Dockerfile.project
//! ```
//!
//! and the Dockerfiles themselves live in `<environments_dir>/<name>/`.
//!
//! The table is read on every resolution. A missing file, a malformed file,
//! an unknown environment, a missing role and a Dockerfile that does not exist
//! on disk are all reported as `TawaError::Configuration`.
//!
use crate::core::error::{Result, TawaError};
use anyhow::anyhow;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the runtime environment table inside the environments directory.
pub const ENVIRONMENTS_FILE: &str = "environments.yml";

/// Parsed `environments.yml`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvironmentsFile {
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentEntry>,
}

/// Dockerfile names for one runtime environment. Either role may be absent.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvironmentEntry {
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

/// Which of an environment's two Dockerfiles to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerfileRole {
    /// Shared system layer (`build-base`).
    Base,
    /// Project layer built on top of the base (`build` and every run).
    Project,
}

impl DockerfileRole {
    /// The key naming this role in `environments.yml`.
    pub fn key(self) -> &'static str {
        match self {
            DockerfileRole::Base => "base",
            DockerfileRole::Project => "project",
        }
    }
}

impl fmt::Display for DockerfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl EnvironmentsFile {
    /// Declared environment names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.environments.keys().map(String::as_str).collect()
    }
}

impl EnvironmentEntry {
    fn file_for(&self, role: DockerfileRole) -> Option<&str> {
        match role {
            DockerfileRole::Base => self.base.as_deref(),
            DockerfileRole::Project => self.project.as_deref(),
        }
    }
}

fn config_error(message: String) -> anyhow::Error {
    anyhow!(TawaError::Configuration(message))
}

/// Reads and parses `<environments_dir>/environments.yml`.
///
/// `environments_dir` may be absolute or relative to `project_dir`.
pub fn load_environments(project_dir: &Path, environments_dir: &Path) -> Result<EnvironmentsFile> {
    let path = project_dir.join(environments_dir).join(ENVIRONMENTS_FILE);
    debug!("Reading runtime environments from {}", path.display());
    let content = fs::read_to_string(&path).map_err(|e| {
        config_error(format!(
            "Could not read runtime environment table {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_yaml::from_str(&content).map_err(|e| {
        config_error(format!(
            "Could not parse runtime environment table {}: {}",
            path.display(),
            e
        ))
    })
}

/// # Resolve Dockerfile (`resolve_dockerfile`)
///
/// Looks up the Dockerfile for `environment` and `role`.
///
/// ## Arguments
///
/// * `project_dir` - The build context directory.
/// * `environments_dir` - Directory holding `environments.yml`, absolute or relative to `project_dir`.
/// * `environment` - Runtime environment name.
/// * `role` - Base or project Dockerfile.
///
/// ## Returns
///
/// * `Result<PathBuf>` - `<environments_dir>/<environment>/<file>`, relative to
///   `project_dir` whenever possible so it can be passed to `docker build -f`
///   with `.` as the context.
pub fn resolve_dockerfile(
    project_dir: &Path,
    environments_dir: &Path,
    environment: &str,
    role: DockerfileRole,
) -> Result<PathBuf> {
    let table = load_environments(project_dir, environments_dir)?;

    let entry = table.environments.get(environment).ok_or_else(|| {
        let known = table.names();
        config_error(format!(
            "Runtime environment '{}' is not defined in {}. Known environments: [{}]",
            environment,
            environments_dir.join(ENVIRONMENTS_FILE).display(),
            known.join(", ")
        ))
    })?;

    let file = entry.file_for(role).ok_or_else(|| {
        config_error(format!(
            "Runtime environment '{}' has no '{}' Dockerfile configured.",
            environment, role
        ))
    })?;

    let dockerfile = environments_dir.join(environment).join(file);
    let on_disk = project_dir.join(&dockerfile);
    if !on_disk.is_file() {
        return Err(config_error(format!(
            "Dockerfile for runtime environment '{}' ({}) not found at {}",
            environment,
            role,
            on_disk.display()
        )));
    }

    let relative = match dockerfile.strip_prefix(project_dir) {
        Ok(stripped) => stripped.to_path_buf(),
        Err(_) => dockerfile,
    };
    debug!(
        "Resolved {} Dockerfile for '{}': {}",
        role,
        environment,
        relative.display()
    );
    Ok(relative)
}
