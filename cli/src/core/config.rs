//! # Tawa Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! Loads, merges and validates the settings used by `tawa-cli`. Every value
//! has a built-in default, so a project with no settings files behaves exactly
//! like the stock tool: images are tagged `latest`, the runtime environment
//! table lives in `runtime_environments/`, the project is mounted under
//! `/opt/<dir>` and containers start `tawa-inner-cli`.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.tawa.toml` in the project directory or its ancestors
//!    (the search stops at the first directory containing `.git`)
//! 2. User-specific `config.toml` in the platform config directory
//! 3. Default values defined in the code
//!
//! After merging, `~` in `environments_dir` is expanded and the result is
//! validated. Unknown keys are rejected at parse time.
//!
//! ## Examples
//!
//! ```toml
//! # .tawa.toml
//! [project]
//! image_prefix = "vision"
//! default_runtime_environment = "cuda12"
//!
//! [container]
//! image_version = "dev"
//! env_vars = { PYTHONDONTWRITEBYTECODE = "1" }
//! ```
//!
//! Settings are read fresh on every invocation and never cached.
//!
use crate::core::error::{Result, TawaError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Merged settings for one invocation.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub project: ProjectSettings,
    #[serde(default)]
    pub container: ContainerSettings,
}

/// `[project]`: how the project's images and inner CLI are named and found.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSettings {
    /// Overrides the repository name used as the image tag prefix.
    #[serde(default)]
    pub image_prefix: Option<String>,
    /// Runtime environment used when `--runtime-environment` is not given.
    #[serde(default = "default_runtime_environment")]
    pub default_runtime_environment: String,
    /// Program the container runs for linked commands.
    #[serde(default = "default_inner_cli")]
    pub inner_cli: String,
    /// Directory holding `environments.yml` (can use ~, relative to the project).
    #[serde(default = "default_environments_dir")]
    pub environments_dir: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            image_prefix: None,
            default_runtime_environment: default_runtime_environment(),
            inner_cli: default_inner_cli(),
            environments_dir: default_environments_dir(),
        }
    }
}

/// `[container]`: how the project image is run.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerSettings {
    /// Absolute path the project directory is mounted under.
    #[serde(default = "default_mount_root")]
    pub mount_root: String,
    /// Tag applied to every built image.
    #[serde(default = "default_image_version")]
    pub image_version: String,
    /// Extra `-e KEY=VALUE` pairs passed to every run.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            mount_root: default_mount_root(),
            image_version: default_image_version(),
            env_vars: BTreeMap::new(),
        }
    }
}

fn default_runtime_environment() -> String {
    "cuda12".to_string()
}
fn default_inner_cli() -> String {
    "tawa-inner-cli".to_string()
}
fn default_environments_dir() -> String {
    "runtime_environments".to_string()
}
fn default_mount_root() -> String {
    "/opt".to_string()
}
fn default_image_version() -> String {
    "latest".to_string()
}

const PROJECT_CONFIG_FILENAME: &str = ".tawa.toml";

impl Settings {
    /// The runtime environment table directory, resolved against `project_dir`
    /// when relative.
    pub fn environments_dir(&self, project_dir: &Path) -> PathBuf {
        let dir = Path::new(&self.project.environments_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            project_dir.join(dir)
        }
    }
}

/// # Load Configuration (`load_config`)
///
/// Loads user and project settings, merges them over the defaults, expands
/// paths and validates the result.
///
/// ## Arguments
///
/// * `project_dir` - Directory the project search starts from (normally the working directory).
///
/// ## Returns
///
/// * `Result<Settings>` - The merged settings, or a `TawaError::Configuration` wrapped with context.
pub fn load_config(project_dir: &Path) -> Result<Settings> {
    let user_config = load_user_config()?;
    let project_config = load_project_config(project_dir)?;
    let mut merged = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged).context("Failed to expand paths in configuration")?;
    validate_config(&merged).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged);
    Ok(merged)
}

fn load_user_config() -> Result<Option<Settings>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "Tawa", "tawa") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config(project_dir: &Path) -> Result<Option<Settings>> {
    if let Some(path) = find_project_config_path(project_dir) {
        info!("Loading project configuration from: {}", path.display());
        load_config_from_path(&path).map(Some)
    } else {
        debug!("No project configuration file (.tawa.toml) found in project directory or ancestors.");
        Ok(None)
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content).map_err(|e| {
        anyhow!(TawaError::Configuration(format!(
            "Failed to parse TOML from file {}: {}",
            path.display(),
            e
        )))
    })
}

/// Project values win wherever they differ from the built-in default.
fn merge_configs(user: Settings, project: Option<Settings>) -> Settings {
    let project = match project {
        Some(p) => p,
        None => return user,
    };
    let pick = |project_value: String, user_value: String, default: String| {
        if project_value != default {
            project_value
        } else {
            user_value
        }
    };

    let mut env_vars = user.container.env_vars;
    env_vars.extend(project.container.env_vars);

    Settings {
        project: ProjectSettings {
            image_prefix: project.project.image_prefix.or(user.project.image_prefix),
            default_runtime_environment: pick(
                project.project.default_runtime_environment,
                user.project.default_runtime_environment,
                default_runtime_environment(),
            ),
            inner_cli: pick(
                project.project.inner_cli,
                user.project.inner_cli,
                default_inner_cli(),
            ),
            environments_dir: pick(
                project.project.environments_dir,
                user.project.environments_dir,
                default_environments_dir(),
            ),
        },
        container: ContainerSettings {
            mount_root: pick(
                project.container.mount_root,
                user.container.mount_root,
                default_mount_root(),
            ),
            image_version: pick(
                project.container.image_version,
                user.container.image_version,
                default_image_version(),
            ),
            env_vars,
        },
    }
}

fn expand_config_paths(config: &mut Settings) -> Result<()> {
    config.project.environments_dir =
        shellexpand::tilde(&config.project.environments_dir).into_owned();
    debug!(
        "Expanded environments directory: {}",
        config.project.environments_dir
    );
    Ok(())
}

fn validate_config(config: &Settings) -> Result<()> {
    let invalid = |msg: String| Err(anyhow!(TawaError::Configuration(msg)));

    if config.project.inner_cli.trim().is_empty() {
        return invalid("project.inner_cli cannot be empty.".to_string());
    }
    if config.project.default_runtime_environment.trim().is_empty() {
        return invalid("project.default_runtime_environment cannot be empty.".to_string());
    }
    if let Some(prefix) = &config.project.image_prefix {
        if prefix.trim().is_empty() {
            return invalid("project.image_prefix cannot be empty when set.".to_string());
        }
    }
    // Container paths are POSIX regardless of the host platform.
    if !config.container.mount_root.starts_with('/') {
        return invalid(format!(
            "container.mount_root must be an absolute path, got '{}'.",
            config.container.mount_root
        ));
    }
    if config.container.image_version.trim().is_empty() {
        return invalid("container.image_version cannot be empty.".to_string());
    }
    for key in config.container.env_vars.keys() {
        if key.is_empty() || key.contains('=') {
            return invalid(format!("Invalid container.env_vars key: '{}'.", key));
        }
    }
    Ok(())
}
