//! # Tawa System Utilities (`common::system`)
//!
//! File: cli/src/common/system/mod.rs
//!
//! ## Overview
//!
//! Host-side facts the outer CLI forwards into builds and containers:
//!
//! - **Host identity**: the uid/gid containers run as, so files created in
//!   the mounted project stay owned by the user.
//! - **Credentials**: AWS variables forwarded to `exec` containers and the
//!   Artifactory variables forwarded to builds as secrets.
//! - **Repository name**: the image tag prefix, taken from settings, the git
//!   `origin` remote, or the project directory name.
//!
//! Environment reads go through an `EnvLookup` function so callers can
//! substitute a fixed environment in tests.
//!
use crate::core::config::Settings;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Reads one environment variable.
pub type EnvLookup = fn(&str) -> Option<String>;

/// `EnvLookup` over the real process environment.
pub fn host_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// AWS variables forwarded to `exec` containers. Unset ones are forwarded empty.
pub const AWS_CREDENTIAL_VARS: [&str; 4] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_DEFAULT_REGION",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
];

/// Variables forwarded to image builds as `--secret id=NAME,env=NAME`.
pub const ARTIFACTORY_CREDENTIAL_VARS: [&str; 2] = ["ARTIFACTORY_USER", "ARTIFACTORY_TOKEN"];

/// Collects the AWS credential variables, defaulting unset ones to "".
pub fn aws_credentials(lookup: EnvLookup) -> BTreeMap<String, String> {
    AWS_CREDENTIAL_VARS
        .iter()
        .map(|name| (name.to_string(), lookup(name).unwrap_or_default()))
        .collect()
}

/// uid/gid mapping for `docker run -u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl Default for HostIdentity {
    fn default() -> Self {
        Self { uid: 1000, gid: 1000 }
    }
}

impl HostIdentity {
    /// The identity of the current process.
    #[cfg(unix)]
    pub fn current() -> Self {
        // SAFETY: getuid/getgid have no preconditions and cannot fail.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self { uid, gid }
    }

    /// Off Unix there is no host uid to map; use the conventional first user.
    #[cfg(not(unix))]
    pub fn current() -> Self {
        Self::default()
    }
}

/// Last path segment of a git remote URL without `.git`, lower-cased.
///
/// Handles `https://host/org/name.git`, `git@host:org/name.git` and bare
/// `git@host:name`.
pub fn repository_stem(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let stem = last.strip_suffix(".git").unwrap_or(last);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_lowercase())
    }
}

/// URL of the `origin` remote of the repository containing `project_dir`.
async fn origin_url(project_dir: &Path) -> Option<String> {
    let output = tokio::process::Command::new("git")
        .args(["config", "--get", "remote.origin.url"])
        .current_dir(project_dir)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!url.is_empty()).then_some(url)
}

/// # Repository Name (`repository_name`)
///
/// Picks the image tag prefix: `project.image_prefix` from settings, else the
/// stem of the git `origin` remote, else the lower-cased project directory
/// name (`project` when even that is unavailable).
pub async fn repository_name(settings: &Settings, project_dir: &Path) -> String {
    if let Some(prefix) = &settings.project.image_prefix {
        return prefix.clone();
    }
    if let Some(stem) = origin_url(project_dir).await.as_deref().and_then(repository_stem) {
        debug!("Repository name from git remote: {}", stem);
        return stem;
    }
    let fallback = project_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "project".to_string());
    debug!("Repository name from directory: {}", fallback);
    fallback
}
