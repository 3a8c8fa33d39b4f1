//! # Tawa Image Builder
//!
//! File: cli/src/common/docker/build.rs
//!
//! ## Overview
//!
//! Turns a `BuildRequest` into exactly one `docker build` subprocess. The
//! argument vector is assembled in a fixed order:
//!
//! ```text
//! docker [buildx] build -t <image> --network=host [--cache-from <ref>]
//!        [--progress <mode>] [--build-arg K=V]... [--secret id=N,env=N]...
//!        -f <dockerfile> .
//! ```
//!
//! Build arguments are kept in a `BTreeMap`, so identical requests always
//! produce identical argument vectors.
//!
//! ## Credential forwarding
//!
//! When `forward_credentials` is set, each of `ARTIFACTORY_USER` and
//! `ARTIFACTORY_TOKEN` that is set to a non-empty value is passed as a build
//! secret (never as a build argument, which would be recorded in the image
//! history). Missing ones are logged as warnings and the build proceeds.
//!
use crate::{
    common::{
        process::Invocation,
        system::{EnvLookup, ARTIFACTORY_CREDENTIAL_VARS},
    },
    core::{
        context::CommandContext,
        error::{Result, TawaError},
    },
};
use anyhow::{anyhow, Context};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Options shared by every command that may build an image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Build through `docker buildx build`.
    pub buildx: bool,
    /// Discard the build's stdout.
    pub quiet: bool,
    /// Passed through as `--progress`.
    pub progress: Option<String>,
}

/// One image build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub image: String,
    /// Relative to the build context (the project directory).
    pub dockerfile: PathBuf,
    pub build_args: BTreeMap<String, String>,
    pub cache_from: Option<String>,
    pub forward_credentials: bool,
    pub builder: BuilderOptions,
}

impl BuildRequest {
    pub fn new(image: impl Into<String>, dockerfile: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            dockerfile: dockerfile.into(),
            build_args: BTreeMap::new(),
            cache_from: None,
            forward_credentials: true,
            builder: BuilderOptions::default(),
        }
    }
}

/// The assembled `docker build` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Arguments after `docker`.
    pub args: Vec<String>,
    /// Credential variables that were requested but not set.
    pub missing_credentials: Vec<&'static str>,
    pub quiet: bool,
}

/// # Plan Build (`plan_build`)
///
/// Assembles the `docker build` arguments for `request`, reading credential
/// variables through `lookup`. Pure: nothing is executed.
pub fn plan_build(request: &BuildRequest, lookup: EnvLookup) -> BuildPlan {
    let mut args = Vec::new();
    if request.builder.buildx {
        args.push("buildx".to_string());
    }
    args.extend([
        "build".to_string(),
        "-t".to_string(),
        request.image.clone(),
        "--network=host".to_string(),
    ]);
    if let Some(cache) = &request.cache_from {
        args.extend(["--cache-from".to_string(), cache.clone()]);
    }
    if let Some(progress) = &request.builder.progress {
        args.extend(["--progress".to_string(), progress.clone()]);
    }
    for (key, value) in &request.build_args {
        args.extend(["--build-arg".to_string(), format!("{}={}", key, value)]);
    }

    let mut missing_credentials = Vec::new();
    if request.forward_credentials {
        for name in ARTIFACTORY_CREDENTIAL_VARS {
            match lookup(name) {
                Some(value) if !value.is_empty() => {
                    args.extend(["--secret".to_string(), format!("id={},env={}", name, name)]);
                }
                _ => missing_credentials.push(name),
            }
        }
    }

    args.extend([
        "-f".to_string(),
        request.dockerfile.to_string_lossy().into_owned(),
        ".".to_string(),
    ]);

    BuildPlan {
        args,
        missing_credentials,
        quiet: request.builder.quiet,
    }
}

impl BuildPlan {
    pub fn invocation(&self, context_dir: PathBuf) -> Invocation {
        Invocation {
            program: "docker".to_string(),
            args: self.args.clone(),
            envs: BTreeMap::new(),
            cwd: Some(context_dir),
            quiet: self.quiet,
        }
    }
}

/// # Build Image (`build_image`)
///
/// Plans and runs one `docker build` in the project directory.
///
/// ## Returns
///
/// * `Result<()>` - `Ok` when the build exits 0; otherwise `TawaError::Build`.
#[instrument(skip(ctx, request), fields(image = %request.image))]
pub async fn build_image(ctx: &CommandContext<'_>, request: &BuildRequest) -> Result<()> {
    let plan = plan_build(request, ctx.env);
    for name in &plan.missing_credentials {
        warn!("Environment variable {} needed for docker build is not set.", name);
    }

    info!(
        "Building image {} from {}",
        request.image,
        request.dockerfile.display()
    );
    let invocation = plan.invocation(ctx.project_dir.clone());
    let code = ctx
        .runner
        .run(&invocation)
        .await
        .context("Failed to run docker build")?;

    if code != 0 {
        return Err(anyhow!(TawaError::Build {
            image: request.image.clone(),
            code,
        }));
    }
    info!("Built image {}", request.image);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::RecordingRunner;
    use crate::core::context::tests::{no_env, test_context};
    use std::path::Path;

    fn both_creds(name: &str) -> Option<String> {
        Some(format!("{}-value", name))
    }

    fn token_only(name: &str) -> Option<String> {
        (name == "ARTIFACTORY_TOKEN").then(|| "t0k3n".to_string())
    }

    #[test]
    fn test_plan_default_build() {
        let request = BuildRequest::new(
            "proj-cuda12:latest",
            "runtime_environments/cuda12/Dockerfile.project",
        );
        let plan = plan_build(&request, no_env);
        assert_eq!(
            plan.args,
            vec![
                "build",
                "-t",
                "proj-cuda12:latest",
                "--network=host",
                "-f",
                "runtime_environments/cuda12/Dockerfile.project",
                ".",
            ]
        );
        assert_eq!(plan.missing_credentials, ARTIFACTORY_CREDENTIAL_VARS.to_vec());
    }

    #[test]
    fn test_plan_full_argument_order() {
        let mut request = BuildRequest::new("img:1", "Dockerfile");
        request.build_args.insert("PY".into(), "3.11".into());
        request.build_args.insert("CUDA".into(), "12".into());
        request.cache_from = Some("registry/img:cache".into());
        request.builder = BuilderOptions {
            buildx: true,
            quiet: true,
            progress: Some("plain".into()),
        };

        let plan = plan_build(&request, both_creds);
        assert_eq!(
            plan.args,
            vec![
                "buildx",
                "build",
                "-t",
                "img:1",
                "--network=host",
                "--cache-from",
                "registry/img:cache",
                "--progress",
                "plain",
                "--build-arg",
                "CUDA=12",
                "--build-arg",
                "PY=3.11",
                "--secret",
                "id=ARTIFACTORY_USER,env=ARTIFACTORY_USER",
                "--secret",
                "id=ARTIFACTORY_TOKEN,env=ARTIFACTORY_TOKEN",
                "-f",
                "Dockerfile",
                ".",
            ]
        );
        assert!(plan.missing_credentials.is_empty());
        assert!(plan.quiet);
    }

    #[test]
    fn test_credentials_never_become_build_args() {
        let plan = plan_build(&BuildRequest::new("img", "Dockerfile"), both_creds);
        assert!(!plan.args.iter().any(|a| a.contains("-value")));
    }

    #[test]
    fn test_partial_credentials() {
        let plan = plan_build(&BuildRequest::new("img", "Dockerfile"), token_only);
        assert_eq!(plan.missing_credentials, vec!["ARTIFACTORY_USER"]);
        assert!(plan
            .args
            .contains(&"id=ARTIFACTORY_TOKEN,env=ARTIFACTORY_TOKEN".to_string()));
    }

    #[test]
    fn test_forwarding_disabled_checks_nothing() {
        let mut request = BuildRequest::new("img", "Dockerfile");
        request.forward_credentials = false;
        let plan = plan_build(&request, both_creds);
        assert!(plan.missing_credentials.is_empty());
        assert!(!plan.args.contains(&"--secret".to_string()));
    }

    #[tokio::test]
    async fn test_identical_requests_build_identically() {
        let runner = RecordingRunner::new();
        let ctx = test_context(Path::new("/work/proj"), &runner, no_env);
        let mut request = BuildRequest::new("proj-cpu:latest", "runtime_environments/cpu/Dockerfile");
        request.build_args.insert("B".into(), "2".into());
        request.build_args.insert("A".into(), "1".into());

        build_image(&ctx, &request).await.unwrap();
        build_image(&ctx, &request.clone()).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/work/proj")));
    }

    #[tokio::test]
    async fn test_missing_credentials_still_build() {
        let runner = RecordingRunner::new();
        let ctx = test_context(Path::new("/work/proj"), &runner, no_env);
        let request = BuildRequest::new("proj-cpu:latest", "Dockerfile");

        assert!(build_image(&ctx, &request).await.is_ok());
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.calls()[0].program, "docker");
    }

    #[tokio::test]
    async fn test_failed_build_is_build_error() {
        let runner = RecordingRunner::with_codes([1]);
        let ctx = test_context(Path::new("/work/proj"), &runner, no_env);
        let err = build_image(&ctx, &BuildRequest::new("img", "Dockerfile"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TawaError>(),
            Some(TawaError::Build { code: 1, .. })
        ));
    }
}
