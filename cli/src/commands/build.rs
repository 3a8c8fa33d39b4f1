//! # Tawa Build Handlers
//!
//! File: cli/src/commands/build.rs
//!
//! ## Overview
//!
//! Implements `tawa-cli build` and `tawa-cli build-base`. Both resolve the
//! runtime environment's Dockerfile for their role and run one `docker build`
//! in the project directory:
//!
//! | command      | Dockerfile role | image tag                              |
//! |--------------|-----------------|----------------------------------------|
//! | `build`      | `project`       | `<repository>-<env>:<version>`         |
//! | `build-base` | `base`          | `<repository>-<env>-base:<version>`    |
//!
//! ## Usage
//!
//! ```bash
//! # Build the project image for the default runtime environment
//! tawa-cli build
//!
//! # Build the cpu base image with an extra build argument through buildx
//! tawa-cli build-base -e cpu -a PYTHON_VERSION 3.11 --build-buildx
//! ```
//!
use crate::{
    commands::args::BuildFlags,
    common::{
        docker::{build_image, images::image_for_role, BuildRequest},
        ui,
    },
    core::{context::CommandContext, environments::DockerfileRole, error::Result},
};
use anyhow::Context;
use clap::{ArgAction, Args};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// # Build Arguments (`BuildArgs`)
///
/// Shared by `build` and `build-base`.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Runtime environment to build (defaults to the configured one)
    #[arg(long, short = 'e')]
    pub runtime_environment: Option<String>,

    /// Extra `--build-arg KEY=VALUE` for docker build; repeatable
    #[arg(
        long = "additional-docker-build-arg",
        short = 'a',
        num_args = 2,
        value_names = ["KEY", "VALUE"],
        action = ArgAction::Append
    )]
    pub additional_docker_build_args: Vec<String>,

    /// Image to use as a cache source
    #[arg(long, value_name = "IMAGE")]
    pub cache_from: Option<String>,

    #[command(flatten)]
    pub builder: BuildFlags,

    /// Do not pass ARTIFACTORY_USER/ARTIFACTORY_TOKEN as build secrets
    #[arg(long, hide = true)]
    pub no_forward_artifactory_creds: bool,
}

impl BuildArgs {
    /// Pairs up the flattened `-a KEY VALUE` values. A later key replaces an earlier one.
    pub fn build_args(&self) -> BTreeMap<String, String> {
        self.additional_docker_build_args
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }
}

/// # Handle Build (`handle_build`)
///
/// Builds the image with the given Dockerfile role.
///
/// ## Returns
///
/// * `Result<()>` - `Ok` once the image is built. Resolution failures are
///   `TawaError::Configuration`; a non-zero `docker build` is `TawaError::Build`.
pub async fn handle_build(
    args: BuildArgs,
    role: DockerfileRole,
    ctx: &CommandContext<'_>,
) -> Result<()> {
    debug!("Build args: {:?}", args);
    let environment = ctx.runtime_environment(args.runtime_environment.as_deref());
    info!("Using {} runtime environment", environment);

    let dockerfile = ctx
        .dockerfile(&environment, role)
        .with_context(|| format!("Cannot build the {} image for '{}'", role, environment))?;
    let image = image_for_role(
        role,
        &ctx.repository,
        &environment,
        &ctx.settings.container.image_version,
    );

    let request = BuildRequest {
        image: image.clone(),
        dockerfile,
        build_args: args.build_args(),
        cache_from: args.cache_from.clone(),
        forward_credentials: !args.no_forward_artifactory_creds,
        builder: args.builder.builder_options(),
    };
    build_image(ctx, &request).await?;

    ui::success(&format!("Built {}", image));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::RecordingRunner;
    use crate::core::context::tests::{no_env, test_context};
    use crate::core::environments::tests::fixture_project;
    use crate::core::error::TawaError;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: BuildArgs,
    }

    fn parse(argv: &[&str]) -> BuildArgs {
        Harness::try_parse_from(std::iter::once("build").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[tokio::test]
    async fn test_build_cuda12_project_image() {
        let project = fixture_project();
        let runner = RecordingRunner::new();
        let ctx = test_context(project.path(), &runner, no_env);

        handle_build(parse(&[]), DockerfileRole::Project, &ctx)
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].argv(),
            vec![
                "docker",
                "build",
                "-t",
                "proj-cuda12:latest",
                "--network=host",
                "-f",
                "runtime_environments/cuda12/Dockerfile.project",
                ".",
            ]
        );
        assert_eq!(calls[0].cwd.as_deref(), Some(project.path()));
    }

    #[tokio::test]
    async fn test_build_base_with_options() {
        let project = fixture_project();
        let runner = RecordingRunner::new();
        let ctx = test_context(project.path(), &runner, no_env);
        let args = parse(&[
            "-e",
            "cuda12",
            "-a",
            "PY",
            "3.11",
            "--additional-docker-build-arg",
            "CUDA",
            "12.4",
            "--cache-from",
            "registry/proj:cache",
            "--no-forward-artifactory-creds",
        ]);

        handle_build(args, DockerfileRole::Base, &ctx).await.unwrap();

        let argv = runner.calls()[0].args.clone();
        assert_eq!(argv[2], "proj-cuda12-base:latest");
        assert!(argv.windows(2).any(|w| w == &["--build-arg", "CUDA=12.4"]));
        assert!(argv.windows(2).any(|w| w == &["--build-arg", "PY=3.11"]));
        assert!(argv.windows(2).any(|w| w == &["--cache-from", "registry/proj:cache"]));
        assert!(argv.contains(&"runtime_environments/cuda12/Dockerfile.base".to_string()));
    }

    #[tokio::test]
    async fn test_missing_role_fails_without_subprocess() {
        let project = fixture_project();
        let runner = RecordingRunner::new();
        let ctx = test_context(project.path(), &runner, no_env);

        let err = handle_build(parse(&["-e", "cpu"]), DockerfileRole::Base, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TawaError>(),
            Some(TawaError::Configuration(_))
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_build_arg_needs_key_and_value() {
        let result = Harness::try_parse_from(["build", "-a", "ONLY_KEY"]);
        assert!(result.is_err());
    }
}
