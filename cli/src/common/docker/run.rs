//! # Tawa Run-Invocation Assembler
//!
//! File: cli/src/common/docker/run.rs
//!
//! ## Overview
//!
//! Runs a command inside a runtime environment's project image. The working
//! directory is bind-mounted at `<mount_root>/<dir name>` and the container is
//! removed when it exits:
//!
//! ```text
//! docker run --rm --mount type=bind,source=<cwd>,target=<mount_root>/<dir>[,readonly]
//!            [-u uid:gid] [-e K=V]... [--gpus all] [-it] <image> <entrypoint...>
//! ```
//!
//! ## Architecture
//!
//! - `RunOptions` carries the per-run choices (mount access, user mapping,
//!   GPUs, environment, build policy).
//! - `ContainerInvocationPlan::assemble` combines them with the context into
//!   the exact `docker run` invocation. It is pure and unit tested.
//! - `run_in_environment` builds the image according to the `BuildPolicy`,
//!   echoes the command and runs it, returning the container's exit code.
//!
use crate::{
    common::{
        docker::{
            build::{build_image, BuildRequest, BuilderOptions},
            images::{image_exists, project_image},
        },
        process::Invocation,
        ui,
    },
    core::{context::CommandContext, environments::DockerfileRole, error::Result},
};
use anyhow::Context;
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// When to build the project image before running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BuildPolicy {
    /// Rebuild before every run (layer caching keeps this cheap).
    #[default]
    Always,
    /// Build only if the image is not present locally.
    Missing,
    /// Never build; the image must already exist.
    Never,
}

/// Per-run choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub read_write: bool,
    /// Run as the image's default user instead of mapping the host user.
    pub root: bool,
    pub interactive: bool,
    pub gpus: bool,
    pub env_vars: BTreeMap<String, String>,
    pub user_id: u32,
    pub user_gid: u32,
    pub build: BuildPolicy,
    /// Echo the `docker run` command before running it.
    pub display_cmd: bool,
    pub builder: BuilderOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            read_write: true,
            root: false,
            interactive: false,
            gpus: false,
            env_vars: BTreeMap::new(),
            user_id: 1000,
            user_gid: 1000,
            build: BuildPolicy::Always,
            display_cmd: true,
            builder: BuilderOptions::default(),
        }
    }
}

/// The bind mount of the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    pub source: PathBuf,
    pub target: String,
    pub readonly: bool,
}

impl MountSpec {
    /// Mounts `project_dir` under `mount_root`, keeping its directory name.
    pub fn for_project(project_dir: &Path, mount_root: &str, readonly: bool) -> Self {
        let name = project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string());
        Self {
            source: project_dir.to_path_buf(),
            target: format!("{}/{}", mount_root.trim_end_matches('/'), name),
            readonly,
        }
    }

    /// The `--mount` value. Docker reads it as one CSV record, so fields
    /// holding `,` or `"` are quoted.
    pub fn to_arg(&self) -> String {
        let mut fields = vec![
            "type=bind".to_string(),
            csv_field(&format!("source={}", self.source.display())),
            csv_field(&format!("target={}", self.target)),
        ];
        if self.readonly {
            fields.push("readonly".to_string());
        }
        fields.join(",")
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// A fully assembled `docker run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInvocationPlan {
    pub image: String,
    pub mount: MountSpec,
    /// `None` when running as root.
    pub user: Option<(u32, u32)>,
    pub env: BTreeMap<String, String>,
    pub gpus: bool,
    pub interactive: bool,
    pub entrypoint: Vec<String>,
}

impl ContainerInvocationPlan {
    /// Combines the context and options into the run plan. Settings
    /// `env_vars` apply first; `options.env_vars` override them.
    pub fn assemble(
        ctx: &CommandContext<'_>,
        image: String,
        entrypoint: Vec<String>,
        options: &RunOptions,
    ) -> Self {
        let mut env = ctx.settings.container.env_vars.clone();
        env.extend(options.env_vars.clone());
        Self {
            image,
            mount: MountSpec::for_project(
                &ctx.project_dir,
                &ctx.settings.container.mount_root,
                !options.read_write,
            ),
            user: (!options.root).then_some((options.user_id, options.user_gid)),
            env,
            gpus: options.gpus,
            interactive: options.interactive,
            entrypoint,
        }
    }

    /// Arguments after `docker`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--mount".to_string(),
            self.mount.to_arg(),
        ];
        if let Some((uid, gid)) = self.user {
            args.extend(["-u".to_string(), format!("{}:{}", uid, gid)]);
        }
        for (key, value) in &self.env {
            args.extend(["-e".to_string(), format!("{}={}", key, value)]);
        }
        if self.gpus {
            args.extend(["--gpus".to_string(), "all".to_string()]);
        }
        if self.interactive {
            args.push("-it".to_string());
        }
        args.push(self.image.clone());
        args.extend(self.entrypoint.iter().cloned());
        args
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::new("docker", self.args())
    }
}

/// # Run In Environment (`run_in_environment`)
///
/// Builds the project image for `environment` as `options.build` dictates,
/// then runs `entrypoint` in it.
///
/// ## Returns
///
/// * `Result<i32>` - The container's exit code, unmodified. Configuration
///   problems and failed builds are errors.
#[instrument(skip(ctx, entrypoint, options))]
pub async fn run_in_environment(
    ctx: &CommandContext<'_>,
    environment: &str,
    entrypoint: Vec<String>,
    options: &RunOptions,
) -> Result<i32> {
    let image = project_image(
        &ctx.repository,
        environment,
        &ctx.settings.container.image_version,
    );

    let should_build = match options.build {
        BuildPolicy::Always => true,
        BuildPolicy::Missing => !image_exists(&image).await?,
        BuildPolicy::Never => false,
    };
    if should_build {
        let dockerfile = ctx.dockerfile(environment, DockerfileRole::Project)?;
        let mut request = BuildRequest::new(image.clone(), dockerfile);
        request.builder = options.builder.clone();
        build_image(ctx, &request).await?;
    } else {
        debug!("Skipping build of {} ({:?})", image, options.build);
    }

    let plan = ContainerInvocationPlan::assemble(ctx, image, entrypoint, options);
    let invocation = plan.invocation();
    if options.display_cmd {
        ui::command_echo(&invocation.command_line());
    }
    info!("Running {} in {}", plan.entrypoint.join(" "), plan.image);
    ctx.runner
        .run(&invocation)
        .await
        .context("Failed to run docker run")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::RecordingRunner;
    use crate::core::context::tests::{no_env, test_context};
    use crate::core::environments::tests::fixture_project;

    #[test]
    fn test_run_options_defaults() {
        let options = RunOptions::default();
        assert!(options.read_write);
        assert!(!options.root && !options.interactive && !options.gpus);
        assert_eq!((options.user_id, options.user_gid), (1000, 1000));
        assert_eq!(options.build, BuildPolicy::Always);
        assert!(options.display_cmd);
    }

    #[test]
    fn test_assemble_full_run() {
        let runner = RecordingRunner::new();
        let mut ctx = test_context(Path::new("/home/me/proj"), &runner, no_env);
        ctx.settings
            .container
            .env_vars
            .insert("A".into(), "settings".into());
        let options = RunOptions {
            read_write: false,
            interactive: true,
            gpus: true,
            env_vars: BTreeMap::from([("A".to_string(), "run".to_string())]),
            user_id: 501,
            user_gid: 20,
            ..Default::default()
        };

        let plan = ContainerInvocationPlan::assemble(
            &ctx,
            "proj-cuda12:latest".into(),
            vec!["tawa-inner-cli".into(), "lint".into()],
            &options,
        );
        assert_eq!(
            plan.args(),
            vec![
                "run",
                "--rm",
                "--mount",
                "type=bind,source=/home/me/proj,target=/opt/proj,readonly",
                "-u",
                "501:20",
                "-e",
                "A=run",
                "--gpus",
                "all",
                "-it",
                "proj-cuda12:latest",
                "tawa-inner-cli",
                "lint",
            ]
        );
    }

    #[test]
    fn test_root_run_omits_user_mapping() {
        let runner = RecordingRunner::new();
        let ctx = test_context(Path::new("/home/me/proj"), &runner, no_env);
        let options = RunOptions {
            root: true,
            ..Default::default()
        };
        let plan = ContainerInvocationPlan::assemble(&ctx, "img".into(), vec![], &options);
        assert!(!plan.args().contains(&"-u".to_string()));
        assert_eq!(plan.mount.to_arg(), "type=bind,source=/home/me/proj,target=/opt/proj");
    }

    #[test]
    fn test_mount_fields_with_commas_are_quoted() {
        let mount = MountSpec::for_project(Path::new("/src/a,b"), "/opt", true);
        assert_eq!(
            mount.to_arg(),
            r#"type=bind,"source=/src/a,b","target=/opt/a,b",readonly"#
        );

        let mount = MountSpec::for_project(Path::new("/src/say \"hi\""), "/opt", false);
        assert_eq!(
            mount.to_arg(),
            r#"type=bind,"source=/src/say ""hi""","target=/opt/say ""hi""""#
        );

        let mount = MountSpec::for_project(Path::new("/src/k=v"), "/opt", false);
        assert_eq!(mount.to_arg(), "type=bind,source=/src/k=v,target=/opt/k=v");
    }

    #[test]
    fn test_mount_root_trailing_slash() {
        let mount = MountSpec::for_project(Path::new("/src/app"), "/workspace/", false);
        assert_eq!(mount.target, "/workspace/app");
    }

    #[tokio::test]
    async fn test_always_builds_then_runs() {
        let project = fixture_project();
        let runner = RecordingRunner::with_codes([0, 7]);
        let ctx = test_context(project.path(), &runner, no_env);

        let code = run_in_environment(&ctx, "cuda12", vec!["mypy".into()], &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(code, 7); // Exit code passes through unmodified.

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[0], "build");
        assert!(calls[0]
            .args
            .contains(&"runtime_environments/cuda12/Dockerfile.project".to_string()));
        assert_eq!(calls[1].args[0], "run");
        assert_eq!(calls[1].args.last().map(String::as_str), Some("mypy"));
    }

    #[tokio::test]
    async fn test_never_skips_build_and_resolution() {
        // No runtime_environments/ at all: resolution would fail if attempted.
        let temp_dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let ctx = test_context(temp_dir.path(), &runner, no_env);
        let options = RunOptions {
            build: BuildPolicy::Never,
            ..Default::default()
        };
        run_in_environment(&ctx, "cuda12", vec!["true".into()], &options)
            .await
            .unwrap();
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.calls()[0].args[0], "run");
    }

    #[tokio::test]
    async fn test_failed_build_prevents_run() {
        let project = fixture_project();
        let runner = RecordingRunner::with_codes([1]);
        let ctx = test_context(project.path(), &runner, no_env);
        assert!(
            run_in_environment(&ctx, "cuda12", vec!["mypy".into()], &RunOptions::default())
                .await
                .is_err()
        );
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_environment_fails_before_any_subprocess() {
        let project = fixture_project();
        let runner = RecordingRunner::new();
        let ctx = test_context(project.path(), &runner, no_env);
        assert!(
            run_in_environment(&ctx, "rocm", vec!["mypy".into()], &RunOptions::default())
                .await
                .is_err()
        );
        assert!(runner.calls().is_empty());
    }
}
