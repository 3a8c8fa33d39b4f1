//! # Tawa Exec Handler
//!
//! File: cli/src/commands/exec.rs
//!
//! ## Overview
//!
//! Implements `tawa-cli exec`: run an arbitrary command inside the project
//! image of a runtime environment. The command string is split the way a
//! POSIX shell would split it (no shell is started), the project directory is
//! mounted, and AWS credentials from the host are passed through as
//! environment variables.
//!
//! ## Usage
//!
//! ```bash
//! # Open a shell in the default runtime environment
//! tawa-cli exec -i
//!
//! # Run a script read-only, without GPUs, in the cpu environment
//! tawa-cli exec -e cpu --no-gpus --read-only -c "python scripts/report.py --fast"
//! ```
//!
use crate::{
    commands::args::{GpuArgs, LaunchFlags, MountArgs},
    common::{
        docker::{run_in_environment, RunOptions},
        system::aws_credentials,
        ui,
    },
    core::{
        context::CommandContext,
        error::{Result, TawaError},
    },
};
use anyhow::anyhow;
use clap::Args;
use std::collections::BTreeMap;
use tracing::debug;

/// # Exec Arguments (`ExecArgs`)
#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
    /// Runtime environment to run in (defaults to the configured one)
    #[arg(long, short = 'e')]
    pub runtime_environment: Option<String>,

    /// Command to run in the container
    #[arg(long, short = 'c', default_value = "/bin/bash")]
    pub command: String,

    #[command(flatten)]
    pub gpu: GpuArgs,

    /// Attach a TTY and keep stdin open
    #[arg(long, short = 'i')]
    pub interactive: bool,

    #[command(flatten)]
    pub mount: MountArgs,

    /// Run as the image's default (root) user instead of the host user
    #[arg(long = "root-run", hide = true)]
    pub root: bool,

    /// Do not forward AWS credentials from the host
    #[arg(long, hide = true)]
    pub no_aws_creds: bool,

    #[command(flatten)]
    pub launch: LaunchFlags,
}

/// Splits `--command` into entrypoint arguments.
fn entrypoint(command: &str) -> Result<Vec<String>> {
    let words = shell_words::split(command).map_err(|e| {
        anyhow!(TawaError::ArgumentParsing(format!(
            "Cannot split --command '{}': {}",
            command, e
        )))
    })?;
    if words.is_empty() {
        return Err(anyhow!(TawaError::ArgumentParsing(
            "--command must not be empty.".to_string()
        )));
    }
    Ok(words)
}

/// # Handle Exec (`handle_exec`)
///
/// Builds the project image (per `--build-policy`) and runs `--command` in it.
///
/// ## Returns
///
/// * `Result<()>` - `Ok` when the command exits 0; otherwise
///   `TawaError::RunFailure` carrying `Failed command: <command>`.
pub async fn handle_exec(args: ExecArgs, ctx: &CommandContext<'_>) -> Result<()> {
    debug!("Exec args: {:?}", args);
    let entrypoint = entrypoint(&args.command)?;
    let environment = ctx.runtime_environment(args.runtime_environment.as_deref());

    let env_vars = if args.no_aws_creds {
        BTreeMap::new()
    } else {
        aws_credentials(ctx.env)
    };
    let options = RunOptions {
        read_write: args.mount.writable(),
        root: args.root,
        interactive: args.interactive,
        gpus: args.gpu.enabled(),
        env_vars,
        user_id: ctx.identity.uid,
        user_gid: ctx.identity.gid,
        build: args.launch.build_policy,
        display_cmd: true,
        builder: args.launch.build.builder_options(),
    };

    let code = run_in_environment(ctx, &environment, entrypoint, &options).await?;
    if code == 0 {
        ui::success(&format!("Successfully ran command: {}", args.command));
        Ok(())
    } else {
        debug!("exec exited with {}", code);
        Err(anyhow!(TawaError::RunFailure(format!(
            "Failed command: {}",
            args.command
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::process::RecordingRunner;
    use crate::core::context::tests::{no_env, test_context};
    use clap::Parser;
    use std::path::Path;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ExecArgs,
    }

    fn parse(argv: &[&str]) -> ExecArgs {
        Harness::try_parse_from(std::iter::once("exec").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    fn aws_key_only(name: &str) -> Option<String> {
        (name == "AWS_ACCESS_KEY_ID").then(|| "AKIA".to_string())
    }

    #[test]
    fn test_entrypoint_splitting() {
        assert_eq!(entrypoint("echo hi").unwrap(), vec!["echo", "hi"]);
        assert_eq!(
            entrypoint("python -c 'print(1 + 1)'").unwrap(),
            vec!["python", "-c", "print(1 + 1)"]
        );
        assert!(entrypoint("   ").is_err());
        assert!(entrypoint("echo 'unterminated").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.command, "/bin/bash");
        assert!(args.gpu.enabled());
        assert!(args.mount.writable());
        assert!(!args.interactive && !args.root && !args.no_aws_creds);
    }

    #[tokio::test]
    async fn test_exec_read_only_echo() {
        let runner = RecordingRunner::new();
        let ctx = test_context(Path::new("/home/me/proj"), &runner, aws_key_only);
        let args = parse(&["--read-only", "--build-policy", "never", "--command", "echo hi"]);

        handle_exec(args, &ctx).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let argv = &calls[0].args;
        let mount = &argv[argv.iter().position(|a| a == "--mount").unwrap() + 1];
        assert!(mount.ends_with(",readonly"));
        let image_at = argv.iter().position(|a| a == "proj-cuda12:latest").unwrap();
        assert_eq!(argv[image_at + 1..], ["echo", "hi"]);
        assert!(argv.contains(&"AWS_ACCESS_KEY_ID=AKIA".to_string()));
        assert!(argv.contains(&"AWS_SESSION_TOKEN=".to_string()));
        assert!(argv.windows(2).any(|w| w == &["--gpus", "all"]));
        assert!(argv.windows(2).any(|w| w == &["-u", "1000:1000"]));
    }

    #[tokio::test]
    async fn test_exec_without_aws_and_as_root() {
        let runner = RecordingRunner::new();
        let ctx = test_context(Path::new("/home/me/proj"), &runner, aws_key_only);
        let args = parse(&[
            "--no-aws-creds",
            "--root-run",
            "--no-gpus",
            "-i",
            "--build-policy",
            "never",
        ]);

        handle_exec(args, &ctx).await.unwrap();

        let calls = runner.calls();
        let argv = &calls[0].args;
        assert!(!argv.iter().any(|a| a.starts_with("AWS_")));
        assert!(!argv.contains(&"-u".to_string()));
        assert!(!argv.contains(&"--gpus".to_string()));
        assert!(argv.contains(&"-it".to_string()));
        assert_eq!(argv.last().map(String::as_str), Some("/bin/bash"));
    }

    #[tokio::test]
    async fn test_exec_failure_is_run_failure() {
        let runner = RecordingRunner::with_codes([2]);
        let ctx = test_context(Path::new("/home/me/proj"), &runner, no_env);
        let err = handle_exec(parse(&["--build-policy", "never", "-c", "false"]), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed command: false");
    }
}
