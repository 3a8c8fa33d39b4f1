//! # Linked Command Handler
//!
//! File: cli/src/commands/linked.rs
//!
//! ## Overview
//!
//! Runs one of the table-driven commands (`docs`, `format`, `lint`, `test`,
//! `type-check`) from the host. The user's arguments are forwarded to the
//! same command of the inner CLI, which runs as the container entrypoint in
//! the selected runtime environment.
//!
//! ## Usage
//!
//! ```bash
//! tawa-cli lint --fix
//! tawa-cli test -e cpu --no-gpus -p tests/unit -- -x
//! tawa-cli docs --read-only --build-policy missing
//! ```
//!
//! On exit 0 the handler prints `Ran <name> successfully`; otherwise it
//! returns a `TawaError::RunFailure` carrying `Failed <name>`.
//!
use crate::{
    commands::args::{GpuArgs, LaunchFlags, MountArgs},
    common::{
        docker::{run_in_environment, RunOptions},
        ui,
    },
    core::{
        context::CommandContext,
        error::{Result, TawaError},
    },
    link::{
        catalog::{CommandSpec, MountAccess},
        forward,
    },
};
use anyhow::anyhow;
use clap::{ArgMatches, FromArgMatches};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Derives the run options from the outer-only arguments and the command's container profile.
fn run_options(
    spec: &CommandSpec,
    matches: &ArgMatches,
    ctx: &CommandContext<'_>,
) -> Result<RunOptions> {
    let launch = LaunchFlags::from_arg_matches(matches)?;
    let gpus = spec.container.gpus && GpuArgs::from_arg_matches(matches)?.enabled();
    let read_write = match spec.container.mount {
        MountAccess::ReadWrite => true,
        MountAccess::UserSelected => MountArgs::from_arg_matches(matches)?.writable(),
    };

    Ok(RunOptions {
        read_write,
        root: false,
        interactive: false,
        gpus,
        env_vars: BTreeMap::new(),
        user_id: ctx.identity.uid,
        user_gid: ctx.identity.gid,
        build: launch.build_policy,
        display_cmd: true,
        builder: launch.build.builder_options(),
    })
}

/// # Handle Linked Command (`handle_linked`)
///
/// ## Arguments
///
/// * `spec` - The command's table entry.
/// * `matches` - The subcommand's matches, parsed by `render::outer_command(spec)`.
/// * `ctx` - Per-invocation context.
pub async fn handle_linked(
    spec: &CommandSpec,
    matches: &ArgMatches,
    ctx: &CommandContext<'_>,
) -> Result<()> {
    let linked = forward::collect(spec, matches)?;
    debug!("Forwarding {:?}", linked);

    let environment = ctx.runtime_environment(linked.runtime_environment.as_deref());
    let options = run_options(spec, matches, ctx)?;
    let entrypoint = linked.entrypoint(&ctx.settings.project.inner_cli);
    info!("Running {} in {} runtime environment", spec.name, environment);

    let code = run_in_environment(ctx, &environment, entrypoint, &options).await?;
    if code == 0 {
        ui::success(&format!("Ran {} successfully", spec.name));
        Ok(())
    } else {
        debug!("{} exited with {}", spec.name, code);
        Err(anyhow!(TawaError::RunFailure(format!("Failed {}", spec.name))))
    }
}
