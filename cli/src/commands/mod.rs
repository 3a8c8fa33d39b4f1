//! # Tawa Outer Commands
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! The `tawa-cli` command surface and its dispatcher.
//!
//! ## Architecture
//!
//! - Fixed commands are declared with clap's derive API in `Commands`:
//!   - `build`: build the project image (`build.rs`)
//!   - `build-base`: build the base image (`build.rs`)
//!   - `exec`: run any command in the project image (`exec.rs`)
//! - Linked commands (`docs`, `format`, `lint`, `test`, `type-check`) are
//!   appended at runtime from `link::catalog` and handled by `linked.rs`.
//! - `args.rs` holds the option groups both kinds share.
//!
//! `dispatch` routes a parsed command line to the right handler after
//! building the `CommandContext`.
//!
use crate::{
    common::process::ProcessRunner,
    core::{context::CommandContext, environments::DockerfileRole, error::Result},
    link::{catalog, render},
};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use tracing::debug;

pub mod args;
pub mod build;
pub mod exec;
pub mod linked;

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "tawa-cli",
    about = "Build runtime environment images and run developer commands inside them",
    long_about = "Builds the project's runtime environment images and runs lint, format, test, \
                  type-check, docs or any command inside them, with the project mounted.",
    propagate_version = true,
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Fixed top-level commands. Linked commands are added by `build_cli`.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the project image of a runtime environment
    Build(build::BuildArgs),
    /// Build the base image of a runtime environment
    BuildBase(build::BuildArgs),
    /// Run a command in the project image of a runtime environment
    Exec(exec::ExecArgs),
}

/// The complete `tawa-cli` command, fixed and linked subcommands together.
pub fn build_cli() -> clap::Command {
    catalog::command_table()
        .iter()
        .fold(Cli::command(), |cli, spec| {
            cli.subcommand(render::outer_command(spec))
        })
}

/// # Dispatch (`dispatch`)
///
/// Builds the context for the working directory and runs the selected command.
pub async fn dispatch(matches: &ArgMatches, runner: &dyn ProcessRunner) -> Result<()> {
    let ctx = CommandContext::discover(runner).await?;

    if let Some((name, sub_matches)) = matches.subcommand() {
        if let Some(spec) = catalog::find(name) {
            debug!("Dispatching linked command '{}'", name);
            return linked::handle_linked(&spec, sub_matches, &ctx).await;
        }
    }

    let cli = Cli::from_arg_matches(matches)?;
    debug!("Parsed CLI arguments: {:?}", cli);
    match cli.command {
        Commands::Build(args) => build::handle_build(args, DockerfileRole::Project, &ctx).await,
        Commands::BuildBase(args) => build::handle_build(args, DockerfileRole::Base, &ctx).await,
        Commands::Exec(args) => exec::handle_exec(args, &ctx).await,
    }
}
