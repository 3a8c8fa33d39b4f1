//! # Shared Outer Options
//!
//! File: cli/src/commands/args.rs
//!
//! Option groups reused across `tawa-cli` subcommands. The fixed commands
//! flatten them with `#[command(flatten)]`; the linked commands get them added
//! by `link::render::outer_command` through `Args::augment_args`, and read
//! them back with `FromArgMatches`.
//!
use crate::common::docker::{BuildPolicy, BuilderOptions};
use clap::Args;

/// How images are built.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Build with `docker buildx build`
    #[arg(long = "build-buildx")]
    pub build_buildx: bool,

    /// Hide the output of docker build
    #[arg(short, long)]
    pub quiet: bool,

    /// Progress output type passed to docker build (auto, plain, tty)
    #[arg(long, value_name = "MODE")]
    pub progress: Option<String>,
}

impl BuildFlags {
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            buildx: self.build_buildx,
            quiet: self.quiet,
            progress: self.progress.clone(),
        }
    }
}

/// Options for every command that runs a container.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchFlags {
    #[command(flatten)]
    pub build: BuildFlags,

    /// When to build the project image before running
    #[arg(long, value_enum, default_value_t = BuildPolicy::Always)]
    pub build_policy: BuildPolicy,
}

/// `--gpus/--no-gpus`, on by default. The last one given wins.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuArgs {
    /// Attach all host GPUs to the container (default)
    #[arg(long, overrides_with = "no_gpus")]
    pub gpus: bool,

    /// Run the container without GPUs
    #[arg(long, overrides_with = "gpus")]
    pub no_gpus: bool,
}

impl GpuArgs {
    pub fn enabled(&self) -> bool {
        !self.no_gpus
    }
}

/// `--read-write/--read-only`, read-write by default. The last one given wins.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountArgs {
    /// Mount the project read-write (default)
    #[arg(short = 'w', long, overrides_with = "read_only")]
    pub read_write: bool,

    /// Mount the project read-only
    #[arg(short = 'r', long, overrides_with = "read_write")]
    pub read_only: bool,
}

impl MountArgs {
    pub fn writable(&self) -> bool {
        !self.read_only
    }
}
