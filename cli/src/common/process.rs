//! # Tawa Process Execution (`common::process`)
//!
//! File: cli/src/common/process.rs
//!
//! ## Overview
//!
//! Every external program tawa starts (`docker build`, `docker run`, and the
//! inner tools such as `ruff` or `pytest`) is described as an `Invocation` and
//! handed to a `ProcessRunner`. The runner's only answer is the exit code.
//!
//! ## Architecture
//!
//! - `Invocation`: program, arguments, extra environment, working directory,
//!   and whether stdout should be discarded.
//! - `ProcessRunner`: async trait seam between command logic and the OS.
//! - `SystemRunner`: the real implementation on `tokio::process::Command`.
//!   stdin and stderr are inherited, so interactive containers and tool
//!   diagnostics behave as if the program had been run directly.
//! - `RecordingRunner` (tests only): records invocations and replays scripted
//!   exit codes.
//!
//! Each invocation is awaited to completion before the caller continues.
//!
use crate::core::error::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{debug, instrument, warn};

/// A fully specified external program run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Added to the inherited environment.
    pub envs: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    /// Discard the program's stdout.
    pub quiet: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// The program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Shell-quoted rendering, suitable for echoing to the user.
    pub fn command_line(&self) -> String {
        shell_words::join(self.argv())
    }
}

/// Runs invocations and reports their exit codes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `invocation` to completion. Failing to start the program is an
    /// error; a non-zero exit is not.
    async fn run(&self, invocation: &Invocation) -> Result<i32>;
}

/// Runs programs on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    #[instrument(skip(self, invocation), fields(program = %invocation.program))]
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        debug!("Running: {}", invocation.command_line());
        let mut command = tokio::process::Command::new(&invocation.program);
        command.args(&invocation.args).envs(&invocation.envs);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }
        if invocation.quiet {
            command.stdout(Stdio::null());
        }

        let status = command
            .status()
            .await
            .with_context(|| format!("Failed to start `{}`", invocation.program))?;

        match status.code() {
            Some(code) => {
                debug!("`{}` exited with {}", invocation.program, code);
                Ok(code)
            }
            None => {
                // Terminated by a signal.
                warn!("`{}` terminated without an exit code ({})", invocation.program, status);
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingRunner;
