//! # Inner Tools (`tools`)
//!
//! File: cli/src/tools/mod.rs
//!
//! ## Overview
//!
//! The container side of the linked commands. `tawa-inner-cli` is rendered
//! from the same command table as the outer commands, parses the forwarded
//! arguments with their real types, and runs exactly one tool:
//!
//! | command      | tool invocation                                                  |
//! |--------------|------------------------------------------------------------------|
//! | `docs`       | `sphinx-build -W [-E] [-b BUILDER] docs/source docs/build`       |
//! | `format`     | `ruff format [--check] .`                                        |
//! | `lint`       | `ruff check [--fix] .`                                           |
//! | `test`       | `pytest --forked --randomly-seed=SEED --randomly-dont-reorganize [EXTRA...] [PATH...]` |
//! | `type-check` | `mypy .`                                                         |
//!
//! The tool's exit code becomes the process exit code. A forwarded runtime
//! environment is exported to the tool as `TAWA_RUNTIME_ENVIRONMENT`.
//!
use crate::{
    common::process::{Invocation, ProcessRunner},
    core::error::{Result, TawaError},
    link::{catalog, render},
};
use anyhow::anyhow;
use clap::{ArgMatches, CommandFactory, Parser};
use tracing::{debug, info};

/// Environment variable carrying the forwarded runtime environment.
pub const RUNTIME_ENVIRONMENT_VAR: &str = "TAWA_RUNTIME_ENVIRONMENT";

const DOCS_SOURCE: &str = "docs/source";
const DOCS_BUILD: &str = "docs/build";

/// Global options of the container-side CLI. Subcommands come from the table.
#[derive(Parser, Debug)]
#[command(
    name = "tawa-inner-cli",
    about = "Run the project's developer tools inside a tawa runtime environment",
    propagate_version = true,
    version
)]
pub struct InnerCli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// The complete `tawa-inner-cli` command.
pub fn build_inner_cli() -> clap::Command {
    catalog::command_table()
        .iter()
        .fold(InnerCli::command(), |cli, spec| {
            cli.subcommand(render::inner_command(spec))
        })
        .subcommand_required(true)
        .arg_required_else_help(true)
}

/// One parsed inner command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    Docs {
        ignore_cache: bool,
        builder: Option<String>,
    },
    Format {
        check: bool,
    },
    Lint {
        fix: bool,
    },
    Test {
        paths: Vec<String>,
        seed: i64,
        extra: Vec<String>,
    },
    TypeCheck,
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

impl ToolRequest {
    /// # From Matches (`from_matches`)
    ///
    /// ## Arguments
    ///
    /// * `name` - The subcommand name.
    /// * `matches` - Its matches, as parsed by `render::inner_command`.
    pub fn from_matches(name: &str, matches: &ArgMatches) -> Result<Self> {
        Ok(match name {
            "docs" => ToolRequest::Docs {
                ignore_cache: matches.get_flag("ignore_cache"),
                builder: matches.get_one::<String>("builder").cloned(),
            },
            "format" => ToolRequest::Format {
                check: matches.get_flag("check"),
            },
            "lint" => ToolRequest::Lint {
                fix: matches.get_flag("fix"),
            },
            "test" => ToolRequest::Test {
                paths: strings(matches, "path"),
                seed: matches
                    .get_one::<i64>("seed")
                    .copied()
                    .unwrap_or(catalog::DEFAULT_TEST_SEED),
                extra: strings(matches, "pytest_args"),
            },
            "type-check" => ToolRequest::TypeCheck,
            other => {
                return Err(anyhow!(TawaError::ArgumentParsing(format!(
                    "Unknown command '{}'",
                    other
                ))))
            }
        })
    }

    pub fn program(&self) -> &'static str {
        match self {
            ToolRequest::Docs { .. } => "sphinx-build",
            ToolRequest::Format { .. } | ToolRequest::Lint { .. } => "ruff",
            ToolRequest::Test { .. } => "pytest",
            ToolRequest::TypeCheck => "mypy",
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self {
            ToolRequest::Docs {
                ignore_cache,
                builder,
            } => {
                args.push("-W".into());
                if *ignore_cache {
                    args.push("-E".into());
                }
                if let Some(builder) = builder {
                    args.extend(["-b".to_string(), builder.clone()]);
                }
                args.extend([DOCS_SOURCE.to_string(), DOCS_BUILD.to_string()]);
            }
            ToolRequest::Format { check } => {
                args.push("format".into());
                if *check {
                    args.push("--check".into());
                }
                args.push(".".into());
            }
            ToolRequest::Lint { fix } => {
                args.push("check".into());
                if *fix {
                    args.push("--fix".into());
                }
                args.push(".".into());
            }
            ToolRequest::Test { paths, seed, extra } => {
                args.push("--forked".into());
                args.push(format!("--randomly-seed={}", seed));
                args.push("--randomly-dont-reorganize".into());
                args.extend(extra.iter().cloned());
                args.extend(paths.iter().cloned());
            }
            ToolRequest::TypeCheck => args.push(".".into()),
        }
        args
    }

    /// The tool run, with the runtime environment exported when known.
    pub fn invocation(&self, runtime_environment: Option<&str>) -> Invocation {
        let mut invocation = Invocation::new(self.program(), self.args());
        if let Some(environment) = runtime_environment {
            invocation
                .envs
                .insert(RUNTIME_ENVIRONMENT_VAR.to_string(), environment.to_string());
        }
        invocation
    }
}

/// # Run Tool (`run_tool`)
///
/// Runs the tool selected by a parsed `tawa-inner-cli` command line.
///
/// ## Returns
///
/// * `Result<i32>` - The tool's exit code.
pub async fn run_tool(matches: &ArgMatches, runner: &dyn ProcessRunner) -> Result<i32> {
    let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
        anyhow!(TawaError::ArgumentParsing(
            "No command given.".to_string()
        ))
    })?;
    let request = ToolRequest::from_matches(name, sub_matches)?;
    debug!("Tool request: {:?}", request);

    let runtime_environment = sub_matches
        .get_one::<String>("runtime_environment")
        .map(String::as_str);
    let invocation = request.invocation(runtime_environment);
    info!("Running {}", invocation.command_line());
    runner.run(&invocation).await
}
