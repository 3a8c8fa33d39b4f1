//! # Argument Forwarding
//!
//! File: cli/src/link/forward.rs
//!
//! ## Overview
//!
//! Converts what the user gave an outer linked command back into tokens for
//! the inner command. Each declared parameter becomes one `ForwardedArgument`,
//! in declaration order:
//!
//! | parameter                 | supplied          | tokens                          |
//! |---------------------------|-------------------|---------------------------------|
//! | flag                      | set               | `--fix`                         |
//! | flag                      | unset             | (none)                          |
//! | string / number           | `v`               | `--seed v`                      |
//! | string list               | `a`, `b`          | `--path a --path b`             |
//! | any option                | absent, no default| (none)                          |
//! | positional                | `x`, `-y`         | `x -y` (after `--`)             |
//!
//! The runtime environment option is also lifted out into
//! `LinkedInvocation::runtime_environment`, so the outer side can choose which
//! image to run without any side channel. It is still forwarded like any other
//! option.
//!
//! The inner entrypoint is:
//!
//! ```text
//! <inner-cli> <command> [option tokens...] [-- positional tokens...]
//! ```
//!
use super::catalog::{CommandSpec, OptionRole, OptionSpec, ParameterSpec, ValueKind};
use crate::core::error::{Result, TawaError};
use anyhow::anyhow;
use clap::ArgMatches;

/// One parameter's contribution to the inner command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardedArgument {
    Option(Vec<String>),
    Positional(Vec<String>),
}

impl ForwardedArgument {
    pub fn tokens(&self) -> &[String] {
        match self {
            ForwardedArgument::Option(tokens) | ForwardedArgument::Positional(tokens) => tokens,
        }
    }
}

/// What the user supplied for one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supplied {
    Flag(bool),
    Values(Vec<String>),
    Absent,
}

/// Serializes one option.
pub fn serialize_option(option: &OptionSpec, supplied: Supplied) -> ForwardedArgument {
    let flag = option.flag();
    let tokens = match supplied {
        Supplied::Flag(true) => vec![flag],
        Supplied::Flag(false) | Supplied::Absent => Vec::new(),
        Supplied::Values(values) => values
            .into_iter()
            .flat_map(|value| [flag.clone(), value])
            .collect(),
    };
    ForwardedArgument::Option(tokens)
}

/// A parsed outer linked command, ready to become a container entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInvocation {
    pub command: &'static str,
    /// The runtime environment the user asked for, if any.
    pub runtime_environment: Option<String>,
    pub arguments: Vec<ForwardedArgument>,
}

impl LinkedInvocation {
    /// `[inner_cli, command, options..., "--", positionals...]`; the separator
    /// only appears when there are positional tokens.
    pub fn entrypoint(&self, inner_cli: &str) -> Vec<String> {
        let mut tokens = vec![inner_cli.to_string(), self.command.to_string()];
        let mut positional = Vec::new();
        for argument in &self.arguments {
            match argument {
                ForwardedArgument::Option(t) => tokens.extend(t.iter().cloned()),
                ForwardedArgument::Positional(t) => positional.extend(t.iter().cloned()),
            }
        }
        if !positional.is_empty() {
            tokens.push("--".to_string());
            tokens.extend(positional);
        }
        tokens
    }
}

fn strings(matches: &ArgMatches, id: &str) -> Result<Option<Vec<String>>> {
    matches
        .try_get_many::<String>(id)
        .map(|values| values.map(|v| v.cloned().collect()))
        .map_err(|e| {
            anyhow!(TawaError::ArgumentParsing(format!(
                "Cannot read '{}': {}",
                id, e
            )))
        })
}

fn supplied(option: &OptionSpec, matches: &ArgMatches) -> Result<Supplied> {
    if option.kind == ValueKind::Flag {
        let set = matches
            .try_get_one::<bool>(option.field)
            .map_err(|e| {
                anyhow!(TawaError::ArgumentParsing(format!(
                    "Cannot read '{}': {}",
                    option.field, e
                )))
            })?
            .copied()
            .unwrap_or(false);
        return Ok(Supplied::Flag(set));
    }
    Ok(match strings(matches, option.field)? {
        Some(values) => Supplied::Values(values),
        None => Supplied::Absent,
    })
}

/// # Collect (`collect`)
///
/// Serializes every parameter of `spec` from the outer command's matches
/// (as rendered by `render::outer_command`, where all values are strings).
pub fn collect(spec: &CommandSpec, matches: &ArgMatches) -> Result<LinkedInvocation> {
    let mut runtime_environment = None;
    let mut arguments = Vec::with_capacity(spec.params.len());

    for param in &spec.params {
        match param {
            ParameterSpec::Option(option) => {
                let supplied = supplied(option, matches)?;
                if option.role == OptionRole::RuntimeEnvironment {
                    if let Supplied::Values(values) = &supplied {
                        runtime_environment = values.last().cloned();
                    }
                }
                arguments.push(serialize_option(option, supplied));
            }
            ParameterSpec::Argument(argument) => {
                let values = strings(matches, argument.field)?.unwrap_or_default();
                arguments.push(ForwardedArgument::Positional(values));
            }
        }
    }

    Ok(LinkedInvocation {
        command: spec.name,
        runtime_environment,
        arguments,
    })
}
