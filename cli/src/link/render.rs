//! # Command Renderers
//!
//! File: cli/src/link/render.rs
//!
//! ## Overview
//!
//! Renders a `CommandSpec` into a `clap::Command` for either side of the
//! container boundary.
//!
//! - `inner_command`: the tool-running surface. Values are parsed to their
//!   declared types, so a non-numeric `--seed` is rejected here.
//! - `outer_command`: the same names, flags, defaults and required-ness, with
//!   every value kept as a `String` because the outer side only forwards it.
//!   On top of the table's parameters it adds the launch options
//!   (`--build-buildx`, `--quiet`, `--progress`, `--build-policy`) and the
//!   container options its `ContainerProfile` asks for.
//!
//! Positional parameters come last. Plain tokens may sit between options;
//! hyphenated ones (`-x`, `-k expr`) only reach a positional after `--`, so
//! an option typed after a positional is still parsed as that option.
//!
use super::catalog::{ArgumentSpec, Arity, CommandSpec, MountAccess, OptionSpec, ValueKind};
use crate::commands::args::{GpuArgs, LaunchFlags, MountArgs};
use clap::{value_parser, Arg, ArgAction, Args, Command};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Inner,
    Outer,
}

fn option_arg(option: &OptionSpec, surface: Surface) -> Arg {
    let arg = Arg::new(option.field)
        .long(option.long)
        .short(option.short)
        .help(option.help);

    let mut arg = match option.kind {
        ValueKind::Flag => return arg.action(ArgAction::SetTrue),
        ValueKind::String => arg.action(ArgAction::Set).value_parser(value_parser!(String)),
        ValueKind::Number => match surface {
            Surface::Inner => arg.action(ArgAction::Set).value_parser(value_parser!(i64)),
            Surface::Outer => arg.action(ArgAction::Set).value_parser(value_parser!(String)),
        },
        ValueKind::StringList => arg
            .action(ArgAction::Append)
            .value_parser(value_parser!(String)),
    };

    arg = arg
        .value_name(option.field.to_uppercase())
        .required(option.required);
    if let Some(default) = option.default {
        arg = arg.default_values(default.values());
    }
    arg
}

fn argument_arg(argument: &ArgumentSpec) -> Arg {
    let arg = Arg::new(argument.field)
        .help(argument.help)
        .value_name(argument.field.to_uppercase())
        .value_parser(value_parser!(String));
    match argument.arity {
        Arity::ExactlyOne => arg.action(ArgAction::Set).required(true),
        Arity::Variadic => arg.action(ArgAction::Append).num_args(1..),
    }
}

fn render(spec: &CommandSpec, surface: Surface) -> Command {
    let mut command = Command::new(spec.name).about(spec.help);
    for option in spec.options() {
        command = command.arg(option_arg(option, surface));
    }
    for argument in spec.arguments() {
        command = command.arg(argument_arg(argument));
    }
    command
}

/// Renders the in-container command.
pub fn inner_command(spec: &CommandSpec) -> Command {
    render(spec, Surface::Inner)
}

/// Renders the host-side command that wraps the inner one in a container.
pub fn outer_command(spec: &CommandSpec) -> Command {
    let mut command = LaunchFlags::augment_args(render(spec, Surface::Outer));
    if spec.container.gpus {
        command = GpuArgs::augment_args(command);
    }
    if spec.container.mount == MountAccess::UserSelected {
        command = MountArgs::augment_args(command);
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::catalog::{command_table, find};
    use clap::FromArgMatches;

    fn spec(name: &str) -> CommandSpec {
        find(name).unwrap()
    }

    #[test]
    fn test_rendered_commands_are_consistent() {
        for spec in command_table() {
            inner_command(&spec).debug_assert();
            outer_command(&spec).debug_assert();
        }
    }

    #[test]
    fn test_inner_number_is_typed() {
        let matches = inner_command(&spec("test"))
            .try_get_matches_from(["test", "--seed", "7"])
            .unwrap();
        assert_eq!(matches.get_one::<i64>("seed"), Some(&7));

        let rejected = inner_command(&spec("test")).try_get_matches_from(["test", "-s", "seven"]);
        assert!(rejected.is_err());
    }

    #[test]
    fn test_outer_number_is_erased_to_string() {
        let matches = outer_command(&spec("test"))
            .try_get_matches_from(["test", "-s", "7"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("seed").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_defaults_declared_on_both_sides() {
        for command in [inner_command(&spec("test")), outer_command(&spec("test"))] {
            let matches = command.try_get_matches_from(["test"]).unwrap();
            let paths: Vec<&String> = matches.get_many::<String>("path").unwrap().collect();
            assert_eq!(paths, vec!["tests"]);
        }
        // No default declared: nothing is present.
        let matches = outer_command(&spec("docs")).try_get_matches_from(["docs"]).unwrap();
        assert!(matches.get_one::<String>("builder").is_none());
    }

    #[test]
    fn test_variadic_takes_hyphenated_tokens_after_separator() {
        let matches = inner_command(&spec("test"))
            .try_get_matches_from(["test", "--path", "a", "--", "-x", "-k", "slow"])
            .unwrap();
        let extra: Vec<&String> = matches.get_many::<String>("pytest_args").unwrap().collect();
        assert_eq!(extra, vec!["-x", "-k", "slow"]);
    }

    #[test]
    fn test_options_after_a_positional_are_still_parsed() {
        let matches = outer_command(&spec("test"))
            .try_get_matches_from(["test", "tests/unit", "--no-gpus", "-e", "cpu"])
            .unwrap();
        assert!(!GpuArgs::from_arg_matches(&matches).unwrap().enabled());
        assert_eq!(
            matches.get_one::<String>("runtime_environment").map(String::as_str),
            Some("cpu")
        );
        let extra: Vec<&String> = matches.get_many::<String>("pytest_args").unwrap().collect();
        assert_eq!(extra, vec!["tests/unit"]);
    }

    #[test]
    fn test_hyphenated_positional_needs_separator() {
        assert!(inner_command(&spec("test"))
            .try_get_matches_from(["test", "-x"])
            .is_err());
    }

    #[test]
    fn test_container_options_follow_profile() {
        let test = outer_command(&spec("test"));
        assert!(test.get_arguments().any(|a| a.get_id() == "no_gpus"));
        assert!(!test.get_arguments().any(|a| a.get_id() == "read_write"));

        let lint = outer_command(&spec("lint"));
        assert!(!lint.get_arguments().any(|a| a.get_id() == "no_gpus"));
        assert!(lint.get_arguments().any(|a| a.get_id() == "read_only"));
        assert!(lint.get_arguments().any(|a| a.get_id() == "build_policy"));

        // The inner surface never carries container options.
        assert!(!inner_command(&spec("lint"))
            .get_arguments()
            .any(|a| a.get_id() == "quiet"));
    }

    #[test]
    fn test_required_option_without_default_is_rejected() {
        let mut required = spec("format");
        required.params.push(crate::link::catalog::ParameterSpec::Option(OptionSpec {
            long: "config",
            short: 'C',
            field: "config",
            kind: ValueKind::String,
            required: true,
            default: None,
            help: "ruff configuration file",
            role: crate::link::catalog::OptionRole::Plain,
        }));

        for command in [inner_command(&required), outer_command(&required)] {
            let err = command.try_get_matches_from(["format"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        }
    }
}
