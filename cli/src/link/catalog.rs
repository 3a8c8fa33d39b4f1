//! # Linked Command Catalog
//!
//! File: cli/src/link/catalog.rs
//!
//! ## Overview
//!
//! The single declaration of the commands that exist on both sides of the
//! container boundary: `docs`, `format`, `lint`, `test` and `type-check`.
//! `tawa-inner-cli` is rendered from this table with typed parsers;
//! `tawa-cli` is rendered from the same table with string values plus the
//! container options, and forwards whatever the user typed back into the
//! inner command. Adding an option here adds it to both binaries.
//!
//! ## Architecture
//!
//! - `CommandSpec`: name, help, ordered parameters, container profile.
//! - `ParameterSpec`: either an `OptionSpec` (long + short flag, value kind,
//!   optional default) or an `ArgumentSpec` (positional, one or many).
//! - `ContainerProfile`: whether the outer command offers `--gpus/--no-gpus`
//!   and whether the mount access is fixed read-write or user selected.
//!
//! Every command also carries the shared `--runtime-environment/-e` option,
//! whose role marks it for interception by the outer side.
//!

/// What a valued option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Present or absent; forwarded as the bare flag.
    Flag,
    String,
    /// Parsed as `i64` by the inner command.
    Number,
    /// Repeatable; forwarded as one flag/value pair per element.
    StringList,
}

/// A declared default, rendered into both command surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Text(&'static str),
    Number(i64),
    List(&'static [&'static str]),
}

impl DefaultValue {
    /// The default as command-line values.
    pub fn values(&self) -> Vec<String> {
        match self {
            DefaultValue::Text(text) => vec![text.to_string()],
            DefaultValue::Number(n) => vec![n.to_string()],
            DefaultValue::List(items) => items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Marks options the outer side treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRole {
    Plain,
    /// Selects the runtime environment the container is built from.
    RuntimeEnvironment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub long: &'static str,
    pub short: char,
    /// Argument id in the parsed matches.
    pub field: &'static str,
    pub kind: ValueKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub help: &'static str,
    pub role: OptionRole,
}

impl OptionSpec {
    /// The forwarded flag token, e.g. `--fix`.
    pub fn flag(&self) -> String {
        format!("--{}", self.long)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    ExactlyOne,
    Variadic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub field: &'static str,
    pub arity: Arity,
    pub help: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSpec {
    Option(OptionSpec),
    Argument(ArgumentSpec),
}

/// How the outer command mounts the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountAccess {
    /// Always read-write; no mount option is offered.
    ReadWrite,
    /// `--read-write/-w` or `--read-only/-r`, read-write by default.
    UserSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerProfile {
    /// Offer `--gpus/--no-gpus` (GPUs on by default).
    pub gpus: bool,
    pub mount: MountAccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub params: Vec<ParameterSpec>,
    pub container: ContainerProfile,
}

impl CommandSpec {
    pub fn options(&self) -> impl Iterator<Item = &OptionSpec> {
        self.params.iter().filter_map(|p| match p {
            ParameterSpec::Option(option) => Some(option),
            ParameterSpec::Argument(_) => None,
        })
    }

    pub fn arguments(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.params.iter().filter_map(|p| match p {
            ParameterSpec::Argument(argument) => Some(argument),
            ParameterSpec::Option(_) => None,
        })
    }
}

/// Seed `pytest-randomly` uses unless told otherwise.
pub const DEFAULT_TEST_SEED: i64 = 0xa455;

/// Paths `pytest` collects when no `--path` is given.
pub const DEFAULT_TEST_PATHS: &[&str] = &["tests"];

fn runtime_environment_option() -> ParameterSpec {
    ParameterSpec::Option(OptionSpec {
        long: "runtime-environment",
        short: 'e',
        field: "runtime_environment",
        kind: ValueKind::String,
        required: false,
        default: None,
        help: "Runtime environment to run the command in (defaults to the configured one)",
        role: OptionRole::RuntimeEnvironment,
    })
}

fn flag(long: &'static str, short: char, field: &'static str, help: &'static str) -> ParameterSpec {
    ParameterSpec::Option(OptionSpec {
        long,
        short,
        field,
        kind: ValueKind::Flag,
        required: false,
        default: None,
        help,
        role: OptionRole::Plain,
    })
}

/// Builds the linked command table, in the order commands are listed in help.
pub fn command_table() -> Vec<CommandSpec> {
    let user_selected = ContainerProfile {
        gpus: false,
        mount: MountAccess::UserSelected,
    };

    vec![
        CommandSpec {
            name: "docs",
            help: "Build the Sphinx documentation",
            params: vec![
                runtime_environment_option(),
                flag(
                    "ignore-cache",
                    'i',
                    "ignore_cache",
                    "Rebuild every page instead of using the doctree cache",
                ),
                ParameterSpec::Option(OptionSpec {
                    long: "builder",
                    short: 'b',
                    field: "builder",
                    kind: ValueKind::String,
                    required: false,
                    default: None,
                    help: "Sphinx builder to use (sphinx-build's default when omitted)",
                    role: OptionRole::Plain,
                }),
            ],
            container: user_selected,
        },
        CommandSpec {
            name: "format",
            help: "Format the project with ruff",
            params: vec![
                runtime_environment_option(),
                flag(
                    "check",
                    'c',
                    "check",
                    "Check formatting without modifying the files",
                ),
            ],
            container: user_selected,
        },
        CommandSpec {
            name: "lint",
            help: "Lint the project with ruff",
            params: vec![
                runtime_environment_option(),
                flag("fix", 'f', "fix", "Apply ruff's automatic fixes"),
            ],
            container: user_selected,
        },
        CommandSpec {
            name: "test",
            help: "Run the test suite with pytest",
            params: vec![
                runtime_environment_option(),
                ParameterSpec::Option(OptionSpec {
                    long: "path",
                    short: 'p',
                    field: "path",
                    kind: ValueKind::StringList,
                    required: false,
                    default: Some(DefaultValue::List(DEFAULT_TEST_PATHS)),
                    help: "File or directory to pass to pytest; can be given multiple times",
                    role: OptionRole::Plain,
                }),
                ParameterSpec::Option(OptionSpec {
                    long: "seed",
                    short: 's',
                    field: "seed",
                    kind: ValueKind::Number,
                    required: false,
                    default: Some(DefaultValue::Number(DEFAULT_TEST_SEED)),
                    help: "Seed for pytest-randomly",
                    role: OptionRole::Plain,
                }),
                ParameterSpec::Argument(ArgumentSpec {
                    field: "pytest_args",
                    arity: Arity::Variadic,
                    help: "Extra arguments passed to pytest verbatim (after --)",
                }),
            ],
            container: ContainerProfile {
                gpus: true,
                mount: MountAccess::ReadWrite,
            },
        },
        CommandSpec {
            name: "type-check",
            help: "Type check the project with mypy",
            params: vec![runtime_environment_option()],
            container: ContainerProfile {
                gpus: false,
                mount: MountAccess::ReadWrite,
            },
        },
    ]
}

/// Looks up one linked command by name.
pub fn find(name: &str) -> Option<CommandSpec> {
    command_table().into_iter().find(|spec| spec.name == name)
}
