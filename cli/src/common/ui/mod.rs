//! # Tawa UI Utilities (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//!
//! Status lines printed at the end of an outer command, and the echo of the
//! `docker` command about to run. Styling comes from `console`, which drops
//! the colors when the stream is not a terminal.
//!
use console::{style, StyledObject};

/// Green on blue, e.g. `Ran lint successfully`.
pub fn success_line(message: &str) -> StyledObject<&str> {
    style(message).green().on_blue()
}

/// Bold red on black, e.g. `Failed lint`.
pub fn failure_line(message: &str) -> StyledObject<&str> {
    style(message).red().on_black().bold().for_stderr()
}

/// Prints a success status line to stdout.
pub fn success(message: &str) {
    println!("{}", success_line(message));
}

/// Prints a failure status line to stderr.
pub fn failure(message: &str) {
    eprintln!("{}", failure_line(message));
}

/// Echoes a command line to stderr before it runs.
pub fn command_echo(command_line: &str) {
    eprintln!("{} {}", style("+").dim().for_stderr(), style(command_line).cyan().for_stderr());
}
