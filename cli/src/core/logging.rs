//! # Logging Setup
//!
//! File: cli/src/core/logging.rs
//!
//! Installs the `tracing` subscriber shared by `tawa-cli` and `tawa-inner-cli`.
//! The global `-v` count selects the level (`warn`, `info`, `debug`, `trace`);
//! `RUST_LOG` takes precedence when set. Output goes to stderr so tool output
//! on stdout stays clean.
//!
use tracing_subscriber::{fmt, EnvFilter};

/// Maps the `-v` occurrence count to a level filter directive.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes the global subscriber. Call once, before any logging.
pub fn init(verbosity: u8) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(7), "trace");
    }
}
