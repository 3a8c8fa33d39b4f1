//! # Tawa Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! Entry point of `tawa-cli`, the host-side command set. It handles:
//! - Command-line parsing (fixed derive commands plus the linked commands)
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//! - Reporting failures and the process exit code
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! tawa-cli --help
//!
//! # Build the cpu project image, then lint inside it with debug logging
//! tawa-cli build -e cpu
//! tawa-cli -vv lint -e cpu --fix
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level
//! 3. Route to the command handler
//! 4. Print any failure and exit 1
//!
use tawa::{
    commands::{build_cli, dispatch},
    common::{process::SystemRunner, ui},
    core::{error::run_failure_message, logging},
};

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    logging::init(matches.get_count("verbose"));

    if let Err(e) = dispatch(&matches, &SystemRunner).await {
        match run_failure_message(&e) {
            Some(message) => {
                tracing::debug!("Command reported failure: {:?}", e);
                ui::failure(message);
            }
            None => {
                tracing::error!("Command execution failed: {:?}", e);
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }
}
