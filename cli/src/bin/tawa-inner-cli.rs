//! # Tawa Inner Entry Point
//!
//! File: cli/src/bin/tawa-inner-cli.rs
//!
//! ## Overview
//!
//! Entry point of `tawa-inner-cli`, the command set that runs inside the
//! container. `tawa-cli` starts it as the container entrypoint with the
//! user's forwarded arguments; it can also be run by hand inside an
//! environment:
//!
//! ```bash
//! tawa-inner-cli test --seed 7 -- -x
//! ```
//!
//! The process exits with the tool's exit code, or 1 if the tool could not
//! be started.
//!
use tawa::{
    common::process::SystemRunner,
    core::logging,
    tools::{build_inner_cli, run_tool},
};

#[tokio::main]
async fn main() {
    let matches = build_inner_cli().get_matches();
    logging::init(matches.get_count("verbose"));

    match run_tool(&matches, &SystemRunner).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("Tool execution failed: {:?}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
