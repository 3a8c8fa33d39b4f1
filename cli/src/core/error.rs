//! # Tawa Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! Error types shared by both binaries. Handlers return `anyhow`-based results
//! so context can be layered on at each boundary, while the failures the rest
//! of the program needs to recognise are expressed as `TawaError` variants.
//!
//! ## Architecture
//!
//! - `TawaError`: a `thiserror` enum covering the failure domains
//!   - configuration (settings files, the runtime environment table)
//!   - image builds (non-zero `docker build`)
//!   - container runs (non-zero tool or `docker run` exit)
//!   - argument handling that clap cannot express
//!   - Docker Engine API calls made through `bollard`
//! - `Result<T>`: alias for `anyhow::Result<T>`
//!
//! ## Examples
//!
//! ```rust
//! use anyhow::anyhow;
//! use tawa::core::error::{Result, TawaError};
//!
//! fn pick(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(anyhow!(TawaError::Configuration(
//!             "runtime environment name is empty".to_string()
//!         )));
//!     }
//!     Ok(())
//! }
//! # assert!(pick("").is_err());
//! ```
//!
//! `main` uses `run_failure_message` to decide whether a failure is reported
//! as a colored status line or logged and printed as `Error: ...`.
//!
use thiserror::Error;

/// Custom error type for the tawa binaries.
#[derive(Error, Debug)]
pub enum TawaError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to build image '{image}' (exit code {code})")]
    Build { image: String, code: i32 },

    /// Carries the status line shown to the user, e.g. `Failed lint`.
    #[error("{0}")]
    RunFailure(String),

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),

    #[error("Docker API interaction failed: {source}")]
    DockerApi {
        #[from]
        source: bollard::errors::Error,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

/// The status line of a `TawaError::RunFailure` anywhere in `err`, or `None`
/// for every other error. A run failure has already been reported by the
/// command it came from and is not logged as an error again.
pub fn run_failure_message(err: &anyhow::Error) -> Option<&str> {
    match err.downcast_ref::<TawaError>() {
        Some(TawaError::RunFailure(message)) => Some(message.as_str()),
        _ => None,
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_display() {
        let config_err = TawaError::Configuration("unknown environment 'rocm'".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: unknown environment 'rocm'"
        );

        let build_err = TawaError::Build {
            image: "proj-cuda12:latest".into(),
            code: 2,
        };
        assert_eq!(
            build_err.to_string(),
            "Failed to build image 'proj-cuda12:latest' (exit code 2)"
        );

        // Run failures render as the bare status line.
        assert_eq!(TawaError::RunFailure("Failed lint".into()).to_string(), "Failed lint");
    }

    #[test]
    fn test_run_failure_survives_context() {
        let err = anyhow!(TawaError::RunFailure("Failed test".into())).context("while testing");
        let inner = err.downcast_ref::<TawaError>();
        assert!(matches!(inner, Some(TawaError::RunFailure(msg)) if msg == "Failed test"));
    }

    #[test]
    fn test_run_failure_message() {
        let run = anyhow!(TawaError::RunFailure("Failed lint".into())).context("lint");
        assert_eq!(run_failure_message(&run), Some("Failed lint"));

        let config = anyhow!(TawaError::Configuration("bad".into()));
        assert_eq!(run_failure_message(&config), None);
        assert_eq!(run_failure_message(&anyhow!("plain")), None);
    }
}
