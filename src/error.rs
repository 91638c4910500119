//! # Error Handling
//!
//! This module defines the centralized error type for `hostdeploy`. It uses
//! the `thiserror` library to describe every failure a deploy run can end
//! with, and maps each one to the process exit code reported by the binary.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failure modes. Two of them have dedicated
//!   exit codes (`MissingManifest` and `RemoteUnreachable`); a failing
//!   external command carries its own exit code through `CommandFailed`.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The run is fail-fast: the first error returned by any step aborts the
//! whole deploy, and nothing is rolled back.

use thiserror::Error;

use crate::exit_codes;

/// Main error type for hostdeploy operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is missing or invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration
        hint: Option<String>,
    },

    /// The repository has neither a compose file nor a Dockerfile.
    #[error("No Dockerfile or docker-compose file found in {dir}")]
    MissingManifest { dir: String },

    /// The remote host could not be reached over SSH.
    #[error("Cannot reach {target} over SSH: {message}")]
    RemoteUnreachable { target: String, message: String },

    /// An external command ran and exited unsuccessfully.
    #[error("Command failed{}: {command}{}", code_suffix(code), stderr_suffix(stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("Failed to run {program}: {error}")]
    CommandSpawn {
        program: String,
        error: std::io::Error,
    },

    /// A required local tool is not installed.
    #[error("Required tool not found on PATH: {tool}")]
    ToolNotFound { tool: String },

    /// One or more post-deploy checks failed.
    #[error("Validation failed: {}", failed.join(", "))]
    Validation { failed: Vec<String> },

    /// No application name could be derived from the repository URL.
    #[error("Cannot derive a repository name from '{url}'")]
    RepoName { url: String },

    /// Reading interactive input failed.
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// A failed external command exits with that command's own code, the
    /// way a shell script running with fail-on-error would.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingManifest { .. } => exit_codes::MISSING_MANIFEST,
            Error::RemoteUnreachable { .. } => exit_codes::REMOTE_UNREACHABLE,
            Error::CommandFailed {
                code: Some(code), ..
            } if (1..=255).contains(code) => *code,
            _ => exit_codes::ERROR,
        }
    }
}

fn code_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" (exit code {})", c))
        .unwrap_or_default()
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n  {}", stderr)
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
