//! Process exit codes returned by the `hostdeploy` binary.
//!
//! - `0`: success
//! - `1`: general failure
//! - `2`: invalid command-line usage (reported by clap)
//! - `10`: the repository has no Dockerfile or compose file
//! - `20`: the remote host is not reachable over SSH
//!
//! A failing external command exits with its own code instead; see
//! [`crate::error::Error::exit_code`].

/// The run completed.
pub const SUCCESS: i32 = 0;

/// Any failure without a more specific code.
pub const ERROR: i32 = 1;

/// Invalid command-line usage.
pub const USAGE: i32 = 2;

/// No container manifest in the repository.
pub const MISSING_MANIFEST: i32 = 10;

/// SSH connectivity check failed.
pub const REMOTE_UNREACHABLE: i32 = 20;
