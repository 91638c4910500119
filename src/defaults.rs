//! Default values for hostdeploy configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Branch used when the operator leaves the branch empty.
pub const BRANCH: &str = "main";

/// Seconds SSH waits for a TCP connection before giving up.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fixed path of the Nginx site written on the remote host.
pub const NGINX_SITE_PATH: &str = "/etc/nginx/sites-available/hostdeploy";

/// Where the Nginx site is linked to be enabled.
pub const NGINX_SITE_LINK: &str = "/etc/nginx/sites-enabled/hostdeploy";

/// Nginx's stock site, removed so it does not shadow ours on port 80.
pub const NGINX_DEFAULT_SITE_LINK: &str = "/etc/nginx/sites-enabled/default";

/// Dependency-list file name checked for next to the Dockerfile.
pub const DEPENDENCY_LIST: &str = "requirements.txt";

/// Contents written when the dependency list is referenced but absent.
pub const DEFAULT_DEPENDENCIES: &str = "flask\ngunicorn\n";

/// Local tools the workflow shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["git", "ssh", "rsync"];

/// Returns the default directory repositories are cloned into.
///
/// This is the current directory; it can be overridden by `--workdir`.
pub fn default_workdir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the default directory the run log is written to.
///
/// This can be overridden by the `--log-dir` CLI flag or the
/// `HOSTDEPLOY_LOG_DIR` environment variable.
pub fn default_log_dir() -> PathBuf {
    default_workdir()
}

/// Returns the SSH key offered as a default in the interactive prompt.
pub fn default_ssh_key() -> String {
    "~/.ssh/id_rsa".to_string()
}
