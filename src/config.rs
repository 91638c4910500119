//! # Deploy Configuration
//!
//! The values a deploy run needs are captured once at startup and used
//! for the remainder of the process:
//!
//! - repository URL, access token and branch;
//! - remote username, host and SSH key path;
//! - the port the application listens on.
//!
//! Values arrive from three places, highest precedence first:
//!
//! 1. command-line flags (or their `HOSTDEPLOY_*` environment variables);
//! 2. an optional YAML answers file (`--config deploy.yaml`);
//! 3. interactive prompts for whatever is still missing (see [`crate::prompt`]).
//!
//! Each source produces a [`PartialConfig`]; they are merged and then
//! resolved into a complete [`DeployConfig`].
//!
//! ## Answers File
//!
//! ```yaml
//! repo_url: https://github.com/acme/web.git
//! branch: release
//! ssh_user: ubuntu
//! ssh_host: 203.0.113.10
//! ssh_key: ~/.ssh/deploy
//! app_port: 8080
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::defaults;
use crate::error::{Error, Result};
use crate::git;

/// Configuration values from a single source. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub repo_url: Option<String>,
    pub token: Option<String>,
    pub branch: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_key: Option<String>,
    pub app_port: Option<u16>,
}

impl PartialConfig {
    /// Parse an answers file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse answers from a YAML string. An empty document yields no values.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Fill the fields missing from `self` with values from `fallback`.
    pub fn or(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            repo_url: self.repo_url.or(fallback.repo_url),
            token: self.token.or(fallback.token),
            branch: self.branch.or(fallback.branch),
            ssh_user: self.ssh_user.or(fallback.ssh_user),
            ssh_host: self.ssh_host.or(fallback.ssh_host),
            ssh_key: self.ssh_key.or(fallback.ssh_key),
            app_port: self.app_port.or(fallback.app_port),
        }
    }

    /// Resolve into a complete configuration without asking anyone.
    ///
    /// Only the branch and the token have defaults; any other missing value
    /// is a configuration error.
    pub fn resolve(self) -> Result<DeployConfig> {
        let config = DeployConfig {
            repo_url: required(self.repo_url, "repo_url", "--repo-url")?,
            token: self.token.filter(|t| !t.trim().is_empty()),
            branch: normalize_branch(self.branch.as_deref()),
            ssh_user: required(self.ssh_user, "ssh_user", "--ssh-user")?,
            ssh_host: required(self.ssh_host, "ssh_host", "--ssh-host")?,
            ssh_key: expand_home(&required(self.ssh_key, "ssh_key", "--ssh-key")?),
            app_port: self.app_port.ok_or_else(|| missing("app_port", "--port"))?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// The complete configuration of one deploy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub repo_url: String,
    pub token: Option<String>,
    pub branch: String,
    pub ssh_user: String,
    pub ssh_host: String,
    pub ssh_key: PathBuf,
    pub app_port: u16,
}

impl DeployConfig {
    /// Name used for the local clone, the remote directory, the image and
    /// the container.
    ///
    /// The name ends up in remote shell commands and Docker object names,
    /// so it must start with a lowercase letter or digit and hold only
    /// those plus `.`, `_` and `-`.
    pub fn app_name(&self) -> Result<String> {
        let name = git::repo_name(&self.repo_url)?.to_lowercase();
        if is_valid_app_name(&name) {
            Ok(name)
        } else {
            Err(Error::Config {
                message: format!(
                    "Repository name '{}' cannot be used as an application name",
                    name
                ),
                hint: Some(
                    "Use a repository whose name has only letters, digits, '.', '_' and '-'"
                        .to_string(),
                ),
            })
        }
    }

    /// Check presence and sanity of every value.
    pub fn validate(&self) -> Result<()> {
        if self.repo_url.trim().is_empty() {
            return Err(missing("repo_url", "--repo-url"));
        }
        if self.ssh_user.trim().is_empty() {
            return Err(missing("ssh_user", "--ssh-user"));
        }
        if self.ssh_host.trim().is_empty() {
            return Err(missing("ssh_host", "--ssh-host"));
        }
        if self.app_port == 0 {
            return Err(Error::Config {
                message: "app_port must be between 1 and 65535".to_string(),
                hint: None,
            });
        }
        self.app_name()?;
        if !self.ssh_key.is_file() {
            return Err(Error::Config {
                message: format!("SSH key not found: {}", self.ssh_key.display()),
                hint: Some("Pass the private key used to log in with --ssh-key".to_string()),
            });
        }
        Ok(())
    }
}

/// The branch to deploy: the given one, or `main` when it is omitted or
/// blank.
pub fn normalize_branch(branch: Option<&str>) -> String {
    match branch.map(str::trim) {
        Some(b) if !b.is_empty() => b.to_string(),
        _ => defaults::BRANCH.to_string(),
    }
}

/// Parse a port number typed by the operator.
pub fn parse_port(input: &str) -> Result<u16> {
    match input.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(Error::Config {
            message: format!("'{}' is not a valid port", input.trim()),
            hint: Some("Use a number between 1 and 65535".to_string()),
        }),
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn required(value: Option<String>, field: &str, flag: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(field, flag))
}

fn is_valid_app_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first.is_ascii_digit() => chars
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')),
        _ => false,
    }
}

fn missing(field: &str, flag: &str) -> Error {
    Error::Config {
        message: format!("{} is required", field),
        hint: Some(format!(
            "Pass {}, set it in the answers file, or run without --non-interactive",
            flag
        )),
    }
}
