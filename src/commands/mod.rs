//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `hostdeploy` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `hostdeploy` library.
//!
//! The connection flags shared by `deploy`, `cleanup` and `check` live in
//! [`ConnectionArgs`] here, together with the loading of the configuration
//! they describe.

pub mod check;
pub mod cleanup;
pub mod completions;
pub mod deploy;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hostdeploy::config::{DeployConfig, PartialConfig};
use hostdeploy::defaults;
use hostdeploy::logging;
use hostdeploy::output::{emoji, OutputConfig, Progress};
use hostdeploy::prompt::{self, Scope, TerminalPrompter};
use hostdeploy::runner::{CommandRunner, DryRunRunner, SystemRunner};
use hostdeploy::workflow::RunOptions;

/// Options given before the subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub output: OutputConfig,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub verbose: bool,
}

impl GlobalOptions {
    /// Create the run log and install the logger.
    pub fn start_log(&self) -> Result<PathBuf> {
        let path = logging::init(&self.log_level, &self.log_dir, self.verbose)?;
        Ok(path)
    }

    /// Step reporting on stdout, with a spinner when stderr is a terminal.
    ///
    /// The spinner is off with `--verbose` since log records go to stderr.
    pub fn progress(&self, total: usize) -> Progress {
        let spinner = !self.verbose && console::Term::stderr().is_term();
        Progress::new(self.output.clone(), total, spinner)
    }

    /// Print the header shared by every run.
    pub fn header(&self, title: &str, log_path: &std::path::Path, dry_run: bool) {
        println!("{} {}", emoji(&self.output, "🚀", "==>"), title);
        println!("   Log file: {}", log_path.display());
        if dry_run {
            println!(
                "{} DRY RUN MODE - No commands will be run",
                emoji(&self.output, "🔎", "[DRY RUN]")
            );
        }
        println!();
    }
}

/// Connection and configuration flags shared by the remote commands.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// YAML answers file with any of the values below
    #[arg(short, long, value_name = "FILE", env = "HOSTDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Git repository URL
    #[arg(long, value_name = "URL", env = "HOSTDEPLOY_REPO_URL")]
    pub repo_url: Option<String>,

    /// Personal access token for a private repository
    #[arg(long, value_name = "TOKEN", env = "HOSTDEPLOY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Branch to deploy (defaults to main)
    #[arg(short, long, value_name = "BRANCH", env = "HOSTDEPLOY_BRANCH")]
    pub branch: Option<String>,

    /// Username on the remote host
    #[arg(long, value_name = "USER", env = "HOSTDEPLOY_SSH_USER")]
    pub ssh_user: Option<String>,

    /// Remote host name or IP address
    #[arg(long, value_name = "HOST", env = "HOSTDEPLOY_SSH_HOST")]
    pub ssh_host: Option<String>,

    /// SSH private key used to log in
    #[arg(long, value_name = "PATH", env = "HOSTDEPLOY_SSH_KEY")]
    pub ssh_key: Option<String>,

    /// Port the application listens on
    #[arg(
        short,
        long,
        value_name = "PORT",
        env = "HOSTDEPLOY_PORT",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: Option<u16>,

    /// Seconds to wait for the SSH connection
    #[arg(long, value_name = "SECS", default_value_t = defaults::CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// Fail instead of prompting for missing values
    #[arg(long)]
    pub non_interactive: bool,

    /// Log every command without running it
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl ConnectionArgs {
    fn from_flags(&self) -> PartialConfig {
        PartialConfig {
            repo_url: self.repo_url.clone(),
            token: self.token.clone(),
            branch: self.branch.clone(),
            ssh_user: self.ssh_user.clone(),
            ssh_host: self.ssh_host.clone(),
            ssh_key: self.ssh_key.clone(),
            app_port: self.port,
        }
    }

    /// Flags merged over the answers file, before any prompting.
    pub fn partial(&self) -> Result<PartialConfig> {
        let flags = self.from_flags();
        match &self.config {
            Some(path) => {
                let file = PartialConfig::from_file(path).with_context(|| {
                    format!("Failed to load answers file {}", path.display())
                })?;
                Ok(flags.or(file))
            }
            None => Ok(flags),
        }
    }

    /// The complete configuration, prompting for what is missing unless
    /// `--non-interactive` is set.
    pub fn load(&self, scope: Scope) -> Result<DeployConfig> {
        let partial = self.partial()?;
        let config = if self.non_interactive {
            partial.resolve()?
        } else {
            prompt::collect(partial, &TerminalPrompter::new(), scope)?
        };
        log::info!(
            "configuration: repo {} branch {} target {}@{} port {} token {}",
            config.repo_url,
            config.branch,
            config.ssh_user,
            config.ssh_host,
            config.app_port,
            if config.token.is_some() { "set" } else { "not set" }
        );
        Ok(config)
    }

    pub fn run_options(&self, workdir: PathBuf) -> RunOptions {
        RunOptions {
            workdir,
            connect_timeout: self.connect_timeout,
            check_tools: !self.dry_run,
        }
    }

    pub fn runner(&self) -> Box<dyn CommandRunner> {
        if self.dry_run {
            Box::new(DryRunRunner)
        } else {
            Box::new(SystemRunner)
        }
    }
}
