//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hostdeploy::defaults;
use hostdeploy::output::OutputConfig;

use crate::commands::{self, GlobalOptions};

/// Host Deploy - Deploy a containerized repository to a remote host behind Nginx
#[derive(Parser, Debug)]
#[command(name = "hostdeploy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Directory the run log is written to (defaults to current directory)
    #[arg(long, global = true, value_name = "DIR", env = "HOSTDEPLOY_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Echo the run log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone the repository and deploy it to the remote host
    Deploy(commands::deploy::DeployArgs),

    /// Remove a deployment from the remote host
    Cleanup(commands::cleanup::CleanupArgs),

    /// Validate an existing deployment
    Check(commands::check::CheckArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    fn globals(&self) -> GlobalOptions {
        GlobalOptions {
            output: OutputConfig::from_env_and_flag(&self.color),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone().unwrap_or_else(defaults::default_log_dir),
            verbose: self.verbose,
        }
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let globals = self.globals();
        match self.command {
            Commands::Deploy(args) => commands::deploy::execute(args, &globals),
            Commands::Cleanup(args) => commands::cleanup::execute(args, &globals),
            Commands::Check(args) => commands::check::execute(args, &globals),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deploy_flags_parse() {
        let cli = Cli::try_parse_from([
            "hostdeploy",
            "--color",
            "never",
            "deploy",
            "--repo-url",
            "https://github.com/acme/web.git",
            "--ssh-host",
            "10.0.0.5",
            "--port",
            "8080",
            "--non-interactive",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.color, "never");
        match cli.command {
            Commands::Deploy(args) => {
                assert_eq!(args.connection.port, Some(8080));
                assert_eq!(args.connection.ssh_host.as_deref(), Some("10.0.0.5"));
                assert!(args.connection.non_interactive);
                assert!(args.connection.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_port_zero_is_rejected() {
        let result = Cli::try_parse_from(["hostdeploy", "check", "--port", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hostdeploy", "cleanup", "--verbose", "--log-level", "debug"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_level, "debug");
    }
}
