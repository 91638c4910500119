//! Cleanup command implementation
//!
//! Removes what `deploy` created on the remote host: the container or
//! compose stack with its images, the Nginx site and the project
//! directory. Docker and Nginx themselves stay installed.

use anyhow::Result;
use clap::Args;

use hostdeploy::defaults;
use hostdeploy::output::emoji;
use hostdeploy::prompt::Scope;
use hostdeploy::workflow::{self, CLEANUP_STEPS};

use super::{ConnectionArgs, GlobalOptions};

/// Arguments for the cleanup command
#[derive(Args, Debug)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Execute the cleanup command
pub fn execute(args: CleanupArgs, globals: &GlobalOptions) -> Result<()> {
    let log_path = globals.start_log()?;
    globals.header("hostdeploy cleanup", &log_path, args.connection.dry_run);

    let config = args.connection.load(Scope::Remote)?;
    let options = args.connection.run_options(defaults::default_workdir());
    let runner = args.connection.runner();

    let mut progress = globals.progress(CLEANUP_STEPS);
    workflow::cleanup(runner.as_ref(), &config, &options, &mut progress)?;

    println!();
    println!(
        "{} Removed {} from {}",
        emoji(&globals.output, "🧹", "[OK]"),
        config.app_name()?,
        config.ssh_host
    );
    Ok(())
}
