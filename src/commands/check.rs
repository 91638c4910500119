//! # Check Command Implementation
//!
//! This module implements the `check` subcommand, which re-runs the
//! post-deploy validation against a host that was deployed earlier. It
//! needs no local clone and changes nothing on the host.

use anyhow::Result;
use clap::Args;

use hostdeploy::defaults;
use hostdeploy::output::emoji;
use hostdeploy::prompt::Scope;
use hostdeploy::workflow::{self, CHECK_STEPS};

use super::{ConnectionArgs, GlobalOptions};

/// Validate an existing deployment
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Execute the `check` command.
///
/// Fails with the validation error when any check does not pass.
pub fn execute(args: CheckArgs, globals: &GlobalOptions) -> Result<()> {
    let log_path = globals.start_log()?;
    globals.header("hostdeploy check", &log_path, args.connection.dry_run);

    let config = args.connection.load(Scope::Remote)?;
    let options = args.connection.run_options(defaults::default_workdir());
    let runner = args.connection.runner();

    let mut progress = globals.progress(CHECK_STEPS);
    let report = workflow::check(runner.as_ref(), &config, &options, &mut progress)?;

    println!();
    println!(
        "{} All {} checks passed on {}",
        emoji(&globals.output, "✅", "[OK]"),
        report.outcomes.len(),
        config.ssh_host
    );
    Ok(())
}
