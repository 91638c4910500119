//! Deploy command implementation
//!
//! The deploy command runs the whole pipeline against one host:
//! 1. Collect the configuration (flags, answers file, prompts)
//! 2. Clone or pull the repository
//! 3. Detect the container manifest
//! 4. Provision Docker, docker-compose and Nginx on the host
//! 5. Transfer, build and start the application
//! 6. Put Nginx in front of it and validate the result

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use hostdeploy::defaults;
use hostdeploy::output::emoji;
use hostdeploy::prompt::Scope;
use hostdeploy::workflow::{self, DEPLOY_STEPS};

use super::{ConnectionArgs, GlobalOptions};

/// Arguments for the deploy command
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Directory the repository is cloned into (defaults to current directory)
    #[arg(short, long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,
}

/// Execute the deploy command
pub fn execute(args: DeployArgs, globals: &GlobalOptions) -> Result<()> {
    let start_time = Instant::now();
    let log_path = globals.start_log()?;
    globals.header("hostdeploy deploy", &log_path, args.connection.dry_run);

    let config = args.connection.load(Scope::Full)?;
    let workdir = args.workdir.clone().unwrap_or_else(defaults::default_workdir);
    let options = args.connection.run_options(workdir);
    let runner = args.connection.runner();

    let mut progress = globals.progress(DEPLOY_STEPS);
    let summary = workflow::deploy(runner.as_ref(), &config, &options, &mut progress)?;

    let out = &globals.output;
    println!();
    println!(
        "{} Deployed {} in {:.2}s",
        emoji(out, "✅", "[OK]"),
        summary.app_name,
        start_time.elapsed().as_secs_f64()
    );
    println!("   Strategy: {}", summary.manifest.strategy());
    for version in &summary.versions {
        println!("   {}", version);
    }
    println!("   Application: {}", summary.url);
    log::info!("deployment of {} finished", summary.app_name);
    Ok(())
}
