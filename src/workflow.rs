//! # Run Orchestration
//!
//! Strings the modules together into the three runs the binary offers.
//!
//! ## Deploy
//!
//! 1. Check that `git`, `ssh` and `rsync` are installed locally
//! 2. Clone or pull the repository
//! 3. Detect the container manifest (exit code 10 when there is none)
//! 4. Write a default dependency list if the Dockerfile needs one
//! 5. Check SSH connectivity (exit code 20 when the host is unreachable)
//! 6. Install Docker, docker-compose and Nginx
//! 7. Transfer the project
//! 8. Build and start the application
//! 9. Configure the Nginx reverse proxy
//! 10. Validate the deployment
//!
//! Every step is strictly sequential and the first failure ends the run.
//!
//! ## Cleanup and Check
//!
//! Both work without a local clone: the deployment strategy is read from
//! the project directory on the host.

use std::path::{Path, PathBuf};

use log::info;

use crate::config::DeployConfig;
use crate::defaults;
use crate::deploy::{self, Target};
use crate::error::{Error, Result};
use crate::git::{self, SyncAction};
use crate::manifest::{self, Manifest};
use crate::output::Progress;
use crate::provision::{self, Versions};
use crate::proxy;
use crate::remote::{app_dir, RemoteSession};
use crate::runner::CommandRunner;
use crate::validate::{self, ValidationReport};

/// Number of steps in [`deploy`].
pub const DEPLOY_STEPS: usize = 10;
/// Number of steps in [`cleanup`].
pub const CLEANUP_STEPS: usize = 4;
/// Number of steps in [`check`].
pub const CHECK_STEPS: usize = 3;

/// Settings shared by every run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory the repository is cloned into.
    pub workdir: PathBuf,
    /// SSH connect timeout in seconds.
    pub connect_timeout: u64,
    /// Look up the local tools before starting. Off for dry runs.
    pub check_tools: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workdir: defaults::default_workdir(),
            connect_timeout: defaults::CONNECT_TIMEOUT_SECS,
            check_tools: true,
        }
    }
}

/// What a successful deploy did.
#[derive(Debug, Clone)]
pub struct DeploySummary {
    pub app_name: String,
    pub clone_dir: PathBuf,
    pub sync: SyncAction,
    pub manifest: Manifest,
    /// Dependency list written by this run, if any.
    pub dependency_list: Option<PathBuf>,
    pub versions: Versions,
    pub report: ValidationReport,
    /// Where the application is served through the proxy.
    pub url: String,
}

/// Run `action` as the next step of `progress`.
///
/// `describe` turns the result into the line printed when the step
/// succeeds.
fn step<T>(
    progress: &mut Progress,
    title: &str,
    action: impl FnOnce() -> Result<T>,
    describe: impl FnOnce(&T) -> String,
) -> Result<T> {
    progress.start(title);
    match action() {
        Ok(value) => {
            progress.finish(&describe(&value));
            Ok(value)
        }
        Err(e) => {
            progress.fail();
            Err(e)
        }
    }
}

/// Fail with [`Error::ToolNotFound`] for the first tool not on `PATH`.
pub fn check_tools(tools: &[&str]) -> Result<()> {
    for tool in tools {
        let path = which::which(tool).map_err(|_| Error::ToolNotFound {
            tool: tool.to_string(),
        })?;
        info!("found {} at {}", tool, path.display());
    }
    Ok(())
}

/// Whether the project directory on the host holds a compose file.
pub fn remote_uses_compose(session: &RemoteSession<'_>, app_name: &str) -> Result<bool> {
    let dir = app_dir(app_name);
    let test = manifest::COMPOSE_FILES
        .iter()
        .map(|file| format!("-f {}/{}", dir, file))
        .collect::<Vec<_>>()
        .join(" -o ");
    session.probe(&format!("test {}", test))
}

fn print_report(progress: &Progress, report: &ValidationReport) {
    for outcome in &report.outcomes {
        let mark = if outcome.passed { "ok  " } else { "FAIL" };
        progress.note(&format!("{} {}", mark, outcome.name));
    }
}

fn open_session<'a>(
    runner: &'a dyn CommandRunner,
    config: &DeployConfig,
    options: &RunOptions,
) -> RemoteSession<'a> {
    RemoteSession::from_config(runner, config).with_connect_timeout(options.connect_timeout)
}

fn connect(progress: &mut Progress, session: &RemoteSession<'_>) -> Result<()> {
    step(
        progress,
        "Checking SSH connectivity",
        || session.check_connectivity(),
        |_| format!("{} is reachable", session.target()),
    )
}

/// Deploy the repository in `config` to its host.
pub fn deploy(
    runner: &dyn CommandRunner,
    config: &DeployConfig,
    options: &RunOptions,
    progress: &mut Progress,
) -> Result<DeploySummary> {
    let app_name = config.app_name()?;
    let session = open_session(runner, config, options);

    step(
        progress,
        "Checking local tools",
        || {
            if options.check_tools {
                check_tools(defaults::REQUIRED_TOOLS).map(|_| true)
            } else {
                Ok(false)
            }
        },
        |checked| {
            if *checked {
                format!("Found {}", defaults::REQUIRED_TOOLS.join(", "))
            } else {
                "Skipped local tool check".to_string()
            }
        },
    )?;

    let (clone_dir, sync) = step(
        progress,
        "Syncing repository",
        || git::sync(runner, config, &options.workdir),
        |(dir, action)| match action {
            SyncAction::Cloned => format!("Cloned {} into {}", config.branch, dir.display()),
            SyncAction::Pulled => format!("Pulled {} in {}", config.branch, dir.display()),
        },
    )?;

    let manifest = step(
        progress,
        "Detecting container manifest",
        || manifest::detect(&clone_dir),
        |m| format!("Found {} ({})", file_name(m.path()), m.strategy()),
    )?;

    let dependency_list = step(
        progress,
        "Checking dependency list",
        || manifest::ensure_dependency_list(&clone_dir, &manifest),
        |written| match written {
            Some(path) => format!("Wrote default {}", file_name(path)),
            None => "Nothing to add".to_string(),
        },
    )?;

    connect(progress, &session)?;

    let versions = step(
        progress,
        "Provisioning remote host",
        || provision::run(&session),
        |versions| {
            if versions.is_empty() {
                "Installed Docker, docker-compose and Nginx".to_string()
            } else {
                versions.join("; ")
            }
        },
    )?;

    let target = Target::new(app_name.clone(), config.app_port, &manifest);
    step(
        progress,
        "Transferring project",
        || session.upload_dir(&clone_dir, &target.remote_dir()),
        |_| format!("Copied to {}:{}", session.target(), target.remote_dir()),
    )?;

    step(
        progress,
        "Deploying application",
        || deploy::run(&session, &target),
        |_| format!("Started {} ({})", app_name, manifest.strategy()),
    )?;

    step(
        progress,
        "Configuring Nginx",
        || proxy::configure(&session, config.app_port),
        |_| format!("Port 80 forwards to localhost:{}", config.app_port),
    )?;

    let report = validate_step(progress, &session, &target)?;

    Ok(DeploySummary {
        app_name,
        clone_dir,
        sync,
        manifest,
        dependency_list,
        versions,
        report,
        url: format!("http://{}", config.ssh_host),
    })
}

fn validate_step(
    progress: &mut Progress,
    session: &RemoteSession<'_>,
    target: &Target,
) -> Result<ValidationReport> {
    progress.start("Validating deployment");
    let report = match validate::run(session, target) {
        Ok(report) => report,
        Err(e) => {
            progress.fail();
            return Err(e);
        }
    };
    if report.passed() {
        progress.finish(&format!("{} checks passed", report.outcomes.len()));
    } else {
        progress.fail();
    }
    print_report(progress, &report);
    report.into_result()
}

/// Remove a deployment: containers, images, proxy site and project files.
///
/// Packages installed by provisioning stay on the host.
pub fn cleanup(
    runner: &dyn CommandRunner,
    config: &DeployConfig,
    options: &RunOptions,
    progress: &mut Progress,
) -> Result<()> {
    let app_name = config.app_name()?;
    let session = open_session(runner, config, options);

    connect(progress, &session)?;

    let target = step(
        progress,
        "Stopping application",
        || {
            let target = Target {
                app_name: app_name.clone(),
                port: config.app_port,
                compose: remote_uses_compose(&session, &app_name)?,
            };
            for command in deploy::teardown_commands(&target) {
                session.exec(&command)?;
            }
            Ok(target)
        },
        |target| format!("Removed {}", target.app_name),
    )?;

    step(
        progress,
        "Removing Nginx site",
        || {
            for command in proxy::removal_commands() {
                session.exec(&command)?;
            }
            Ok(())
        },
        |_| format!("Removed {}", defaults::NGINX_SITE_PATH),
    )?;

    step(
        progress,
        "Removing project files",
        || session.exec(&format!("rm -rf {}", target.remote_dir())).map(|_| ()),
        |_| format!("Removed {}:{}", session.target(), target.remote_dir()),
    )?;

    Ok(())
}

/// Run the validation checks against an existing deployment.
pub fn check(
    runner: &dyn CommandRunner,
    config: &DeployConfig,
    options: &RunOptions,
    progress: &mut Progress,
) -> Result<ValidationReport> {
    let app_name = config.app_name()?;
    let session = open_session(runner, config, options);

    connect(progress, &session)?;

    let target = step(
        progress,
        "Detecting deployment",
        || {
            Ok(Target {
                app_name: app_name.clone(),
                port: config.app_port,
                compose: remote_uses_compose(&session, &app_name)?,
            })
        },
        |target| {
            let strategy = if target.compose {
                "docker-compose"
            } else {
                "single container"
            };
            format!("{} ({})", target.app_name, strategy)
        },
    )?;

    validate_step(progress, &session, &target)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
