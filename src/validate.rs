//! Post-deploy validation.
//!
//! A fixed list of status and health commands is run on the remote host.
//! Each check passes when its command exits zero. Every check runs even
//! after one fails so the report is complete; the run fails afterwards if
//! any check did not pass.

use log::{info, warn};

use crate::deploy::Target;
use crate::error::{Error, Result};
use crate::remote::RemoteSession;

/// One named check and the remote command that decides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub command: String,
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
}

/// Outcomes of all checks, in the order they ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failed(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.name.to_string())
            .collect()
    }

    /// `Ok` when every check passed, otherwise [`Error::Validation`].
    pub fn into_result(self) -> Result<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(Error::Validation {
                failed: self.failed(),
            })
        }
    }
}

/// The checks for a deployed `target`.
pub fn checks(target: &Target) -> Vec<Check> {
    let container = if target.compose {
        format!(
            "cd {} && sudo docker-compose ps -q | grep -q .",
            target.remote_dir()
        )
    } else {
        format!(
            "sudo docker ps -q --filter name=^{}$ | grep -q .",
            target.app_name
        )
    };

    vec![
        Check {
            name: "docker service",
            command: "sudo systemctl is-active --quiet docker".to_string(),
        },
        Check {
            name: "nginx service",
            command: "sudo systemctl is-active --quiet nginx".to_string(),
        },
        Check {
            name: "container running",
            command: container,
        },
        Check {
            name: "app responds",
            command: format!("curl -fsS -o /dev/null http://localhost:{}", target.port),
        },
        Check {
            name: "proxy responds",
            command: "curl -fsS -o /dev/null http://localhost".to_string(),
        },
    ]
}

/// Run every check and collect the outcomes.
///
/// Only a failure to start `ssh` is an error here; failed checks are
/// recorded in the report.
pub fn run(session: &RemoteSession<'_>, target: &Target) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    for check in checks(target) {
        let passed = session.probe(&check.command)?;
        if passed {
            info!("check passed: {}", check.name);
        } else {
            warn!("check failed: {}", check.name);
        }
        report.outcomes.push(CheckOutcome {
            name: check.name,
            passed,
        });
    }
    Ok(report)
}
