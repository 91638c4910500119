//! Deployment: build and start the application on the remote host.
//!
//! Two fixed command sequences, chosen by the detected [`Manifest`]:
//!
//! - compose: tear down any previous stack, then `docker-compose up -d --build`;
//! - single container: remove any previous container, `docker build`, then
//!   `docker run` publishing the application port on the host.

use crate::error::Result;
use crate::manifest::Manifest;
use crate::remote::{app_dir, RemoteSession};

/// What to deploy and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Container and image name.
    pub app_name: String,
    /// Port the application listens on inside and outside the container.
    pub port: u16,
    /// Multi-container deployment through docker-compose.
    pub compose: bool,
}

impl Target {
    pub fn new(app_name: impl Into<String>, port: u16, manifest: &Manifest) -> Self {
        Self {
            app_name: app_name.into(),
            port,
            compose: manifest.is_compose(),
        }
    }

    pub fn remote_dir(&self) -> String {
        app_dir(&self.app_name)
    }

    pub fn image(&self) -> String {
        format!("{}:latest", self.app_name)
    }
}

/// Remote commands deploying `target`, in order.
pub fn commands(target: &Target) -> Vec<String> {
    let dir = target.remote_dir();
    if target.compose {
        vec![
            format!(
                "cd {} && (sudo docker-compose down --remove-orphans || true)",
                dir
            ),
            format!("cd {} && sudo docker-compose up -d --build", dir),
        ]
    } else {
        vec![
            format!("sudo docker rm -f {} || true", target.app_name),
            format!("cd {} && sudo docker build -t {} .", dir, target.image()),
            format!(
                "sudo docker run -d --name {name} --restart unless-stopped -p {port}:{port} {image}",
                name = target.app_name,
                port = target.port,
                image = target.image()
            ),
        ]
    }
}

/// Commands removing whatever [`commands`] started. They never fail.
pub fn teardown_commands(target: &Target) -> Vec<String> {
    let dir = target.remote_dir();
    if target.compose {
        vec![format!(
            "cd {} && (sudo docker-compose down --remove-orphans --rmi local || true)",
            dir
        )]
    } else {
        vec![
            format!("sudo docker rm -f {} || true", target.app_name),
            format!("sudo docker rmi {} || true", target.image()),
        ]
    }
}

/// Run the deployment sequence for `target`.
pub fn run(session: &RemoteSession<'_>, target: &Target) -> Result<()> {
    for command in commands(target) {
        session.exec(&command)?;
    }
    Ok(())
}
