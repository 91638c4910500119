//! Remote provisioning: install Docker, Docker Compose and Nginx and make
//! sure their services run.
//!
//! The command list is fixed. Running it twice is harmless only because
//! `apt-get install` and `systemctl enable --now` are themselves idempotent.

use log::info;

use crate::error::Result;
use crate::remote::RemoteSession;

/// Packages installed on the remote host.
pub const PACKAGES: &[&str] = &["docker.io", "docker-compose", "nginx"];

/// Commands printing the installed versions.
pub const VERSION_COMMANDS: &[&str] = &[
    "docker --version",
    "docker-compose --version",
    "nginx -v 2>&1",
];

/// The provisioning commands for a host logged into as `user`, in order.
pub fn commands(user: &str) -> Vec<String> {
    vec![
        "sudo apt-get update -y".to_string(),
        format!(
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y {}",
            PACKAGES.join(" ")
        ),
        format!("sudo usermod -aG docker {}", user),
        "sudo systemctl enable --now docker".to_string(),
        "sudo systemctl enable --now nginx".to_string(),
    ]
}

/// Installed tool versions, one line per tool.
pub type Versions = Vec<String>;

/// Run the provisioning sequence, then collect the installed versions.
pub fn run(session: &RemoteSession<'_>) -> Result<Versions> {
    for command in commands(session.user()) {
        session.exec(&command)?;
    }

    let mut versions = Vec::new();
    for command in VERSION_COMMANDS {
        let output = session.exec(command)?;
        let line = output.stdout.lines().next().unwrap_or("").trim().to_string();
        if !line.is_empty() {
            info!("{}", line);
            versions.push(line);
        }
    }
    Ok(versions)
}
