//! # Remote Session
//!
//! An authenticated command-execution channel to the target host. There is
//! no persistent connection: every remote command is one `ssh` invocation
//! with the same options, and file transfer goes through `rsync` over the
//! same `ssh` command line.
//!
//! SSH runs in batch mode, so a missing or rejected key fails immediately
//! instead of waiting for a password prompt.

use std::path::{Path, PathBuf};

use log::info;

use crate::config::DeployConfig;
use crate::defaults;
use crate::error::{Error, Result};
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};

/// Connection details plus the runner used to reach the host.
pub struct RemoteSession<'a> {
    runner: &'a dyn CommandRunner,
    user: String,
    host: String,
    key: PathBuf,
    connect_timeout: u64,
}

impl<'a> RemoteSession<'a> {
    /// Create a session for `user@host` that logs in with `key`.
    ///
    /// # Arguments
    /// * `runner` - Runs the `ssh` and `rsync` commands
    /// * `user` - Login name on the host
    /// * `host` - Host name or IP address
    /// * `key` - Private key passed to `ssh -i`
    ///
    /// The connect timeout starts at the default; see
    /// [`RemoteSession::with_connect_timeout`].
    pub fn new(
        runner: &'a dyn CommandRunner,
        user: impl Into<String>,
        host: impl Into<String>,
        key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            user: user.into(),
            host: host.into(),
            key: key.into(),
            connect_timeout: defaults::CONNECT_TIMEOUT_SECS,
        }
    }

    /// Session for the host named in `config`.
    pub fn from_config(runner: &'a dyn CommandRunner, config: &DeployConfig) -> Self {
        Self::new(
            runner,
            config.ssh_user.clone(),
            config.ssh_host.clone(),
            config.ssh_key.clone(),
        )
    }

    /// Give up on the SSH connection after `secs` seconds.
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout = secs;
        self
    }

    /// `user@host`
    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Login name on the host.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Options shared by every `ssh` invocation, without the target.
    pub fn ssh_options(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.key.display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
        ]
    }

    /// The `ssh` invocation running `command` on the host.
    pub fn command(&self, command: &str) -> CommandSpec {
        CommandSpec::new("ssh")
            .args(self.ssh_options())
            .arg(self.target())
            .arg(command)
    }

    /// Verify the host accepts our key and runs commands.
    ///
    /// Any failure, including `ssh` itself missing, is reported as
    /// [`Error::RemoteUnreachable`].
    pub fn check_connectivity(&self) -> Result<()> {
        let result = self.runner.run(&self.command("true"));
        let message = match result {
            Ok(output) if output.success() => return Ok(()),
            Ok(output) => {
                let stderr = output.stderr.trim();
                if stderr.is_empty() {
                    format!(
                        "ssh exited with {}",
                        output
                            .code
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "a signal".to_string())
                    )
                } else {
                    stderr.to_string()
                }
            }
            Err(e) => e.to_string(),
        };
        Err(Error::RemoteUnreachable {
            target: self.target(),
            message,
        })
    }

    /// Run one shell command on the host; a non-zero exit aborts the run.
    pub fn exec(&self, command: &str) -> Result<CommandOutput> {
        info!("[{}] {}", self.host, command);
        self.runner.run_checked(&self.command(command))
    }

    /// Run one shell command on the host and report whether it exited zero.
    ///
    /// Fails only when `ssh` could not be started.
    pub fn probe(&self, command: &str) -> Result<bool> {
        info!("[{}] {}", self.host, command);
        Ok(self.runner.run(&self.command(command))?.success())
    }

    /// Run one shell command on the host with `data` on its stdin.
    pub fn exec_with_stdin(&self, command: &str, data: &str) -> Result<CommandOutput> {
        info!("[{}] {} (with {} bytes on stdin)", self.host, command, data.len());
        self.runner
            .run_checked(&self.command(command).stdin(data))
    }

    /// Mirror `local` into `remote` on the host, excluding `.git`.
    pub fn upload_dir(&self, local: &Path, remote: &str) -> Result<()> {
        self.exec(&format!("mkdir -p {}", remote))?;

        let ssh = std::iter::once("ssh".to_string())
            .chain(self.ssh_options())
            .collect::<Vec<_>>()
            .join(" ");
        let source = format!("{}/", local.display().to_string().trim_end_matches('/'));
        let destination = format!("{}:{}/", self.target(), remote);

        info!("Uploading {} to {}", source, destination);
        self.runner.run_checked(
            &CommandSpec::new("rsync")
                .args(["-az", "--delete", "--exclude", ".git", "-e"])
                .arg(ssh)
                .arg(source)
                .arg(destination),
        )?;
        Ok(())
    }
}

/// Remote directory the application is deployed into.
pub fn app_dir(app_name: &str) -> String {
    format!("~/{}", app_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;

    fn session(runner: &RecordingRunner) -> RemoteSession<'_> {
        RemoteSession::new(runner, "ubuntu", "203.0.113.10", "/keys/deploy")
    }

    #[test]
    fn test_command_line() {
        let runner = RecordingRunner::new();
        let cmd = session(&runner).command("uptime");
        assert_eq!(
            cmd.display(),
            "ssh -i /keys/deploy -o BatchMode=yes -o StrictHostKeyChecking=accept-new \
             -o ConnectTimeout=10 ubuntu@203.0.113.10 uptime"
        );
    }

    #[test]
    fn test_connect_timeout_override() {
        let runner = RecordingRunner::new();
        let session = session(&runner).with_connect_timeout(3);
        assert!(session.ssh_options().contains(&"ConnectTimeout=3".to_string()));
    }

    #[test]
    fn test_check_connectivity_ok() {
        let runner = RecordingRunner::new();
        session(&runner).check_connectivity().unwrap();
        assert_eq!(runner.lines().len(), 1);
        assert!(runner.lines()[0].ends_with("ubuntu@203.0.113.10 true"));
    }

    #[test]
    fn test_check_connectivity_failure_is_exit_20() {
        let runner = RecordingRunner::new().fail_when("ubuntu@203.0.113.10 true", 255);
        let err = session(&runner).check_connectivity().unwrap_err();
        assert!(matches!(err, Error::RemoteUnreachable { .. }));
        assert_eq!(err.exit_code(), 20);
        assert!(err.to_string().contains("simulated failure"));
    }

    #[test]
    fn test_check_connectivity_spawn_failure_is_exit_20() {
        let runner = RecordingRunner::new().unspawnable_ssh();
        let err = session(&runner).check_connectivity().unwrap_err();
        assert_eq!(err.exit_code(), 20);
    }

    #[test]
    fn test_exec_failure_propagates_code() {
        let runner = RecordingRunner::new().fail_when("apt-get", 100);
        let err = session(&runner).exec("sudo apt-get update -y").unwrap_err();
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn test_probe_reports_failure_without_error() {
        let runner = RecordingRunner::new().fail_when("curl", 7);
        assert!(!session(&runner).probe("curl -fsS http://localhost").unwrap());
        assert!(session(&runner).probe("true").unwrap());
    }

    #[test]
    fn test_exec_with_stdin_passes_payload() {
        let runner = RecordingRunner::new();
        session(&runner)
            .exec_with_stdin("sudo tee /etc/x", "hello")
            .unwrap();
        assert_eq!(runner.calls()[0].stdin.as_deref(), Some("hello"));
    }

    #[test]
    fn test_upload_dir() {
        let runner = RecordingRunner::new();
        session(&runner)
            .upload_dir(Path::new("/work/web/"), "~/web")
            .unwrap();

        let lines = runner.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("'mkdir -p ~/web'"));
        assert!(lines[1].starts_with("rsync -az --delete --exclude .git -e 'ssh -i /keys/deploy"));
        assert!(lines[1].ends_with("/work/web/ ubuntu@203.0.113.10:~/web/"));
    }

    #[test]
    fn test_app_dir() {
        assert_eq!(app_dir("web"), "~/web");
    }
}
