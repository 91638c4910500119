//! Shared test utilities for E2E tests.
//!
//! The binary only talks to the outside world through `git`, `ssh` and
//! `rsync`. The fixture puts shell-script stand-ins for them in a `bin/`
//! directory at the front of `PATH`, so a whole deploy runs against a fake
//! host. The fake `ssh` appends its arguments and stdin to `ssh.log`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_fake_tools()
//!         .with_clone(&[("Dockerfile", "FROM nginx\n")]);
//!     fixture.deploy_command().assert().success();
//! }
//! ```

#![cfg(unix)]

use assert_fs::prelude::*;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::scripts;
    pub use super::TestFixture;
}

/// Bodies for the fake tools.
#[allow(dead_code)]
pub mod scripts {
    /// Succeed without doing anything.
    pub const SUCCEED: &str = "exit 0\n";

    /// Record the arguments and stdin, then succeed.
    pub const RECORDING_SSH: &str = r#"echo "ssh $*" >> "$FAKE_SSH_LOG"
cat >> "$FAKE_SSH_LOG"
exit 0
"#;

    /// Fail the way ssh does when the host does not answer.
    pub const UNREACHABLE_SSH: &str = r#"echo "ssh: connect to host $FAKE_HOST port 22: Connection timed out" >&2
exit 255
"#;

    /// Record, then fail the image build with exit code 17.
    pub const FAILING_BUILD_SSH: &str = r#"echo "ssh $*" >> "$FAKE_SSH_LOG"
case "$*" in
  *"docker build"*) echo "build failed" >&2; exit 17 ;;
esac
exit 0
"#;
}

/// Repository URL used by every fixture command.
pub const REPO_URL: &str = "https://github.com/acme/web.git";

/// A temporary directory with fake tools, a work directory, a log
/// directory and an SSH key file.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new fixture with empty `bin/`, `work/` and `logs/`.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        for dir in ["bin", "work", "logs"] {
            temp_dir
                .child(dir)
                .create_dir_all()
                .expect("Failed to create directory");
        }
        temp_dir
            .child("id_test")
            .write_str("not really a key\n")
            .expect("Failed to write key file");
        Self { temp_dir }
    }

    /// Install an executable `bin/<name>` running `body` under `/bin/sh`.
    pub fn with_tool(self, name: &str, body: &str) -> Self {
        let path = self.bin_dir().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("Failed to write fake tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake tool executable");
        self
    }

    /// Install `git`, `rsync` and a recording `ssh` that all succeed.
    pub fn with_fake_tools(self) -> Self {
        self.with_tool("git", scripts::SUCCEED)
            .with_tool("rsync", scripts::SUCCEED)
            .with_tool("ssh", scripts::RECORDING_SSH)
    }

    /// Pretend an earlier run cloned the repository into `work/web`.
    pub fn with_clone(self, files: &[(&str, &str)]) -> Self {
        let clone = self.temp_dir.child("work/web");
        clone
            .child(".git")
            .create_dir_all()
            .expect("Failed to create .git");
        for (name, content) in files {
            clone
                .child(name)
                .write_str(content)
                .expect("Failed to write clone file");
        }
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path().join("bin")
    }

    pub fn key_path(&self) -> PathBuf {
        self.path().join("id_test")
    }

    pub fn clone_dir(&self) -> PathBuf {
        self.path().join("work/web")
    }

    /// Everything the fake `ssh` was given, or an empty string.
    pub fn ssh_log(&self) -> String {
        fs::read_to_string(self.path().join("ssh.log")).unwrap_or_default()
    }

    /// Contents of the run logs written so far.
    pub fn run_logs(&self) -> Vec<String> {
        let mut logs = Vec::new();
        if let Ok(entries) = fs::read_dir(self.path().join("logs")) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with("deploy_") && name.ends_with(".log") {
                    logs.push(fs::read_to_string(entry.path()).unwrap_or_default());
                }
            }
        }
        logs
    }

    /// Create a command running in this fixture with the fake tools first
    /// on `PATH` and no `HOSTDEPLOY_*` variables inherited.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hostdeploy");
        let path = match env::var_os("PATH") {
            Some(existing) => {
                let mut dirs = vec![self.bin_dir()];
                dirs.extend(env::split_paths(&existing));
                env::join_paths(dirs).expect("Failed to build PATH")
            }
            None => self.bin_dir().into_os_string(),
        };
        cmd.current_dir(self.path())
            .env("PATH", path)
            .env("FAKE_SSH_LOG", self.path().join("ssh.log"))
            .env("FAKE_HOST", "203.0.113.10")
            .env_remove("CLICOLOR_FORCE");
        for (key, _) in env::vars_os() {
            if key.to_string_lossy().starts_with("HOSTDEPLOY_") {
                cmd.env_remove(key);
            }
        }
        cmd
    }

    /// `command` with a subcommand and every connection flag given.
    pub fn remote_command(&self, subcommand: &str) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg(subcommand)
            .args(["--repo-url", REPO_URL])
            .args(["--ssh-user", "ubuntu"])
            .args(["--ssh-host", "203.0.113.10"])
            .arg("--ssh-key")
            .arg(self.key_path())
            .args(["--port", "8080"])
            .args(["--connect-timeout", "2"])
            .arg("--log-dir")
            .arg(self.path().join("logs"))
            .arg("--non-interactive");
        cmd
    }

    /// A non-interactive deploy into `work/`.
    pub fn deploy_command(&self) -> assert_cmd::Command {
        let mut cmd = self.remote_command("deploy");
        cmd.arg("--workdir").arg(self.path().join("work"));
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_layout() {
        let fixture = TestFixture::new();
        assert!(fixture.bin_dir().is_dir());
        assert!(fixture.key_path().is_file());
    }

    #[test]
    fn test_fake_tools_are_executable() {
        let fixture = TestFixture::new().with_fake_tools();
        for tool in ["git", "ssh", "rsync"] {
            let mode = fs::metadata(fixture.bin_dir().join(tool))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_with_clone_creates_checkout() {
        let fixture = TestFixture::new().with_clone(&[("Dockerfile", "FROM nginx\n")]);
        assert!(fixture.clone_dir().join(".git").is_dir());
        assert!(fixture.clone_dir().join("Dockerfile").is_file());
    }
}
