//! # External Command Execution
//!
//! Every real operation hostdeploy performs is a call to an external binary:
//! `git` locally, `ssh` and `rsync` to reach the remote host. This module
//! defines the seam all of them go through.
//!
//! - **`CommandSpec`**: a program, its arguments, an optional working
//!   directory and stdin payload, plus secrets that must never be displayed.
//! - **`CommandRunner`**: runs a `CommandSpec`. `SystemRunner` spawns real
//!   processes, `DryRunRunner` only logs what would run. Tests use a
//!   recording fake so no step needs real `git` or `ssh`.
//!
//! Output of every command is captured and written to the run log, with
//! secrets (the repository access token) replaced by `****`.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::error::{Error, Result};

const REDACTED: &str = "****";

/// A single external command invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<String>,
    secrets: Vec<String>,
}

impl CommandSpec {
    /// Start a command line for `program`, looked up on `PATH`.
    ///
    /// # Example
    /// ```
    /// use hostdeploy::runner::CommandSpec;
    ///
    /// let cmd = CommandSpec::new("git")
    ///     .args(["clone", "https://tok@example.com/a/web.git"])
    ///     .secret("tok");
    /// assert_eq!(cmd.display(), "git clone https://****@example.com/a/web.git");
    /// ```
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append one argument. It is passed as is, never through a shell.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments in order.
    ///
    /// # Arguments
    /// * `args` - Anything iterable whose items convert into `String`
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command with `dir` as its working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Feed `data` to the command's stdin.
    pub fn stdin(mut self, data: impl Into<String>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    /// Mark a value that must be masked wherever this command is shown.
    ///
    /// Empty values are ignored.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    /// Replace every registered secret in `text` with a mask.
    pub fn redact(&self, text: &str) -> String {
        redact(text, &self.secrets)
    }

    /// Shell-like rendering of the command line, secrets masked.
    pub fn display(&self) -> String {
        let mut line = shell_quote(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        self.redact(&line)
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command that exited zero with no output.
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    /// Whether the command exited with code zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands.
pub trait CommandRunner {
    /// Run `cmd` to completion and return its output, whatever the exit
    /// status. Fails only when the process could not be started.
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput>;

    /// Run `cmd` and fail with [`Error::CommandFailed`] unless it exits zero.
    fn run_checked(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        let output = self.run(cmd)?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::CommandFailed {
                command: cmd.display(),
                code: output.code,
                stderr: cmd.redact(&output.stderr),
            })
        }
    }
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        debug!("$ {}", cmd.display());

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if cmd.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }

        let spawn_err = |error| Error::CommandSpawn {
            program: cmd.program.clone(),
            error,
        };

        let mut child = command.spawn().map_err(spawn_err)?;
        if let (Some(data), Some(mut stdin)) = (&cmd.stdin, child.stdin.take()) {
            stdin.write_all(data.as_bytes()).map_err(spawn_err)?;
            // stdin is dropped here so the child sees EOF
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        log_output(cmd, &result);
        Ok(result)
    }
}

/// Logs commands instead of running them. Every command "succeeds".
#[derive(Debug, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        info!("[dry-run] {}", cmd.display());
        if let Some(data) = &cmd.stdin {
            for line in data.lines() {
                debug!("[dry-run] stdin: {}", cmd.redact(line));
            }
        }
        Ok(CommandOutput::ok())
    }
}

fn log_output(cmd: &CommandSpec, output: &CommandOutput) {
    for line in output.stdout.lines() {
        info!("{}", cmd.redact(line));
    }
    for line in output.stderr.lines() {
        if output.success() {
            debug!("{}", cmd.redact(line));
        } else {
            warn!("{}", cmd.redact(line));
        }
    }
    if !output.success() {
        warn!(
            "`{}` exited with {}",
            cmd.display(),
            output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "a signal".to_string())
        );
    }
}

/// Replace every non-empty secret in `text` with a mask.
pub fn redact(text: &str, secrets: &[String]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
}

/// Quote an argument for display when it contains shell-significant
/// characters.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '=' | ',' | '+' | '~')
        });
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
