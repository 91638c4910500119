//! Interactive input collection.
//!
//! Whatever the flags and answers file left unset is asked for on the
//! terminal. Only the branch has a default (`main`); the access token may
//! be left empty for public repositories.
//!
//! The terminal is behind the [`Prompter`] trait so the collection logic
//! can be tested with scripted answers.

use dialoguer::{theme::ColorfulTheme, Input, Password};

use crate::config::{expand_home, parse_port, DeployConfig, PartialConfig};
use crate::defaults;
use crate::error::Result;

/// Checks one answer; `Err` carries the message shown before re-asking.
pub type Validator = fn(&str) -> std::result::Result<(), String>;

/// Asks the operator for values.
pub trait Prompter {
    /// Ask for a visible value. `default` is offered and returned on an
    /// empty answer.
    fn input(&self, prompt: &str, default: Option<&str>, validate: Option<Validator>)
        -> Result<String>;

    /// Ask for a hidden value. An empty answer is allowed.
    fn password(&self, prompt: &str) -> Result<String>;
}

/// Which values a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Everything: deploy clones the repository.
    Full,
    /// Only what reaches the deployed application: the repository URL
    /// (for the application name), the remote login and the port.
    Remote,
}

/// Prompts on the terminal with dialoguer.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(
        &self,
        prompt: &str,
        default: Option<&str>,
        validate: Option<Validator>,
    ) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(default.is_some());
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        if let Some(validate) = validate {
            input = input.validate_with(move |value: &String| validate(value));
        }
        Ok(input.interact_text()?)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?)
    }
}

fn not_blank(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err("A value is required".to_string())
    } else {
        Ok(())
    }
}

fn valid_port(value: &str) -> std::result::Result<(), String> {
    parse_port(value).map(|_| ()).map_err(|e| e.to_string())
}

fn existing_key(value: &str) -> std::result::Result<(), String> {
    let path = expand_home(value);
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("No file at {}", path.display()))
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Ask for every value `partial` is missing, then resolve the result.
pub fn collect(partial: PartialConfig, prompter: &dyn Prompter, scope: Scope) -> Result<DeployConfig> {
    let mut config = partial;

    if !present(&config.repo_url) {
        config.repo_url = Some(prompter.input("Git repository URL", None, Some(not_blank))?);
    }
    if scope == Scope::Full {
        if config.token.is_none() {
            config.token = Some(
                prompter.password("Personal access token (empty for a public repository)")?,
            );
        }
        if config.branch.is_none() {
            config.branch = Some(prompter.input("Branch", Some(defaults::BRANCH), None)?);
        }
    }
    if !present(&config.ssh_user) {
        config.ssh_user = Some(prompter.input("Remote username", None, Some(not_blank))?);
    }
    if !present(&config.ssh_host) {
        config.ssh_host = Some(prompter.input("Remote host (IP or name)", None, Some(not_blank))?);
    }
    if !present(&config.ssh_key) {
        let default = defaults::default_ssh_key();
        config.ssh_key = Some(prompter.input(
            "SSH private key path",
            Some(default.as_str()),
            Some(existing_key),
        )?);
    }
    if config.app_port.is_none() {
        let answer = prompter.input("Application port", None, Some(valid_port))?;
        config.app_port = Some(parse_port(&answer)?);
    }

    config.resolve()
}
