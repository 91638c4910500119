//! Repository sync: clone the application's source, or update an existing
//! clone.
//!
//! This uses the system git command, which automatically handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Any authentication configured in ~/.gitconfig
//!
//! For HTTPS repositories an access token can be supplied; it is injected
//! into the URL for the git invocation only and masked everywhere it would
//! be displayed.

use std::path::{Path, PathBuf};

use log::info;
use url::Url;

use crate::config::DeployConfig;
use crate::error::{Error, Result};
use crate::runner::{CommandRunner, CommandSpec};

/// What [`sync`] did to bring the local clone up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Pulled,
}

/// Derive a repository name from its URL.
///
/// Takes the last path segment with any trailing `/` and `.git` removed.
/// Works for `https://`, `ssh://` and scp-like `git@host:org/repo.git`
/// URLs.
pub fn repo_name(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let path = match Url::parse(trimmed) {
        Ok(parsed) => parsed.path().to_string(),
        // scp-like syntax: user@host:org/repo.git
        Err(_) => match trimmed.split_once(':') {
            Some((_, path)) => path.to_string(),
            None => trimmed.to_string(),
        },
    };

    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::RepoName {
            url: url.to_string(),
        });
    }
    Ok(name.to_string())
}

/// Inject `token` as the user part of an `http(s)` URL.
///
/// Other URL schemes, scp-like URLs and empty tokens are returned
/// unchanged.
pub fn authenticated_url(url: &str, token: Option<&str>) -> Result<String> {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(url.to_string()),
    };

    let mut parsed = match Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
        _ => return Ok(url.to_string()),
    };
    parsed.set_username(token).map_err(|_| Error::Config {
        message: format!("Cannot add an access token to '{}'", url),
        hint: None,
    })?;
    Ok(parsed.to_string())
}

/// Every form of `token` that can show up in a git command line.
///
/// The URL carries the token percent-encoded, so a token holding `:`, `/`
/// or `@` is masked in both its raw and its encoded spelling. The encoded
/// form comes first so it is masked whole.
pub fn token_secrets(token: Option<&str>) -> Vec<String> {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Vec::new(),
    };
    let mut secrets = Vec::new();
    if let Ok(mut url) = Url::parse("https://localhost/") {
        if url.set_username(token).is_ok() && url.username() != token {
            secrets.push(url.username().to_string());
        }
    }
    secrets.push(token.to_string());
    secrets
}

fn with_token(cmd: CommandSpec, config: &DeployConfig) -> CommandSpec {
    token_secrets(config.token.as_deref())
        .into_iter()
        .fold(cmd, CommandSpec::secret)
}

/// Directory the repository is cloned into under `workdir`.
pub fn clone_dir(config: &DeployConfig, workdir: &Path) -> Result<PathBuf> {
    Ok(workdir.join(config.app_name()?))
}

/// Whether `path` holds a git checkout.
pub fn is_checkout(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Clone the repository if it is absent locally, pull it if present.
///
/// There is no conflict resolution: any failing git command aborts the run.
pub fn sync(
    runner: &dyn CommandRunner,
    config: &DeployConfig,
    workdir: &Path,
) -> Result<(PathBuf, SyncAction)> {
    let dir = clone_dir(config, workdir)?;
    let remote = authenticated_url(&config.repo_url, config.token.as_deref())?;
    let dir_arg = dir.display().to_string();

    if is_checkout(&dir) {
        info!("Updating existing clone in {}", dir.display());
        runner.run_checked(
            &CommandSpec::new("git").args(["-C", &dir_arg, "checkout", &config.branch]),
        )?;
        runner.run_checked(&with_token(
            CommandSpec::new("git").args(["-C", &dir_arg, "pull", &remote, &config.branch]),
            config,
        ))?;
        Ok((dir, SyncAction::Pulled))
    } else {
        info!(
            "Cloning {} ({}) into {}",
            config.repo_url,
            config.branch,
            dir.display()
        );
        runner.run_checked(&with_token(
            CommandSpec::new("git").args(["clone", "--branch", &config.branch, &remote, &dir_arg]),
            config,
        ))?;
        Ok((dir, SyncAction::Cloned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    fn config(token: Option<&str>) -> DeployConfig {
        DeployConfig {
            repo_url: "https://github.com/acme/web.git".to_string(),
            token: token.map(str::to_string),
            branch: "main".to_string(),
            ssh_user: "ubuntu".to_string(),
            ssh_host: "203.0.113.10".to_string(),
            ssh_key: PathBuf::from("/tmp/key"),
            app_port: 8080,
        }
    }

    #[test]
    fn test_repo_name_https() {
        assert_eq!(repo_name("https://github.com/acme/web.git").unwrap(), "web");
        assert_eq!(repo_name("https://github.com/acme/web").unwrap(), "web");
        assert_eq!(repo_name("https://github.com/acme/web/").unwrap(), "web");
    }

    #[test]
    fn test_repo_name_ssh_forms() {
        assert_eq!(repo_name("git@github.com:acme/api.git").unwrap(), "api");
        assert_eq!(
            repo_name("ssh://git@example.com:2222/team/api.git").unwrap(),
            "api"
        );
    }

    #[test]
    fn test_repo_name_ignores_query_and_whitespace() {
        assert_eq!(
            repo_name("  https://gitlab.com/group/sub/service.git?ref=x  ").unwrap(),
            "service"
        );
    }

    #[test]
    fn test_repo_name_rejects_hostless_paths() {
        assert!(matches!(
            repo_name("https://github.com/"),
            Err(Error::RepoName { .. })
        ));
        assert!(repo_name("").is_err());
        assert!(repo_name(".git").is_err());
    }

    #[test]
    fn test_authenticated_url_injects_token() {
        let url = authenticated_url("https://github.com/acme/web.git", Some("ghp_x1")).unwrap();
        assert_eq!(url, "https://ghp_x1@github.com/acme/web.git");
    }

    #[test]
    fn test_authenticated_url_without_token() {
        let url = "https://github.com/acme/web.git";
        assert_eq!(authenticated_url(url, None).unwrap(), url);
        assert_eq!(authenticated_url(url, Some("")).unwrap(), url);
    }

    #[test]
    fn test_authenticated_url_leaves_ssh_alone() {
        let url = "git@github.com:acme/web.git";
        assert_eq!(authenticated_url(url, Some("ghp_x1")).unwrap(), url);
    }

    #[test]
    fn test_sync_clones_when_absent() {
        let workdir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();

        let (dir, action) = sync(&runner, &config(Some("ghp_secret")), workdir.path()).unwrap();

        assert_eq!(action, SyncAction::Cloned);
        assert_eq!(dir, workdir.path().join("web"));
        let lines = runner.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("git clone --branch main https://****@github.com/acme/web.git"));

        // the real argument still carries the token
        let calls = runner.calls();
        assert!(calls[0]
            .args
            .contains(&"https://ghp_secret@github.com/acme/web.git".to_string()));
    }

    #[test]
    fn test_token_with_url_characters_is_masked() {
        let workdir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let mut cfg = config(Some("oauth2:glpat/x@y"));
        cfg.repo_url = "https://gitlab.com/acme/web.git".to_string();

        sync(&runner, &cfg, workdir.path()).unwrap();

        let line = &runner.lines()[0];
        assert!(line.contains("https://****@gitlab.com/acme/web.git"), "{}", line);
        assert!(!line.contains("glpat"));
        assert!(!line.contains("%40y"));
    }

    #[test]
    fn test_token_secrets_lists_encoded_form_first() {
        assert_eq!(
            token_secrets(Some("a:b@c")),
            vec!["a%3Ab%40c".to_string(), "a:b@c".to_string()]
        );
        assert_eq!(token_secrets(Some("ghp_plain")), vec!["ghp_plain".to_string()]);
        assert!(token_secrets(Some("  ")).is_empty());
        assert!(token_secrets(None).is_empty());
    }

    #[test]
    fn test_failed_clone_masks_encoded_token() {
        let workdir = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_when("git clone", 128);

        let err = sync(&runner, &config(Some("user:pa/ss")), workdir.path()).unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("pa%2Fss"), "{}", message);
        assert!(message.contains("****"));
    }

    #[test]
    fn test_sync_pulls_when_present() {
        let workdir = TempDir::new().unwrap();
        fs::create_dir_all(workdir.path().join("web/.git")).unwrap();
        let runner = RecordingRunner::new();

        let (_, action) = sync(&runner, &config(None), workdir.path()).unwrap();

        assert_eq!(action, SyncAction::Pulled);
        let lines = runner.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("checkout main"));
        assert!(lines[1].ends_with("pull https://github.com/acme/web.git main"));
        assert!(!runner.ran("clone"));
    }

    #[test]
    fn test_sync_treats_plain_directory_as_absent() {
        let workdir = TempDir::new().unwrap();
        fs::create_dir_all(workdir.path().join("web")).unwrap();
        let runner = RecordingRunner::new();

        let (_, action) = sync(&runner, &config(None), workdir.path()).unwrap();
        assert_eq!(action, SyncAction::Cloned);
    }

    #[test]
    fn test_sync_aborts_on_git_failure() {
        let workdir = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_when("git clone", 128);

        let err = sync(&runner, &config(None), workdir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 128);
    }
}
