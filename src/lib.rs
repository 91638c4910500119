//! # Host Deploy Library
//!
//! This library deploys a containerized application from a Git repository
//! onto a single remote Linux host reached over SSH, and puts Nginx in front
//! of it on port 80. It is used by the `hostdeploy` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use hostdeploy::{git, proxy};
//!
//! // The application name comes from the repository URL
//! let name = git::repo_name("https://github.com/acme/web-app.git").unwrap();
//! assert_eq!(name, "web-app");
//!
//! // The proxy site forwards port 80 to the application port
//! let site = proxy::render_site(8080);
//! assert!(site.contains("proxy_pass http://localhost:8080;"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`, `prompt`)**: The deployment parameters, merged
//!   from flags, an optional YAML answers file and interactive prompts.
//! - **Command runner (`runner`)**: Every external program (`git`, `ssh`,
//!   `rsync`) runs through the [`runner::CommandRunner`] trait, which keeps
//!   secrets out of logs and makes dry runs and tests possible.
//! - **Remote session (`remote`)**: `ssh` and `rsync` invocations against the
//!   target host with one shared set of options.
//! - **Steps (`git`, `manifest`, `provision`, `deploy`, `proxy`, `validate`)**:
//!   One module per stage of a deployment.
//! - **Orchestration (`workflow`)**: Runs the steps in order and reports
//!   progress.
//!
//! ## Execution Flow
//!
//! 1. **Sync**: Clone the repository, or pull it when a clone already exists.
//! 2. **Detect**: Find a compose file or a Dockerfile in the clone.
//! 3. **Connect**: Check that the host accepts the SSH key.
//! 4. **Provision**: Install Docker, docker-compose and Nginx.
//! 5. **Deploy**: Copy the project over and build and start the containers.
//! 6. **Proxy**: Point Nginx at the application port.
//! 7. **Validate**: Check services, containers and HTTP responses.

pub mod config;
pub mod defaults;
pub mod deploy;
pub mod error;
pub mod exit_codes;
pub mod git;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod prompt;
pub mod provision;
pub mod proxy;
pub mod remote;
pub mod runner;
pub mod validate;
pub mod workflow;

#[cfg(test)]
mod git_proptest;
