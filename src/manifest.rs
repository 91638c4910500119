//! Manifest detection.
//!
//! The files at the root of the cloned repository decide how the
//! application is deployed: a compose file means a multi-container
//! `docker-compose up`, a lone `Dockerfile` means `docker build` plus
//! `docker run`. A repository with neither cannot be deployed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{Error, Result};

/// Compose file names, in the order they are looked for.
pub const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Single-container build file name.
pub const DOCKERFILE: &str = "Dockerfile";

/// The file that determines the deployment strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    /// Multi-container deployment through docker-compose.
    Compose(PathBuf),
    /// Single-container deployment through docker build + run.
    Dockerfile(PathBuf),
}

impl Manifest {
    pub fn is_compose(&self) -> bool {
        matches!(self, Manifest::Compose(_))
    }

    pub fn path(&self) -> &Path {
        match self {
            Manifest::Compose(path) | Manifest::Dockerfile(path) => path,
        }
    }

    /// Name of the deployment strategy, for output.
    pub fn strategy(&self) -> &'static str {
        match self {
            Manifest::Compose(_) => "docker-compose",
            Manifest::Dockerfile(_) => "single container",
        }
    }
}

/// Find the manifest in `dir`. A compose file wins over a Dockerfile.
pub fn detect(dir: &Path) -> Result<Manifest> {
    if let Some(compose) = COMPOSE_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
    {
        return Ok(Manifest::Compose(compose));
    }

    let dockerfile = dir.join(DOCKERFILE);
    if dockerfile.is_file() {
        return Ok(Manifest::Dockerfile(dockerfile));
    }

    Err(Error::MissingManifest {
        dir: dir.display().to_string(),
    })
}

/// Write a default dependency list when the Dockerfile references one that
/// does not exist.
///
/// Returns the path written, or `None` when nothing was needed.
pub fn ensure_dependency_list(dir: &Path, manifest: &Manifest) -> Result<Option<PathBuf>> {
    let dockerfile = match manifest {
        Manifest::Dockerfile(path) => path.clone(),
        Manifest::Compose(_) => dir.join(DOCKERFILE),
    };
    if !dockerfile.is_file() {
        return Ok(None);
    }

    let deps = dir.join(defaults::DEPENDENCY_LIST);
    if deps.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&dockerfile)?;
    if !content.contains(defaults::DEPENDENCY_LIST) {
        return Ok(None);
    }

    fs::write(&deps, defaults::DEFAULT_DEPENDENCIES)?;
    Ok(Some(deps))
}
