//! # Run Log
//!
//! Every run writes a timestamped log file (`deploy_YYYYMMDD_HHMMSS.log`)
//! holding each step, each external command and its output. Records go
//! through the `log` facade and an `env_logger` whose target is the file;
//! with `--verbose` they are echoed to stderr as well.
//!
//! The level comes from `--log-level`. `HOSTDEPLOY_LOG` accepts the usual
//! `env_logger` filter syntax and overrides it.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use log::LevelFilter;

use crate::error::{Error, Result};

/// Environment variable with `env_logger` filter directives.
pub const LOG_ENV: &str = "HOSTDEPLOY_LOG";

/// Log file name for a run started at `started`.
pub fn log_file_name<Tz: TimeZone>(started: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("deploy_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Parse a `--log-level` value.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    level.trim().parse::<LevelFilter>().map_err(|_| Error::Config {
        message: format!("Unknown log level '{}'", level),
        hint: Some("Use one of: off, error, warn, info, debug, trace".to_string()),
    })
}

/// Writes every record to the log file, and to stderr when echoing.
struct Tee {
    file: File,
    echo: bool,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_all(buf)?;
        if self.echo {
            io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.echo {
            io::stderr().flush()?;
        }
        Ok(())
    }
}

/// Create the run log in `dir` and install the global logger.
///
/// Returns the log file path. If a logger is already installed (as in
/// tests) the file is still created but records keep going to the
/// existing logger.
pub fn init(level: &str, dir: &Path, echo: bool) -> Result<PathBuf> {
    let level = parse_level(level)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(&Local::now()));
    let file = File::create(&path)?;

    let installed = env_logger::Builder::new()
        .filter_level(level)
        .parse_env(LOG_ENV)
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(Tee { file, echo })))
        .try_init();
    if installed.is_err() {
        log::debug!("logger already installed, not redirecting to {}", path.display());
    }

    log::info!(
        "{} {} started, logging to {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        path.display()
    );
    Ok(path)
}
