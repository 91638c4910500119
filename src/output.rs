//! # Console Output
//!
//! Progress of a run is shown on stdout as numbered steps. This module
//! decides whether that output uses colors and emoji, and draws a spinner
//! while a long step (package installs, image builds) is running.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! The spinner is drawn on stderr and only when it is a terminal.

use std::env;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
///
/// # Arguments
/// * `config` - The output configuration
/// * `emoji_str` - The emoji to use when colors are enabled
/// * `plain` - The plain text to use when colors are disabled
///
/// # Example
/// ```
/// use hostdeploy::output::{emoji, OutputConfig};
///
/// let config = OutputConfig { use_color: false };
/// assert_eq!(emoji(&config, "✅", "[OK]"), "[OK]");
/// ```
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Numbered step reporting for a run.
///
/// Each step is announced with [`Progress::start`] and closed with either
/// [`Progress::finish`] or [`Progress::fail`]. Quiet progress prints
/// nothing, which is what the library tests use.
pub struct Progress {
    out: OutputConfig,
    total: usize,
    index: usize,
    title: String,
    quiet: bool,
    spinner: Option<ProgressBar>,
    use_spinner: bool,
}

impl Progress {
    pub fn new(out: OutputConfig, total: usize, use_spinner: bool) -> Self {
        Self {
            out,
            total,
            index: 0,
            title: String::new(),
            quiet: false,
            spinner: None,
            use_spinner,
        }
    }

    /// Progress that prints nothing.
    pub fn quiet(total: usize) -> Self {
        Self {
            quiet: true,
            ..Self::new(OutputConfig { use_color: false }, total, false)
        }
    }

    /// Number of steps started so far.
    pub fn started(&self) -> usize {
        self.index
    }

    fn counter(&self) -> String {
        format!("[{}/{}]", self.index, self.total)
    }

    /// Announce the next step.
    pub fn start(&mut self, title: &str) {
        self.index += 1;
        self.title = title.to_string();
        log::info!("{} {}", self.counter(), title);
        if self.quiet {
            return;
        }

        if self.use_spinner {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message(format!("{} {}", self.counter(), title));
            spinner.enable_steady_tick(Duration::from_millis(120));
            self.spinner = Some(spinner);
        } else {
            println!(
                "{} {} {}...",
                emoji(&self.out, "⏳", "[....]"),
                self.counter(),
                title
            );
        }
    }

    /// Close the current step as succeeded, with an optional detail line.
    pub fn finish(&mut self, detail: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        log::info!("{} done: {}", self.counter(), detail);
        if self.quiet {
            return;
        }
        println!(
            "{} {} {}",
            emoji(&self.out, "✅", "[OK]"),
            self.counter(),
            if detail.is_empty() { self.title.as_str() } else { detail }
        );
    }

    /// Close the current step as failed.
    pub fn fail(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        log::error!("{} failed: {}", self.counter(), self.title);
        if self.quiet {
            return;
        }
        println!(
            "{} {} {} failed",
            emoji(&self.out, "❌", "[ERR]"),
            self.counter(),
            self.title
        );
    }

    /// Print a line outside the step counter.
    pub fn note(&self, message: &str) {
        log::info!("{}", message);
        if !self.quiet {
            println!("   {}", message);
        }
    }
}
