//! Setup and reporting shared between the `sync` and `prune` commands.

use super::config::Config;
use super::{EXIT_CODE_RUN_ERRORS, Host};
use crate::Result;
use crate::metadata::ErrorLog;
use crate::records::{Record, RecordStore};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use ohno::{IntoAppError, app_err, bail};
use owo_colors::OwoColorize;
use std::io::Write;

const LOG_TARGET: &str = "   command";

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared between the `sync` and `prune` commands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to configuration file (default is `gh-metadata.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Root of the data repository; records live in its `software` directory
    #[arg(long, short = 's', value_name = "PATH")]
    pub source_directory: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,
}

/// Loaded configuration and record store for one command invocation.
pub struct Common<'a, H: Host> {
    pub config: Config,
    pub store: RecordStore,
    host: &'a mut H,
    color: ColorMode,
}

impl<'a, H: Host> Common<'a, H> {
    /// Initialize logging, load the configuration, apply command-line overrides and open the
    /// record store.
    pub fn new(host: &'a mut H, args: &CommonArgs, overrides: impl FnOnce(&mut Config)) -> Result<Self> {
        init_logging(args.log_level);

        let mut config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
        if let Some(dir) = &args.source_directory {
            config.source_directory = Some(dir.clone());
        }
        overrides(&mut config);
        config.validate()?;

        let Some(source_directory) = config.source_directory.clone() else {
            bail!("no source directory configured; pass --source-directory or set `source_directory` in the configuration file");
        };

        if !source_directory.is_dir() {
            bail!("source directory '{source_directory}' does not exist");
        }

        log::debug!(target: LOG_TARGET, "Using source directory '{source_directory}'");
        let store = RecordStore::new(&source_directory, config.yaml_style());

        Ok(Self {
            config,
            store,
            host,
            color: args.color,
        })
    }

    /// Load every record from the store.
    pub fn load_records(&self) -> Result<Vec<Record>> {
        self.store.load_all()
    }

    /// Write a line to standard output.
    pub fn print(&mut self, line: &str) {
        let _ = writeln!(self.host.output(), "{line}");
    }

    /// Print every accumulated error and fail the run if there were any.
    ///
    /// The host is asked to exit with [`EXIT_CODE_RUN_ERRORS`] once all messages are out.
    pub fn finish(&mut self, errors: &ErrorLog) -> Result<()> {
        if errors.is_empty() {
            return Ok(());
        }

        let use_colors = match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                use std::io::{IsTerminal, stderr};
                stderr().is_terminal()
            }
        };

        let header = format!("{} error(s) occurred during the run:", errors.len());
        let mut out = self.host.error();
        if use_colors {
            let _ = writeln!(out, "\n{}", header.red().bold());
        } else {
            let _ = writeln!(out, "\n{header}");
        }

        for message in errors.messages() {
            let _ = writeln!(out, "  - {message}");
        }
        let _ = out.flush();
        drop(out);

        self.host.exit(EXIT_CODE_RUN_ERRORS);
        Err(app_err!("{} error(s) occurred during the run", errors.len()))
    }
}

/// Initialize logger based on log level
///
/// A logger installed earlier in the process stays in place.
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Resolve the access token, failing before any record is touched when there is none.
pub fn require_token(token: Option<&str>) -> Result<&str> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .into_app_err("no GitHub access token; pass --github-token or set GITHUB_TOKEN")
}
