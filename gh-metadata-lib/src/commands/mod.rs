//! Command-line interface and orchestration for gh-metadata
//!
//! This module implements the CLI commands and wires the record store to the
//! synchronization engine. It handles argument parsing, configuration management
//! and the end-of-run error report.
//!
//! # Commands
//!
//! - **sync**: Refresh the GitHub metadata of every record pointing at a GitHub
//!   repository, writing each updated record back as soon as its batch is merged
//! - **prune**: Drop `commit_history` entries that fell out of the twelve-month window
//! - **init**: Generate a default configuration file
//!
//! # Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! command handler. `sync` and `prune` share their setup through `common`: initialize
//! logging, load `gh-metadata.toml`, apply command-line overrides, open the record store.
//!
//! Failures during a pass do not stop it. They are collected and printed once the pass
//! is over, after which the process exits with [`EXIT_CODE_RUN_ERRORS`].

mod common;
mod config;
mod host;
mod init;
mod prune;
mod run;
mod sync;

pub use common::{ColorMode, CommonArgs, LogLevel};
pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use prune::{PruneArgs, prune_metadata};
pub use run::run;
pub use sync::{SyncArgs, sync_metadata};

/// Exit status used when a run completed but recorded errors along the way
pub const EXIT_CODE_RUN_ERRORS: i32 = 3;
