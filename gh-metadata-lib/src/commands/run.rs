//! Command dispatch logic for gh-metadata

use super::{InitArgs, PruneArgs, SyncArgs, init_config, prune_metadata, sync_metadata};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "gh-metadata", author, version, long_about = None)]
#[command(about = "Keep the GitHub metadata of a curated software list up to date")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh stars, archival state, latest release and commit activity from GitHub
    Sync(Box<SyncArgs>),
    /// Remove commit history older than twelve months
    Prune(PruneArgs),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// `args` usually comes from `std::env::args()`; the first item is the program name.
///
/// # Errors
///
/// Returns an error if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Sync(sync_args) => sync_metadata(host, sync_args).await,
        Command::Prune(prune_args) => prune_metadata(host, prune_args),
        Command::Init(init_args) => init_config(host, init_args),
    }
}
