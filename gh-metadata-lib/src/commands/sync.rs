use super::Host;
use super::common::{Common, CommonArgs, require_token};
use crate::Result;
use crate::metadata::{Client, ErrorLog, SyncOptions, Synchronizer};
use chrono::Utc;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Only refresh records missing at least one GitHub metadata field
    #[arg(long)]
    pub only_missing: bool,

    /// Seconds to wait between two batch queries
    #[arg(long, value_name = "SECONDS")]
    pub sleep_time: Option<f64>,

    /// Seconds to wait before every query
    #[arg(long, value_name = "SECONDS")]
    pub request_sleep_time: Option<f64>,

    /// Number of repositories fetched per query (1 to 100)
    #[arg(long, value_name = "COUNT")]
    pub batch_size: Option<usize>,

    /// GitHub GraphQL endpoint
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Refresh the GitHub metadata of every qualifying record.
pub async fn sync_metadata<H: Host>(host: &mut H, args: &SyncArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common, |config| {
        if args.only_missing {
            config.gh_metadata_only_missing = true;
        }
        if let Some(sleep_time) = args.sleep_time {
            config.sleep_time = sleep_time;
        }
        if let Some(request_sleep_time) = args.request_sleep_time {
            config.request_sleep_time = request_sleep_time;
        }
        if let Some(batch_size) = args.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(api_url) = &args.api_url {
            config.api_url.clone_from(api_url);
        }
    })?;

    let token = require_token(args.github_token.as_deref())?;
    let client = Client::new(token, common.config.api_url.as_str())?;

    let options = SyncOptions {
        only_missing: common.config.gh_metadata_only_missing,
        batch_size: common.config.batch_size(),
        batch_delay: common.config.batch_delay(),
        request_delay: common.config.request_delay(),
    };

    let mut records = common.load_records()?;
    let mut errors = ErrorLog::new();

    let summary = Synchronizer::new(client, options)
        .run(&common.store, &mut records, Utc::now(), &mut errors)
        .await;

    common.print(&format!(
        "Synced {} of {} selected records in {} batches ({} failed); {} written, {} unmatched results, {} unmatched candidates",
        summary.merged,
        summary.selected,
        summary.batches,
        summary.failed_batches,
        summary.written,
        summary.unmatched_results,
        summary.unmatched_candidates
    ));

    common.finish(&errors)
}
