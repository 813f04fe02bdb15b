use super::{Client, ErrorLog, QueryResult, RateLimitInfo, YearMonth, build_search_query, merge_batch, partition, select_candidates};
use crate::records::{Record, RecordWriter};
use chrono::{DateTime, Utc};
use core::num::NonZeroUsize;
use core::time::Duration;

const LOG_TARGET: &str = "      sync";

/// Tuning knobs for a sync pass.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Only refresh records missing at least one tracked field
    pub only_missing: bool,

    /// Maximum number of repositories per query
    pub batch_size: NonZeroUsize,

    /// Pause between consecutive batches
    pub batch_delay: Duration,

    /// Pause before every request
    pub request_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            only_missing: false,
            batch_size: NonZeroUsize::new(30).unwrap_or(NonZeroUsize::MIN),
            batch_delay: Duration::from_secs(60),
            request_delay: Duration::ZERO,
        }
    }
}

/// Totals for one sync pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    /// Records selected for a refresh
    pub selected: usize,
    pub batches: usize,

    /// Batches whose request failed or returned no data
    pub failed_batches: usize,

    /// Records updated from a result
    pub merged: usize,

    /// Updated records successfully written back
    pub written: usize,
    pub unmatched_results: usize,
    pub unmatched_candidates: usize,
}

/// Drives a sync pass: selection, batching, querying, merging and write-back.
#[derive(Debug)]
pub struct Synchronizer {
    client: Client,
    options: SyncOptions,
}

impl Synchronizer {
    #[must_use]
    pub const fn new(client: Client, options: SyncOptions) -> Self {
        Self { client, options }
    }

    /// Refresh the GitHub metadata of `records`.
    ///
    /// Batches are processed one at a time in selection order. Each record updated by a batch
    /// is written through `writer` before the next batch is sent. Failures of any kind are
    /// recorded in `errors` and never end the pass early. `now` fixes the month whose commit
    /// count is refreshed.
    pub async fn run(&self, writer: &impl RecordWriter, records: &mut [Record], now: DateTime<Utc>, errors: &mut ErrorLog) -> SyncSummary {
        let month = YearMonth::from_datetime(now);
        let candidates = select_candidates(records, self.options.only_missing);
        let batches = partition(&candidates, self.options.batch_size);

        let mut summary = SyncSummary {
            selected: candidates.len(),
            batches: batches.len(),
            ..SyncSummary::default()
        };

        for (i, batch) in batches.iter().enumerate() {
            let number = i + 1;

            if i > 0 && !self.options.batch_delay.is_zero() {
                log::info!(target: LOG_TARGET, "Waiting {:?} before the next batch", self.options.batch_delay);
                tokio::time::sleep(self.options.batch_delay).await;
            }

            if !self.options.request_delay.is_zero() {
                tokio::time::sleep(self.options.request_delay).await;
            }

            log::info!(
                target: LOG_TARGET,
                "Querying batch {number}/{} ({} repositories)",
                batches.len(),
                batch.len()
            );

            let query = build_search_query(batch, month);
            log::trace!(target: LOG_TARGET, "Query for batch {number}:\n{query}");

            let response = match self.client.query(&query).await {
                QueryResult::Success(response, rate_limit) => {
                    log_rate_limit(rate_limit);
                    response
                }
                QueryResult::Failed(e, rate_limit) => {
                    log_rate_limit(rate_limit);
                    errors.record(format!("batch {number}/{} failed: {e}", batches.len()));
                    summary.failed_batches += 1;
                    continue;
                }
            };

            for error in &response.errors {
                errors.record(format!("batch {number}/{}: GitHub API error: {error}", batches.len()));
            }

            let Some(data) = response.data else {
                if response.errors.is_empty() {
                    errors.record(format!("batch {number}/{}: GitHub API response carried no data", batches.len()));
                }
                summary.failed_batches += 1;
                continue;
            };

            let outcome = merge_batch(records, batch, &data.search.nodes, month);
            summary.merged += outcome.merged.len();
            summary.unmatched_results += outcome.unmatched_results;
            summary.unmatched_candidates += outcome.unmatched_candidates;

            for &index in &outcome.merged {
                let Some(record) = records.get(index) else {
                    continue;
                };

                match writer.write(record) {
                    Ok(()) => summary.written += 1,
                    Err(e) => errors.record(format!("could not write record '{}': {e}", record.display_name())),
                }
            }
        }

        log::info!(
            target: LOG_TARGET,
            "Updated {} of {} selected records in {} batches ({} failed)",
            summary.merged,
            summary.selected,
            summary.batches,
            summary.failed_batches
        );

        summary
    }
}

fn log_rate_limit(rate_limit: Option<RateLimitInfo>) {
    match rate_limit {
        Some(info) => log::info!(target: LOG_TARGET, "GitHub rate limit: {info}"),
        None => log::debug!(target: LOG_TARGET, "No rate limit information in response"),
    }
}
