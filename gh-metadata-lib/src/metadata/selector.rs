use super::RepoSpec;
use crate::records::{Record, fields};

const LOG_TARGET: &str = "  selector";

/// Fields populated by a sync. In "only missing" mode a record is refreshed when any is absent.
pub const TRACKED_FIELDS: [&str; 5] = [
    fields::STARGAZERS_COUNT,
    fields::UPDATED_AT,
    fields::ARCHIVED,
    fields::CURRENT_RELEASE,
    fields::COMMIT_HISTORY,
];

/// A record selected for a remote refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Position of the record in the loaded record list
    pub index: usize,

    /// Repository resolved from the record's URL
    pub repo: RepoSpec,
}

/// The URL field a record is identified by.
///
/// `source_code_url` wins whenever it is present, even if it does not point at GitHub;
/// `website_url` is only consulted for records without a source URL.
#[must_use]
pub fn repository_url(record: &Record) -> Option<&str> {
    if record.contains(fields::SOURCE_CODE_URL) {
        record.get_str(fields::SOURCE_CODE_URL)
    } else {
        record.get_str(fields::WEBSITE_URL)
    }
}

/// Whether any tracked metadata field is absent from the record.
#[must_use]
pub fn is_missing_metadata(record: &Record) -> bool {
    TRACKED_FIELDS.iter().any(|field| !record.contains(field))
}

/// Select the records to refresh, in load order.
#[must_use]
pub fn select_candidates(records: &[Record], only_missing: bool) -> Vec<Candidate> {
    let candidates: Vec<_> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let repo = repository_url(record).and_then(RepoSpec::parse)?;

            if only_missing && !is_missing_metadata(record) {
                log::debug!(target: LOG_TARGET, "All metadata already present for '{}', skipping {repo}", record.display_name());
                return None;
            }

            log::debug!(target: LOG_TARGET, "Selected '{}' ({repo})", record.display_name());
            Some(Candidate { index, repo })
        })
        .collect();

    log::info!(target: LOG_TARGET, "Selected {} of {} records for a GitHub metadata refresh", candidates.len(), records.len());
    candidates
}
