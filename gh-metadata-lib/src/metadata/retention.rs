use super::{ErrorLog, YearMonth};
use crate::records::{Record, RecordWriter, fields};
use chrono::{DateTime, Utc};
use serde_yaml::Value;

const LOG_TARGET: &str = " retention";

/// Number of calendar months of commit history kept per record, current month included.
const RETENTION_MONTHS: u32 = 12;

/// Totals for one retention pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneSummary {
    /// Records carrying a commit history
    pub records: usize,

    /// Month entries removed across all records
    pub removed: usize,

    /// Records successfully written back
    pub written: usize,
}

/// The oldest month kept when `current` is the current month.
#[must_use]
pub fn retention_cutoff(current: YearMonth) -> YearMonth {
    current.minus_months(RETENTION_MONTHS - 1)
}

/// Remove every `commit_history` entry older than `cutoff` from a record.
///
/// Keys compare as `YYYY-MM` strings, which order like the months they name. Entries
/// at or after the cutoff keep their relative order. Returns the number of entries removed.
pub fn prune_history(record: &mut Record, cutoff: YearMonth) -> usize {
    let Some(Value::Mapping(history)) = record.get_mut(fields::COMMIT_HISTORY) else {
        return 0;
    };

    let cutoff = cutoff.key();
    let before = history.len();
    *history = core::mem::take(history)
        .into_iter()
        .filter(|(key, _)| key.as_str().is_none_or(|key| key >= cutoff.as_str()))
        .collect();
    before - history.len()
}

/// Prune the commit history of every record and write each one back.
///
/// Records without a `commit_history` mapping are neither changed nor written. Every
/// record that has one is written, even when nothing was removed. Write failures are
/// recorded and do not stop the pass.
pub fn prune_all(writer: &impl RecordWriter, records: &mut [Record], now: DateTime<Utc>, errors: &mut ErrorLog) -> PruneSummary {
    let cutoff = retention_cutoff(YearMonth::from_datetime(now));
    log::info!(target: LOG_TARGET, "Removing commit history older than {cutoff}");

    let mut summary = PruneSummary::default();

    for record in records.iter_mut() {
        if !record.get(fields::COMMIT_HISTORY).is_some_and(Value::is_mapping) {
            continue;
        }

        summary.records += 1;
        let removed = prune_history(record, cutoff);
        summary.removed += removed;
        if removed > 0 {
            log::debug!(target: LOG_TARGET, "Removed {removed} old months from '{}'", record.display_name());
        }

        match writer.write(record) {
            Ok(()) => summary.written += 1,
            Err(e) => errors.record(format!("could not write record '{}': {e}", record.display_name())),
        }
    }

    log::info!(
        target: LOG_TARGET,
        "Pruned {} months from {} records, {} written",
        summary.removed,
        summary.records,
        summary.written
    );

    summary
}
