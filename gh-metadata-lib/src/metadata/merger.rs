use super::{Candidate, RepositoryNode, YearMonth};
use crate::records::{Record, fields};
use serde_yaml::{Mapping, Value};

const LOG_TARGET: &str = "    merger";

/// What happened when a batch's results were merged into the records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Indexes of the records that were updated, in result order
    pub merged: Vec<usize>,

    /// Returned repositories that did not belong to any candidate of the batch
    pub unmatched_results: usize,

    /// Candidates the response said nothing about
    pub unmatched_candidates: usize,
}

/// Merge the repositories returned for `batch` into `records`.
///
/// Results are matched to candidates by repository name, case-insensitively, so the
/// response may list repositories in any order or leave some out. When several
/// candidates share a repository name, the returned owner/name pair decides, and a
/// result updates every candidate naming the same repository.
pub fn merge_batch(records: &mut [Record], batch: &[Candidate], nodes: &[Option<RepositoryNode>], month: YearMonth) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let mut seen = vec![false; batch.len()];

    for node in nodes.iter().flatten() {
        let positions = matching_candidates(batch, node);
        if positions.is_empty() {
            log::warn!(
                target: LOG_TARGET,
                "Result '{}' does not match any repository of the batch, skipping",
                node.name_with_owner.as_deref().unwrap_or(&node.name)
            );
            outcome.unmatched_results += 1;
            continue;
        }

        for position in positions {
            let candidate = &batch[position];
            let Some(record) = records.get_mut(candidate.index) else {
                log::warn!(target: LOG_TARGET, "No record at index {} for {}, skipping", candidate.index, candidate.repo);
                continue;
            };

            apply_metadata(record, node, month);
            log::debug!(target: LOG_TARGET, "Updated '{}' from {}", record.display_name(), candidate.repo);

            if !seen[position] {
                seen[position] = true;
                outcome.merged.push(candidate.index);
            }
        }
    }

    for (candidate, _) in batch.iter().zip(&seen).filter(|(_, seen)| !**seen) {
        log::warn!(target: LOG_TARGET, "No result returned for {}, leaving the record unchanged", candidate.repo);
        outcome.unmatched_candidates += 1;
    }

    outcome
}

/// Positions of the candidates a returned repository belongs to.
///
/// Several records may point at the same repository; all of them receive the result.
fn matching_candidates(batch: &[Candidate], node: &RepositoryNode) -> Vec<usize> {
    let by_name: Vec<usize> = batch
        .iter()
        .enumerate()
        .filter(|(_, c)| c.repo.matches_repo(&node.name))
        .map(|(position, _)| position)
        .collect();

    if by_name.len() <= 1 {
        return by_name;
    }

    let full_name = match node.name_with_owner.as_deref() {
        Some(full_name) => full_name.to_string(),
        None => batch[by_name[0]].repo.full_name(),
    };

    let matching: Vec<usize> = by_name
        .iter()
        .copied()
        .filter(|&position| batch[position].repo.matches_full_name(&full_name))
        .collect();

    // Without an owner in the result, differing owners cannot be told apart.
    if node.name_with_owner.is_none() && matching.len() != by_name.len() {
        return Vec::new();
    }

    matching
}

/// Copy the fields of a returned repository into a record.
///
/// `current_release` is only written when the repository has a release, and `updated_at`
/// only when the default branch has a commit. The commit count for `month` is always
/// written; an empty repository counts zero commits.
pub fn apply_metadata(record: &mut Record, node: &RepositoryNode, month: YearMonth) {
    record.set(fields::STARGAZERS_COUNT, node.stargazer_count);
    record.set(fields::ARCHIVED, node.is_archived);

    if let Some(release) = node.latest_release() {
        let mut current = Mapping::new();
        if let Some(tag) = &release.tag_name {
            let _ = current.insert(fields::RELEASE_TAG.into(), tag.as_str().into());
        }
        if let Some(published_at) = release.published_at {
            let _ = current.insert(
                fields::RELEASE_PUBLISHED_AT.into(),
                published_at.format("%Y-%m-%d").to_string().into(),
            );
        }
        record.set(fields::CURRENT_RELEASE, current);
    }

    if let Some(committed) = node.last_commit_date() {
        record.set(fields::UPDATED_AT, committed.format("%Y-%m-%d").to_string());
    }

    let commits = node.commits_this_month();
    match record.get_mut(fields::COMMIT_HISTORY) {
        Some(Value::Mapping(history)) => {
            let _ = history.insert(month.key().into(), commits.into());
        }
        _ => {
            let mut history = Mapping::new();
            let _ = history.insert(month.key().into(), commits.into());
            record.set(fields::COMMIT_HISTORY, history);
        }
    }
}
