//! GitHub metadata synchronization
//!
//! This module refreshes the GitHub-derived fields of every record that points at a
//! GitHub repository, and prunes old monthly commit counts.
//!
//! # Implementation Model
//!
//! A sync pass flows through these stages:
//!
//! 1. **Selection** ([`select_candidates`]): each record's `source_code_url` (or
//!    `website_url` when there is no source URL) is matched against the GitHub
//!    repository URL pattern. In "only missing" mode, records already carrying every
//!    tracked field are skipped.
//! 2. **Batching** ([`partition`]): candidates are split, in load order, into groups of
//!    at most `batch_size` repositories.
//! 3. **Querying** ([`Client`]): each batch becomes one GraphQL `search` request. Transport
//!    failures skip the batch; `errors` reported by the API are accumulated.
//! 4. **Merging** ([`merge_batch`]): each returned repository is matched back to its
//!    candidate by repository name, never by position, and the record fields are updated.
//!    Every merged record is written back before the next batch starts, so an interrupted
//!    run leaves finished records durable and the rest untouched.
//!
//! The [`Synchronizer`] drives stages 2–4 sequentially with a fixed delay between batches.
//! Retention ([`prune_all`]) is an independent pass over all records.
//!
//! Failures never abort a pass. They are collected in an [`ErrorLog`] and reported at
//! the end of the run.

mod batcher;
mod client;
mod error_log;
mod merger;
mod query;
mod repo_spec;
mod retention;
mod selector;
mod synchronizer;
mod year_month;

pub use batcher::partition;
pub use client::{Client, GITHUB_GRAPHQL_URL, QueryResult, RateLimitInfo};
pub use client::{BranchRef, CommitTarget, History, QueryError, Release, ReleaseConnection, RepositoryNode, SearchResponse};
pub use error_log::ErrorLog;
pub use merger::{MergeOutcome, apply_metadata, merge_batch};
pub use query::build_search_query;
pub use repo_spec::RepoSpec;
pub use retention::{PruneSummary, prune_all, prune_history, retention_cutoff};
pub use selector::{Candidate, TRACKED_FIELDS, is_missing_metadata, repository_url, select_candidates};
pub use synchronizer::{SyncOptions, SyncSummary, Synchronizer};
pub use year_month::YearMonth;
