#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for gh-metadata
//!
//! This library holds all functionality for the gh-metadata tool, which keeps the
//! GitHub-derived fields of a curated software list (stars, archival state, latest
//! release, last commit date, monthly commit counts) up to date.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`records`]: Loading and persisting per-project YAML records
//! - [`metadata`]: Candidate selection, batched remote queries, merging and retention

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod metadata;
pub mod records;

pub use crate::commands::{EXIT_CODE_RUN_ERRORS, Host, run};
