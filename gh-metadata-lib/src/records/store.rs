use super::{Record, YamlStyle};
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{EnrichableExt, IntoAppError, bail};
use serde_yaml::Mapping;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use walkdir::WalkDir;

const LOG_TARGET: &str = "   records";

/// Directory under the source directory that holds one YAML file per project.
pub const RECORDS_SUBDIRECTORY: &str = "software";

/// Extension of record files, both read and written.
const RECORD_EXTENSION: &str = "yml";

/// Persists a single record.
///
/// The synchronization engine writes through this trait so that persistence
/// failures can be exercised without touching the filesystem.
pub trait RecordWriter {
    fn write(&self, record: &Record) -> Result<()>;
}

/// YAML record files under `<source_directory>/software`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: Utf8PathBuf,
    style: YamlStyle,
}

impl RecordStore {
    #[must_use]
    pub fn new(source_directory: &Utf8Path, style: YamlStyle) -> Self {
        Self {
            dir: source_directory.join(RECORDS_SUBDIRECTORY),
            style,
        }
    }

    /// The directory holding the record files.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// The file a record is written to, derived from its `name`.
    pub fn path_for(&self, record: &Record) -> Result<Utf8PathBuf> {
        Ok(self.dir.join(format!("{}.{RECORD_EXTENSION}", record.storage_key()?)))
    }

    /// Load every `*.yml` record, ordered by file name.
    ///
    /// Fails if a file cannot be parsed, if a record has no usable `name`, or if two
    /// records map to the same storage key.
    pub fn load_all(&self) -> Result<Vec<Record>> {
        if !self.dir.is_dir() {
            bail!("record directory '{}' does not exist", self.dir);
        }

        let mut records = Vec::new();
        let mut keys: HashMap<String, Utf8PathBuf> = HashMap::new();

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.into_app_err_with(|| format!("reading record directory '{}'", self.dir))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = Utf8Path::from_path(entry.path())
                .into_app_err_with(|| format!("record file name '{}' is not valid UTF-8", entry.path().display()))?;
            if path.extension() != Some(RECORD_EXTENSION) {
                continue;
            }

            let record = Self::load_file(path)?;
            let key = record
                .storage_key()
                .map_err(|e| e.enrich_with(|| format!("loading record file '{path}'")))?;

            if path.file_stem() != Some(key.as_str()) {
                log::warn!(target: LOG_TARGET, "Record '{path}' will be moved to '{key}.{RECORD_EXTENSION}' when next written");
            }

            if let Some(previous) = keys.insert(key.clone(), path.to_path_buf()) {
                bail!("records in '{previous}' and '{path}' both map to storage key '{key}'");
            }

            records.push(record);
        }

        log::info!(target: LOG_TARGET, "Loaded {} records from '{}'", records.len(), self.dir);
        Ok(records)
    }

    fn load_file(path: &Utf8Path) -> Result<Record> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading record file '{path}'"))?;
        let mapping: Mapping = serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing record file '{path}'"))?;
        Ok(Record::new(mapping).with_source(path))
    }
}

impl RecordWriter for RecordStore {
    /// Write a record to `<storage key>.yml`, replacing any existing file.
    ///
    /// The document is written to a temporary sibling file first and renamed into
    /// place, so an interrupted write never leaves a truncated record behind. A record
    /// loaded from a differently named file is moved: the old file is removed before
    /// the rename.
    fn write(&self, record: &Record) -> Result<()> {
        let path = self.path_for(record)?;
        let text = self.style.render(record.as_mapping())?;
        let tmp_path = path.with_extension("yml.tmp");

        let mut file = File::create(&tmp_path).into_app_err_with(|| format!("unable to create file '{tmp_path}'"))?;
        file.write_all(text.as_bytes())
            .into_app_err_with(|| format!("unable to write file '{tmp_path}'"))?;
        file.sync_all().into_app_err_with(|| format!("unable to flush file '{tmp_path}'"))?;
        drop(file);

        if let Some(source) = record.source().filter(|source| *source != path.as_path() && source.is_file()) {
            fs::remove_file(source).into_app_err_with(|| format!("unable to remove old record file '{source}'"))?;
            log::info!(target: LOG_TARGET, "Moved record '{}' from '{source}' to '{path}'", record.display_name());
        }

        fs::rename(&tmp_path, &path).into_app_err_with(|| format!("unable to replace record file '{path}'"))?;

        log::debug!(target: LOG_TARGET, "Wrote record '{}' to '{path}'", record.display_name());
        Ok(())
    }
}
