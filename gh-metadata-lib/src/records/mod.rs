//! Per-project record storage
//!
//! Every tracked project lives in its own YAML file under `<source_directory>/software`.
//! A [`Record`] keeps the parsed mapping in its original field order so that fields
//! this tool does not own survive a load/write round-trip untouched.
//!
//! The [`RecordStore`] loads all records in file-name order and writes a single
//! record back to `<storage key>.yml`, where the storage key is the kebab-case form
//! of the record's `name`. The serialization style is an explicit [`YamlStyle`] value
//! given to the store when it is created.

mod record;
mod store;
mod yaml_style;

pub use record::{Record, fields, to_kebab_case};
pub use store::{RecordStore, RecordWriter};
pub use yaml_style::YamlStyle;
