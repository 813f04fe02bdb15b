use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::bail;
use serde_yaml::{Mapping, Value};

/// Field names used by the synchronization engine.
pub mod fields {
    pub const NAME: &str = "name";
    pub const SOURCE_CODE_URL: &str = "source_code_url";
    pub const WEBSITE_URL: &str = "website_url";
    pub const STARGAZERS_COUNT: &str = "stargazers_count";
    pub const ARCHIVED: &str = "archived";
    pub const UPDATED_AT: &str = "updated_at";
    pub const CURRENT_RELEASE: &str = "current_release";
    pub const COMMIT_HISTORY: &str = "commit_history";
    pub const RELEASE_TAG: &str = "tag";
    pub const RELEASE_PUBLISHED_AT: &str = "published_at";
}

/// One tracked project, stored as an insertion-ordered YAML mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Mapping,
    source: Option<Utf8PathBuf>,
}

impl Record {
    #[must_use]
    pub const fn new(fields: Mapping) -> Self {
        Self { fields, source: None }
    }

    /// Remember the file this record was loaded from.
    #[must_use]
    pub fn with_source(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// The file this record was loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Utf8Path> {
        self.source.as_deref()
    }

    /// The display name of the project, if the record has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str(fields::NAME)
    }

    /// Name for log messages, never empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("<unnamed>")
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Returns the field as a string, or `None` if it is absent or not a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets a field. An existing field keeps its position in the mapping.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        let _ = self.fields.insert(Value::String(field.to_string()), value.into());
    }

    /// The storage key for this record: the kebab-case form of its `name`.
    pub fn storage_key(&self) -> Result<String> {
        let Some(name) = self.name() else {
            bail!("record has no '{}' field", fields::NAME);
        };

        let key = to_kebab_case(name);
        if key.is_empty() {
            bail!("record name '{name}' does not produce a usable storage key");
        }

        Ok(key)
    }

    #[must_use]
    pub const fn as_mapping(&self) -> &Mapping {
        &self.fields
    }
}

/// Convert a display name into a kebab-case file stem.
///
/// Whitespace and underscores become dashes, anything other than ASCII alphanumerics,
/// `.`, `+` and `-` is dropped, and runs of dashes collapse into one.
#[must_use]
pub fn to_kebab_case(name: &str) -> String {
    let mut key = String::with_capacity(name.len());

    for c in name.chars().flat_map(char::to_lowercase) {
        let mapped = match c {
            c if c.is_whitespace() || c == '_' || c == '-' => '-',
            c if c.is_ascii_alphanumeric() || c == '.' || c == '+' => c,
            _ => continue,
        };

        if mapped == '-' && (key.is_empty() || key.ends_with('-')) {
            continue;
        }

        key.push(mapped);
    }

    while key.ends_with('-') {
        let _ = key.pop();
    }

    key
}
