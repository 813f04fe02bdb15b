use crate::Result;
use crate::metadata::GITHUB_GRAPHQL_URL;
use crate::records::YamlStyle;
use camino::{Utf8Path, Utf8PathBuf};
use core::num::NonZeroUsize;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::Deserialize;
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "gh-metadata.toml";

/// Largest number of repositories a single search query may ask for
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the data repository holding the `software` record directory
    #[serde(default)]
    pub source_directory: Option<Utf8PathBuf>,

    /// Only refresh records missing at least one tracked field
    #[serde(default)]
    pub gh_metadata_only_missing: bool,

    /// Seconds to wait between consecutive batches
    #[serde(default = "default_sleep_time")]
    pub sleep_time: f64,

    /// Seconds to wait before every request
    #[serde(default)]
    pub request_sleep_time: f64,

    /// Repositories per query
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// GitHub GraphQL endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Indent block sequences under their parent key when writing records
    #[serde(default = "default_true")]
    pub yaml_indent_sequences: bool,

    /// Start written records with a `---` marker
    #[serde(default)]
    pub yaml_document_start: bool,
}

const fn default_sleep_time() -> f64 {
    60.0
}

const fn default_batch_size() -> usize {
    30
}

fn default_api_url() -> String {
    GITHUB_GRAPHQL_URL.to_string()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit `config_path`, `gh-metadata.toml` in `base_dir` is used when it exists.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(app_err!("batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}", self.batch_size));
        }

        for (name, value) in [("sleep_time", self.sleep_time), ("request_sleep_time", self.request_sleep_time)] {
            if !value.is_finite() || value < 0.0 {
                return Err(app_err!("{name} must be a non-negative number of seconds, got {value}"));
            }
        }

        if self.api_url.trim().is_empty() {
            return Err(app_err!("api_url must not be empty"));
        }

        Ok(())
    }

    /// The configured batch size. Only meaningful on a validated configuration.
    #[must_use]
    pub fn batch_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.batch_size).unwrap_or(NonZeroUsize::MIN)
    }

    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.sleep_time).unwrap_or_default()
    }

    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_sleep_time).unwrap_or_default()
    }

    #[must_use]
    pub const fn yaml_style(&self) -> YamlStyle {
        YamlStyle {
            indent_sequences: self.yaml_indent_sequences,
            document_start: self.yaml_document_start,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_directory: None,
            gh_metadata_only_missing: false,
            sleep_time: default_sleep_time(),
            request_sleep_time: 0.0,
            batch_size: default_batch_size(),
            api_url: default_api_url(),
            yaml_indent_sequences: default_true(),
            yaml_document_start: false,
        }
    }
}
