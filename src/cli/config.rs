//! Shell configuration
//!
//! Loaded from an optional JSON file; every key has a default and every
//! command-line flag overrides the file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::args::RunArgs;
use super::errors::{CliError, CliResult};
use crate::observability::Severity;
use crate::storage::StoreOptions;
use crate::validation::{FieldRule, RecordValidator, DEFAULT_PRESET};

/// Which storage engine the shell opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    File,
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Storage engine (default: memory)
    #[serde(default)]
    pub storage: StorageKind,

    /// Data file for file storage (default: cabinet.db)
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Validation preset name (default: "default")
    #[serde(default = "default_validation_rules")]
    pub validation_rules: String,

    /// Inline rule list; overrides the preset when present
    #[serde(default)]
    pub rules: Option<Vec<FieldRule>>,

    #[serde(default = "default_true")]
    pub case_sensitive_search: bool,

    /// Log every store call to `log_file`
    #[serde(default)]
    pub use_logger: bool,

    /// Time every store call and report on exit
    #[serde(default)]
    pub use_stopwatch: bool,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Minimum severity for stderr logging (default: WARN)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("cabinet.db")
}
fn default_validation_rules() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_file() -> PathBuf {
    PathBuf::from("filecabinet.log")
}
fn default_log_level() -> String {
    "WARN".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageKind::default(),
            data_file: default_data_file(),
            validation_rules: default_validation_rules(),
            rules: None,
            case_sensitive_search: true,
            use_logger: false,
            use_stopwatch: false,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Resolve the configuration for `run`: file (if given), then flags.
    pub fn resolve(args: &RunArgs) -> CliResult<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(storage) = args.storage {
            config.storage = storage;
        }
        if let Some(preset) = &args.validation_rules {
            config.validation_rules = preset.clone();
            config.rules = None;
        }
        if let Some(data_file) = &args.data_file {
            config.data_file = data_file.clone();
        }
        config.use_stopwatch |= args.use_stopwatch;
        config.use_logger |= args.use_logger;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        self.validator()?;
        self.log_severity()?;

        if self.storage == StorageKind::File && self.data_file.as_os_str().is_empty() {
            return Err(CliError::config_error("data_file must not be empty"));
        }

        Ok(())
    }

    /// The validator described by `rules` or, failing that, the preset.
    pub fn validator(&self) -> CliResult<RecordValidator> {
        match &self.rules {
            Some(rules) => Ok(RecordValidator::new(rules.clone())?),
            None => RecordValidator::from_preset(&self.validation_rules).ok_or_else(|| {
                CliError::config_error(format!(
                    "Unknown validation rules: '{}'. Expected 'default' or 'custom'.",
                    self.validation_rules
                ))
            }),
        }
    }

    pub fn log_severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            CliError::config_error(format!("Invalid log_level: '{}'", self.log_level))
        })
    }

    pub fn store_options(&self) -> CliResult<StoreOptions> {
        Ok(StoreOptions::new(self.validator()?).case_sensitive_search(self.case_sensitive_search))
    }

    /// Name of the active rule set, for the greeting line
    pub fn rules_name(&self) -> &str {
        if self.rules.is_some() {
            "inline"
        } else {
            &self.validation_rules
        }
    }
}
