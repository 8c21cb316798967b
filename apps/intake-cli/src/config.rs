//! # Importer Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                              │
//! │     --format ndjson                                                    │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     INTAKE_LOG_LEVEL=debug                                             │
//! │     INTAKE_FAIL_ON_REJECT=false                                        │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/intake/intake.toml (Linux)                               │
//! │     ~/Library/Application Support/dev.intake.intake/intake.toml (macOS)│
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # intake.toml
//! [import]
//! format = "auto"        # auto | json | ndjson
//! fail_on_reject = true
//! max_records = 10000
//! emit_search_keys = true
//!
//! [schemas]
//! vehicle_max_year = 2026
//! max_line_items = 500
//! enum_list_limit = 10
//!
//! [log]
//! level = "info"
//! json = false
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use intake_core::{SchemaSettings, FIRST_VEHICLE_YEAR};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

// =============================================================================
// Input Format
// =============================================================================

/// How the input file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// One JSON document if the whole file parses, NDJSON otherwise.
    #[default]
    Auto,

    /// One JSON object, or an array of objects.
    Json,

    /// One JSON value per non-blank line.
    Ndjson,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Auto => write!(f, "auto"),
            InputFormat::Json => write!(f, "json"),
            InputFormat::Ndjson => write!(f, "ndjson"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(InputFormat::Auto),
            "json" => Ok(InputFormat::Json),
            "ndjson" | "jsonl" | "jsonlines" => Ok(InputFormat::Ndjson),
            other => Err(CliError::InvalidConfig(format!(
                "Unknown input format: '{}'. Valid options: auto, json, ndjson",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[import]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    #[serde(default)]
    pub format: InputFormat,

    /// Exit non-zero when any record is rejected.
    #[serde(default = "default_true")]
    pub fail_on_reject: bool,

    /// Refuse inputs holding more records than this.
    #[serde(default)]
    pub max_records: Option<usize>,

    /// Attach `search_key` to accepted records of searchable kinds.
    #[serde(default = "default_true")]
    pub emit_search_keys: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            format: InputFormat::default(),
            fail_on_reject: true,
            max_records: None,
            emit_search_keys: true,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON objects instead of text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default)]
    pub import: ImportSettings,

    /// Passed straight to the schema registry.
    #[serde(default)]
    pub schemas: SchemaSettings,

    #[serde(default)]
    pub log: LogSettings,

    /// File the values were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,

    /// `INTAKE_*` variables that were applied.
    #[serde(skip)]
    pub overrides: Vec<&'static str>,

    /// `INTAKE_*` variables that were set but could not be parsed.
    #[serde(skip)]
    pub ignored: Vec<&'static str>,
}

impl IntakeConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (intake.toml)
    /// 3. Environment variables
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>) -> CliResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                let contents = std::fs::read_to_string(&path).map_err(|source| CliError::Read {
                    path: path.clone(),
                    source,
                })?;
                config = toml::from_str(&contents)?;
                config.source = Some(path);
            } else if explicit {
                return Err(CliError::InvalidConfig(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CliResult<()> {
        if self.import.max_records == Some(0) {
            return Err(CliError::InvalidConfig(
                "max_records must be greater than 0".into(),
            ));
        }

        if self.schemas.max_line_items == 0 {
            return Err(CliError::InvalidConfig(
                "max_line_items must be greater than 0".into(),
            ));
        }

        if self.schemas.enum_list_limit == 0 {
            return Err(CliError::InvalidConfig(
                "enum_list_limit must be greater than 0".into(),
            ));
        }

        if let Some(year) = self.schemas.vehicle_max_year {
            if year < FIRST_VEHICLE_YEAR {
                return Err(CliError::InvalidConfig(format!(
                    "vehicle_max_year must be at least {}, got: {}",
                    FIRST_VEHICLE_YEAR, year
                )));
            }
        }

        if let Err(e) = EnvFilter::try_new(&self.log.level) {
            return Err(CliError::InvalidConfig(format!(
                "Invalid log level '{}': {}",
                self.log.level, e
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `INTAKE_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("INTAKE_LOG_LEVEL") {
            self.log.level = level;
            self.overrides.push("INTAKE_LOG_LEVEL");
        }

        if let Some(json) = lookup("INTAKE_LOG_JSON") {
            match parse_flag(&json) {
                Some(flag) => {
                    self.log.json = flag;
                    self.overrides.push("INTAKE_LOG_JSON");
                }
                None => self.ignored.push("INTAKE_LOG_JSON"),
            }
        }

        if let Some(fail) = lookup("INTAKE_FAIL_ON_REJECT") {
            match parse_flag(&fail) {
                Some(flag) => {
                    self.import.fail_on_reject = flag;
                    self.overrides.push("INTAKE_FAIL_ON_REJECT");
                }
                None => self.ignored.push("INTAKE_FAIL_ON_REJECT"),
            }
        }

        if let Some(max) = lookup("INTAKE_MAX_RECORDS") {
            match max.parse::<usize>() {
                Ok(parsed) => {
                    self.import.max_records = Some(parsed);
                    self.overrides.push("INTAKE_MAX_RECORDS");
                }
                Err(_) => self.ignored.push("INTAKE_MAX_RECORDS"),
            }
        }

        if let Some(year) = lookup("INTAKE_VEHICLE_MAX_YEAR") {
            match year.parse::<i32>() {
                Ok(parsed) => {
                    self.schemas.vehicle_max_year = Some(parsed);
                    self.overrides.push("INTAKE_VEHICLE_MAX_YEAR");
                }
                Err(_) => self.ignored.push("INTAKE_VEHICLE_MAX_YEAR"),
            }
        }
    }

    /// Reports where the configuration came from. Call once logging is up;
    /// [`IntakeConfig::load`] runs before the subscriber exists.
    pub fn log_loaded(&self) {
        match &self.source {
            Some(path) => info!(path = %path.display(), "Loaded intake config from file"),
            None => debug!("No config file found, using defaults"),
        }

        if !self.overrides.is_empty() {
            debug!(overrides = ?self.overrides, "Applied environment overrides");
        }

        for name in &self.ignored {
            warn!(variable = %name, "Ignoring unparseable environment override");
        }

        info!(
            format = %self.import.format,
            fail_on_reject = self.import.fail_on_reject,
            "Configuration loaded"
        );
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "intake", "intake")
            .map(|dirs| dirs.config_dir().join("intake.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
