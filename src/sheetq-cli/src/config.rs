//! Configuration management for sheetq
//!
//! Settings come from four layers, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, else `./sheetq.toml`, else
//!    `$HOME/.config/sheetq/config.toml`)
//! 3. `SHEETQ_*` environment variables
//! 4. command-line flags

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sheetq_core::config::{DEFAULT_LIMIT, DEFAULT_MAX_EXPRESSION_LENGTH};
use sheetq_core::{EngineConfig, Error, Result, SheetSelector};

use crate::cli::Cli;

/// Main configuration structure for the sheetq command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the table comes from
    pub source: SourceConfig,
    /// Extra synonyms layered over the built-in dictionary
    pub synonyms: IndexMap<String, String>,
    /// Engine limits
    pub engine: EngineSettings,
    /// Output formatting
    pub output: OutputConfig,
    /// Diagnostics
    pub debug: DebugConfig,
}

/// Table source defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path used when neither the flags nor the instruction name a source
    pub path: Option<String>,
    /// Sheet index or name
    pub sheet: Option<SheetSetting>,
    /// Zero-based header row
    pub header_row: Option<usize>,
}

/// A sheet given in TOML either as a number or as a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetSetting {
    /// Zero-based position
    Index(usize),
    /// Sheet name (numeric text also selects by position)
    Name(String),
}

impl SheetSetting {
    /// Convert to the engine's selector
    #[must_use]
    pub fn to_selector(&self) -> SheetSelector {
        match self {
            SheetSetting::Index(i) => SheetSelector::Index(*i),
            SheetSetting::Name(name) => SheetSelector::parse(name),
        }
    }
}

/// Engine limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Longest accepted free-form condition
    pub max_expression_length: usize,
    /// Rows returned by `top` without an explicit limit
    pub default_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
            default_limit: DEFAULT_LIMIT,
        }
    }
}

/// Output formatting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON envelope
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// 0 = warn, 1 = info, 2 = debug, 3+ = trace
    pub verbosity: u8,
}

impl Config {
    /// Load defaults, the config file and the environment
    ///
    /// An explicit `path` must exist; otherwise the standard locations are
    /// searched and a missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        match path {
            Some(path) => config.merge_file(path)?,
            None => {
                if let Some(found) = Self::find_config_file(None) {
                    log::debug!("Using config file {}", found.display());
                    config.merge_file(&found)?;
                }
            }
        }

        config.merge_env()?;
        Ok(config)
    }

    /// Find a configuration file in the standard locations
    pub(crate) fn find_config_file(current_dir: Option<&Path>) -> Option<PathBuf> {
        let current_dir = current_dir.map_or_else(
            || std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            Path::to_path_buf,
        );

        let local = current_dir.join("sheetq.toml");
        if local.exists() {
            return Some(local);
        }

        let home = std::env::var("HOME").ok()?;
        let user = Path::new(&home)
            .join(".config")
            .join("sheetq")
            .join("config.toml");
        user.exists().then_some(user)
    }

    /// Merge configuration from a TOML file
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let file_config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML config: {e}")))?;
        self.merge(file_config);
        Ok(())
    }

    fn merge_env(&mut self) -> Result<()> {
        self.merge_env_with_reader(|key| std::env::var(key).ok())
    }

    /// Merge configuration from environment variables with a custom reader
    pub(crate) fn merge_env_with_reader<F>(&mut self, env_reader: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = env_reader("SHEETQ_SOURCE") {
            self.source.path = Some(val);
        }

        if let Some(val) = env_reader("SHEETQ_SHEET") {
            self.source.sheet = Some(SheetSetting::Name(val));
        }

        if let Some(val) = env_reader("SHEETQ_HEADER_ROW") {
            let row = val
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid SHEETQ_HEADER_ROW: {val}")))?;
            self.source.header_row = Some(row);
        }

        if let Some(val) = env_reader("SHEETQ_VERBOSITY") {
            self.debug.verbosity = val
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid SHEETQ_VERBOSITY: {val}")))?;
        }

        Ok(())
    }

    /// Merge another config into this one; values left at their defaults
    /// in `other` do not override
    fn merge(&mut self, other: Config) {
        if other.source.path.is_some() {
            self.source.path = other.source.path;
        }
        if other.source.sheet.is_some() {
            self.source.sheet = other.source.sheet;
        }
        if other.source.header_row.is_some() {
            self.source.header_row = other.source.header_row;
        }

        self.synonyms.extend(other.synonyms);

        let engine_defaults = EngineSettings::default();
        if other.engine.max_expression_length != engine_defaults.max_expression_length {
            self.engine.max_expression_length = other.engine.max_expression_length;
        }
        if other.engine.default_limit != engine_defaults.default_limit {
            self.engine.default_limit = other.engine.default_limit;
        }

        if !other.output.pretty {
            self.output.pretty = false;
        }
        if other.debug.verbosity > 0 {
            self.debug.verbosity = other.debug.verbosity;
        }
    }

    /// Apply command-line flags, the last layer
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(source) = &cli.source {
            self.source.path = Some(source.clone());
        }
        if let Some(sheet) = &cli.sheet {
            self.source.sheet = Some(SheetSetting::Name(sheet.clone()));
        }
        if let Some(row) = cli.header_row {
            self.source.header_row = Some(row);
        }
        if cli.compact {
            self.output.pretty = false;
        }
        if cli.verbose > 0 {
            self.debug.verbosity = cli.verbose;
        }
    }

    /// Engine settings built from this configuration
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_synonyms(self.synonyms.clone())
            .with_default_limit(self.engine.default_limit)
            .with_max_expression_length(self.engine.max_expression_length)
    }
}
