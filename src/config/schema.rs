//! Configuration schema types
//!
//! Every section has defaults, so an empty `redakt.toml` is a valid
//! configuration.

use crate::anonymization::config::AnonymizationConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Redakt configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedaktConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Detection, tagging and storage policy
    #[serde(default)]
    pub anonymization: AnonymizationConfig,

    /// Output file placement and naming
    #[serde(default)]
    pub output: OutputConfig,

    /// Batch processing
    #[serde(default)]
    pub batch: BatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RedaktConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.anonymization
            .validate()
            .map_err(|e| format!("anonymization: {e:#}"))?;
        self.output.validate()?;
        self.batch.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run the pipeline and report, but write no output files
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Output configuration
///
/// For an input `smlouva.txt` the outputs are `smlouva_anon.txt`,
/// `smlouva_map.json` and `smlouva_map.txt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory; outputs go next to each input when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Suffix of the redacted text file
    #[serde(default = "default_anon_suffix")]
    pub anon_suffix: String,

    /// Suffix of the map files
    #[serde(default = "default_map_suffix")]
    pub map_suffix: String,

    /// Also write the plain-text map rendering
    #[serde(default = "default_true")]
    pub text_map: bool,

    /// Replace existing output files
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            anon_suffix: default_anon_suffix(),
            map_suffix: default_map_suffix(),
            text_map: true,
            overwrite: false,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        for (name, suffix) in [("anon_suffix", &self.anon_suffix), ("map_suffix", &self.map_suffix)] {
            if suffix.is_empty() {
                return Err(format!("output.{name} cannot be empty"));
            }
            if suffix.contains(['/', '\\']) {
                return Err(format!("output.{name} cannot contain path separators"));
            }
        }
        if self.anon_suffix == self.map_suffix {
            return Err("output.anon_suffix and output.map_suffix must differ".to_string());
        }
        Ok(())
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Documents processed concurrently
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Grace period for in-flight documents after a shutdown signal
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_parallel == 0 || self.max_parallel > 256 {
            return Err(format!(
                "batch.max_parallel must be between 1 and 256, got {}",
                self.max_parallel
            ));
        }
        if self.shutdown_timeout_secs == 0 {
            return Err("batch.shutdown_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON log files
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_anon_suffix() -> String {
    "_anon".to_string()
}

fn default_map_suffix() -> String {
    "_map".to_string()
}

fn default_max_parallel() -> usize {
    4
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
