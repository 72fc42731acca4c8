//! Configuration management for Redakt.
//!
//! TOML configuration with:
//! - environment variable substitution (`${VAR_NAME}`)
//! - `REDAKT_*` environment overrides
//! - defaults for every setting
//! - validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use redakt::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("redakt.toml")?;
//! println!("Mode: {}", config.anonymization.mode);
//! println!("Parallel documents: {}", config.batch.max_parallel);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level, dry run
//! - [`AnonymizationConfig`](crate::anonymization::AnonymizationConfig) - mode,
//!   dictionary, rule table, storage policy, first-name heuristic, audit
//! - [`OutputConfig`] - output directory, file suffixes, overwrite
//! - [`BatchConfig`] - parallelism and shutdown grace period
//! - [`LoggingConfig`] - log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [anonymization]
//! mode = "production"
//! dictionary = "${REDAKT_DATA_DIR}/cz_names.json"
//!
//! [anonymization.storage_policy]
//! BIRTH_ID = "partial"
//!
//! [output]
//! directory = "./redacted"
//!
//! [batch]
//! max_parallel = 8
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_or_default, DEFAULT_CONFIG_FILE};
pub use schema::{ApplicationConfig, BatchConfig, LoggingConfig, OutputConfig, RedaktConfig};
