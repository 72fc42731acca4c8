//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RedaktConfig;
use crate::domain::errors::RedaktError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "redakt.toml";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`RedaktConfig`]
/// 4. Applies environment variable overrides (`REDAKT_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`RedaktError::Configuration`] if any step fails.
///
/// # Examples
///
/// ```no_run
/// use redakt::config::loader::load_config;
///
/// let config = load_config("redakt.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RedaktConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RedaktError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RedaktError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let config: RedaktConfig = toml::from_str(&contents)
        .map_err(|e| RedaktError::Configuration(format!("Failed to parse TOML: {e}")))?;

    finish(config)
}

/// Loads `path` if given, else `./redakt.toml` if present, else defaults.
///
/// Environment overrides and validation apply in every case.
pub fn load_config_or_default(path: Option<&Path>) -> Result<RedaktConfig> {
    match resolve_config_path(path) {
        Some(path) => load_config(path),
        None => {
            tracing::debug!("No configuration file, using defaults");
            finish(RedaktConfig::default())
        }
    }
}

fn resolve_config_path(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn finish(mut config: RedaktConfig) -> Result<RedaktConfig> {
    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        RedaktError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid"))
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = env_var_regex().replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RedaktError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| RedaktError::Configuration(format!("Invalid {name} value: {value}")))
}

/// Applies environment variable overrides using the `REDAKT_*` prefix
///
/// Variables follow the pattern `REDAKT_<SECTION>_<KEY>`, for example
/// `REDAKT_BATCH_MAX_PARALLEL` or `REDAKT_ANONYMIZATION_MODE`.
fn apply_env_overrides(config: &mut RedaktConfig) -> Result<()> {
    if let Ok(val) = std::env::var("REDAKT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("REDAKT_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_env("REDAKT_APPLICATION_DRY_RUN", &val)?;
    }

    config
        .anonymization
        .apply_env_overrides()
        .map_err(|e| RedaktError::Configuration(format!("{e:#}")))?;

    if let Ok(val) = std::env::var("REDAKT_OUTPUT_DIRECTORY") {
        config.output.directory = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("REDAKT_OUTPUT_OVERWRITE") {
        config.output.overwrite = parse_env("REDAKT_OUTPUT_OVERWRITE", &val)?;
    }
    if let Ok(val) = std::env::var("REDAKT_OUTPUT_TEXT_MAP") {
        config.output.text_map = parse_env("REDAKT_OUTPUT_TEXT_MAP", &val)?;
    }

    if let Ok(val) = std::env::var("REDAKT_BATCH_MAX_PARALLEL") {
        config.batch.max_parallel = parse_env("REDAKT_BATCH_MAX_PARALLEL", &val)?;
    }

    if let Ok(val) = std::env::var("REDAKT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("REDAKT_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("REDAKT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
