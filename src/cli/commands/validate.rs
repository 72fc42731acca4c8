//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Redakt configuration file and the resources it points to.

use crate::anonymization::detector::patterns::PatternRegistry;
use crate::anonymization::persons::NameDictionary;
use crate::config::{load_config, DEFAULT_CONFIG_FILE};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        tracing::info!(config_path = %config_path.display(), "Validating configuration");

        println!("🔍 Validating configuration file: {}", config_path.display());
        println!();

        // Loading also applies REDAKT_* overrides and validates
        let config = match load_config(&config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let registry = match config.anonymization.pattern_library {
            Some(ref path) => PatternRegistry::from_file(path),
            None => PatternRegistry::default_rules(),
        };
        let registry = match registry {
            Ok(registry) => registry,
            Err(e) => {
                println!("❌ Rule table is invalid");
                println!("   Error: {e:#}");
                return Ok(2);
            }
        };

        let dictionary_status = match config.anonymization.dictionary {
            Some(ref path) => match NameDictionary::from_file(path) {
                Ok(dictionary) => format!("{} ({} names)", path.display(), dictionary.len()),
                Err(e) => {
                    println!("⚠️  Name dictionary could not be loaded: {e}");
                    println!("   Person recognition falls back to context rules");
                    format!("{} (unavailable)", path.display())
                }
            },
            None => "embedded".to_string(),
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Mode: {}", config.anonymization.mode);
        println!(
            "  Rule Table: {} ({} rules)",
            config
                .anonymization
                .pattern_library
                .as_ref()
                .map_or_else(|| "embedded".to_string(), |p| p.display().to_string()),
            registry.rules().len()
        );
        println!("  Name Dictionary: {dictionary_status}");
        if !config.anonymization.storage_policy.is_empty() {
            println!("  Storage Policy Overrides:");
            for (entity_type, policy) in &config.anonymization.storage_policy {
                println!("    {entity_type}: {policy:?}");
            }
        }
        println!(
            "  Output Directory: {}",
            config
                .output
                .directory
                .as_ref()
                .map_or_else(|| "next to inputs".to_string(), |p| p.display().to_string())
        );
        println!("  Overwrite: {}", config.output.overwrite);
        println!("  Max Parallel: {}", config.batch.max_parallel);
        println!(
            "  Audit Log: {}",
            if config.anonymization.audit.enabled {
                config.anonymization.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_args_creation() {
        let args = ValidateArgs {};
        let _ = format!("{args:?}");
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let args = ValidateArgs {};
        let code = args
            .execute(Some(Path::new("/nonexistent/redakt.toml")))
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_validate_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[anonymization.audit]\nenabled = false\n")
            .unwrap();
        file.flush().unwrap();

        let args = ValidateArgs {};
        assert_eq!(args.execute(Some(file.path())).await.unwrap(), 0);
    }
}
