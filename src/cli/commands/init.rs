//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::config::DEFAULT_CONFIG_FILE;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub output: PathBuf,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output.display(), "Initializing configuration file");

        println!("📝 Initializing Redakt configuration");
        println!();

        if self.output.exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output.display());
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output.display());
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output.display());
                println!("  2. Choose mode = \"test\" (reversible maps) or \"production\"");
                println!("  3. Point anonymization.dictionary at a given-name dictionary (optional)");
                println!("  4. Validate configuration: redakt validate-config");
                println!("  5. Redact documents: redakt anonymize ./documents");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Redakt Configuration File
# PII redaction for Czech legal documents

[application]
log_level = "info"
dry_run = false

[anonymization]
mode = "test"  # test | production

[anonymization.audit]
enabled = true
log_path = "./audit/redakt.log"
json_format = true

[output]
anon_suffix = "_anon"
map_suffix = "_map"
text_map = true
overwrite = false

[batch]
max_parallel = 4
shutdown_timeout_secs = 30

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Redakt Configuration File
# PII redaction for Czech legal documents
#
# This file contains all configuration options with examples and explanations.
#
# Values may reference environment variables as ${VAR_NAME}. Every setting
# can also be overridden with REDAKT_<SECTION>_<KEY>, for example
# REDAKT_ANONYMIZATION_MODE=production or REDAKT_BATCH_MAX_PARALLEL=8.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Run the whole pipeline without writing any output
dry_run = false

# ============================================================================
# Redaction
# ============================================================================
[anonymization]
# test:       every value is kept in the map (reversible, for auditing)
# production: high-sensitivity values are never stored, payment data is
#             reduced to its last four characters
mode = "test"

# Given-name dictionary (JSON). The embedded dictionary is used when unset.
# dictionary = "${REDAKT_DATA_DIR}/cz_names.json"

# Rule table (TOML). The embedded rule table is used when unset.
# pattern_library = "./rules/cz_patterns.toml"

# Production-mode storage per entity type: full | partial | redacted
# High-sensitivity types (CARD, BANK, PASSWORD, ...) cannot be "full".
[anonymization.storage_policy]
# BANK = "redacted"
# EMAIL = "full"

# Standalone first names ("Jakub pracoval ...") are tagged only when the
# heuristic score reaches the threshold.
[anonymization.first_name_heuristic]
enabled = true
threshold = 0.75

# One record per document with SHA-256 hashes instead of values
[anonymization.audit]
enabled = true
log_path = "./audit/redakt.log"
json_format = true

# ============================================================================
# Output
# ============================================================================
[output]
# Write outputs here instead of next to each input
# directory = "./redacted"

# smlouva.txt -> smlouva_anon.txt, smlouva_map.json, smlouva_map.txt
anon_suffix = "_anon"
map_suffix = "_map"

# Also write the flattened plain-text map
text_map = true

# Replace existing outputs
overwrite = false

# ============================================================================
# Batch Processing
# ============================================================================
[batch]
# Documents processed in parallel
max_parallel = 4

# Seconds to wait for in-flight documents after Ctrl+C / SIGTERM
shutdown_timeout_secs = 30

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "./logs"

# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedaktConfig;
    use tempfile::tempdir;

    #[test]
    fn test_templates_parse() {
        for template in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: RedaktConfig = toml::from_str(&template).unwrap();
            assert_eq!(config.batch.max_parallel, 4);
        }
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("redakt.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.clone(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[anonymization]"));
    }
}
