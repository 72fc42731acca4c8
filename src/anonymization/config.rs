//! Anonymization configuration

use crate::anonymization::models::EntityType;
use crate::anonymization::policy::{Mode, StoragePolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Engine configuration (`[anonymization]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Operating mode (test or production)
    #[serde(default)]
    pub mode: Mode,

    /// Path to a given-name dictionary (JSON); the embedded one is used when unset
    #[serde(default)]
    pub dictionary: Option<PathBuf>,

    /// Path to a rule table TOML file; the embedded one is used when unset
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Production-mode storage overrides per entity type
    #[serde(default)]
    pub storage_policy: BTreeMap<EntityType, StoragePolicy>,

    /// Standalone first-name heuristic
    #[serde(default)]
    pub first_name_heuristic: FirstNameHeuristicConfig,

    /// Audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Test,
            dictionary: None,
            pattern_library: None,
            storage_policy: BTreeMap::new(),
            first_name_heuristic: FirstNameHeuristicConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl AnonymizationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                anyhow::bail!("Pattern library file not found: {}", path.display());
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                anyhow::bail!("Pattern library must be a TOML file: {}", path.display());
            }
        }

        for (entity_type, policy) in &self.storage_policy {
            if !entity_type.is_taggable() {
                anyhow::bail!("storage_policy: {entity_type} is never stored in a map");
            }
            if entity_type.is_high_sensitivity() && *policy == StoragePolicy::Full {
                anyhow::bail!(
                    "storage_policy: {entity_type} is high-sensitivity and cannot be stored in full in production mode"
                );
            }
        }

        self.first_name_heuristic
            .validate()
            .context("Invalid first-name heuristic configuration")?;

        self.audit
            .validate()
            .context("Invalid audit configuration")?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("REDAKT_ANONYMIZATION_MODE") {
            self.mode = val
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid REDAKT_ANONYMIZATION_MODE value")?;
        }

        if let Ok(val) = std::env::var("REDAKT_ANONYMIZATION_DICTIONARY") {
            self.dictionary = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("REDAKT_ANONYMIZATION_PATTERN_LIBRARY") {
            self.pattern_library = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("REDAKT_ANONYMIZATION_FIRST_NAME_THRESHOLD") {
            self.first_name_heuristic.threshold = val
                .parse()
                .context("Invalid REDAKT_ANONYMIZATION_FIRST_NAME_THRESHOLD value")?;
        }

        self.audit.apply_env_overrides()?;

        Ok(())
    }
}

/// Scoring of bare given names (`Jakub pracoval jako vedoucí`)
///
/// A dictionary hit earns the base score, a following verb form and a
/// sentence-initial position add to it; a neighbouring stoplist word
/// (street, square, institution) zeroes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstNameHeuristicConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum score for acceptance
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Verb forms that typically follow a person as subject
    #[serde(default = "default_verbs")]
    pub verbs: Vec<String>,

    /// Neighbouring words that mark a place or institution name
    #[serde(default = "default_stoplist")]
    pub stoplist: Vec<String>,
}

impl Default for FirstNameHeuristicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_threshold(),
            verbs: default_verbs(),
            stoplist: default_stoplist(),
        }
    }
}

impl FirstNameHeuristicConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            anyhow::bail!("threshold must be between 0.0 and 1.0, got {}", self.threshold);
        }
        Ok(())
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_audit_json_format")]
    pub json_format: bool,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f32 {
    0.75
}

fn default_verbs() -> Vec<String> {
    [
        "je", "byl", "byla", "bude", "má", "měl", "měla", "pracoval", "pracovala", "pracuje",
        "uvedl", "uvedla", "podepsal", "podepsala", "souhlasil", "souhlasila", "bydlí",
        "převzal", "převzala", "zaplatil", "zaplatila", "obdržel", "obdržela", "prohlásil",
        "prohlásila", "potvrdil", "potvrdila", "sdělil", "sdělila", "nastoupil", "nastoupila",
        "odešel", "odešla", "řekl", "řekla", "napsal", "napsala", "poslal", "poslala",
        "dostal", "dostala", "koupil", "koupila", "prodal", "prodala", "žije", "vedl", "vedla",
        "zastupuje", "zastupoval", "zastupovala", "jednal", "jednala", "požádal", "požádala",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_stoplist() -> Vec<String> {
    [
        "náměstí", "nám.", "ulice", "ulici", "ul.", "nábřeží", "třída", "tř.", "most", "sady",
        "park", "nemocnice", "škola", "gymnázium", "hotel", "kostel", "sv.", "svatého",
        "svaté", "nádraží", "centrum", "pasáž", "palác", "fakultní", "univerzita",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/redakt.log")
}

fn default_audit_json_format() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: default_audit_log_path(),
            json_format: default_audit_json_format(),
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            if let Some(parent) = self.log_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create audit log directory: {}", parent.display())
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("REDAKT_AUDIT_ENABLED") {
            self.enabled = val
                .parse()
                .context("Invalid REDAKT_AUDIT_ENABLED value")?;
        }

        if let Ok(val) = std::env::var("REDAKT_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("REDAKT_AUDIT_JSON_FORMAT") {
            self.json_format = val
                .parse()
                .context("Invalid REDAKT_AUDIT_JSON_FORMAT value")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnonymizationConfig::default();
        assert_eq!(config.mode, Mode::Test);
        assert!(config.dictionary.is_none());
        assert!(config.storage_policy.is_empty());
        assert!(config.first_name_heuristic.enabled);
        assert_eq!(config.first_name_heuristic.threshold, 0.75);
        assert!(config.audit.enabled);
        assert!(config.audit.json_format);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnonymizationConfig::default();
        config.audit.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_policy_from_toml() {
        let config: AnonymizationConfig = toml::from_str(
            r#"
mode = "production"

[storage_policy]
CARD = "redacted"
BIRTH_ID = "partial"

[first_name_heuristic]
threshold = 0.9
"#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.storage_policy.get(&EntityType::Card), Some(&StoragePolicy::Redacted));
        assert_eq!(config.first_name_heuristic.threshold, 0.9);
        assert!(!config.first_name_heuristic.verbs.is_empty());
    }

    #[test]
    fn test_full_storage_of_secrets_rejected() {
        let mut config = AnonymizationConfig::default();
        config.audit.enabled = false;
        config.storage_policy.insert(EntityType::Password, StoragePolicy::Full);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = AnonymizationConfig::default();
        config.audit.enabled = false;
        config.first_name_heuristic.threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
