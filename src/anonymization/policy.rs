//! Operating mode and storage policy
//!
//! The mode decides how much of each original value survives in the entity map.
//!
//! # Modes
//!
//! ## Test
//!
//! Every value is stored in full so the tagged text can be restored and audited.
//!
//! ## Production
//!
//! High-sensitivity categories (bank accounts, IBAN, cards, credentials, keys)
//! are stored as an opaque marker or a last-four-digits partial reveal.
//! Everything else is kept in full.
//!
//! The mode is consulted only through [`StoragePolicyTable`], a per-type lookup
//! built once per engine.
//!
//! # Examples
//!
//! ```
//! use redakt::anonymization::models::EntityType;
//! use redakt::anonymization::policy::{Mode, StoragePolicy, StoragePolicyTable};
//! use std::collections::BTreeMap;
//!
//! let table = StoragePolicyTable::new(Mode::Production, &BTreeMap::new());
//! assert_eq!(table.policy_for(EntityType::Card), StoragePolicy::Partial);
//! assert_eq!(table.stored_value(EntityType::Card, "4532 1234 5678 9012"), "…9012");
//! assert_eq!(table.policy_for(EntityType::Email), StoragePolicy::Full);
//! ```

use crate::anonymization::models::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Opaque marker stored for redacted values
pub const REDACTED_MARKER: &str = "***REDACTED***";

/// Operating mode
///
/// Serialized in lowercase: `"test"`, `"production"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full values for every entity (reversible audit)
    #[default]
    Test,

    /// Irreversible placeholders for high-sensitivity entities
    Production,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Test => write!(f, "test"),
            Mode::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "test" => Ok(Mode::Test),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(format!(
                "Invalid mode '{other}'. Must be one of: test, production"
            )),
        }
    }
}

/// How a value is kept in the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoragePolicy {
    /// Original value
    Full,
    /// Last four alphanumeric characters, e.g. `…9012`
    Partial,
    /// [`REDACTED_MARKER`]
    Redacted,
}

/// Production-mode default for an entity type
pub fn default_production_policy(entity_type: EntityType) -> StoragePolicy {
    match entity_type {
        EntityType::Card | EntityType::Bank | EntityType::Iban => StoragePolicy::Partial,
        t if t.is_high_sensitivity() => StoragePolicy::Redacted,
        _ => StoragePolicy::Full,
    }
}

/// Storage policy per entity type for one mode
#[derive(Debug, Clone)]
pub struct StoragePolicyTable {
    mode: Mode,
    policies: HashMap<EntityType, StoragePolicy>,
}

impl StoragePolicyTable {
    /// Build the table for `mode`; `overrides` apply in production mode only
    pub fn new(mode: Mode, overrides: &BTreeMap<EntityType, StoragePolicy>) -> Self {
        let policies = EntityType::ALL
            .iter()
            .map(|&t| {
                let policy = match mode {
                    Mode::Test => StoragePolicy::Full,
                    Mode::Production => overrides
                        .get(&t)
                        .copied()
                        .unwrap_or_else(|| default_production_policy(t)),
                };
                (t, policy)
            })
            .collect();

        Self { mode, policies }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn policy_for(&self, entity_type: EntityType) -> StoragePolicy {
        self.policies
            .get(&entity_type)
            .copied()
            .unwrap_or(StoragePolicy::Redacted)
    }

    /// Whether the original value of `entity_type` is retained
    pub fn retains_original(&self, entity_type: EntityType) -> bool {
        self.policy_for(entity_type) == StoragePolicy::Full
    }

    /// Value written to the map for an original value
    pub fn stored_value(&self, entity_type: EntityType, original: &str) -> String {
        match self.policy_for(entity_type) {
            StoragePolicy::Full => original.to_string(),
            StoragePolicy::Partial => partial_reveal(original),
            StoragePolicy::Redacted => REDACTED_MARKER.to_string(),
        }
    }
}

fn partial_reveal(original: &str) -> String {
    let tail: Vec<char> = original
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if tail.len() < 8 {
        return REDACTED_MARKER.to_string();
    }
    let last_four: String = tail[tail.len() - 4..].iter().collect();
    format!("…{last_four}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("test".parse::<Mode>(), Ok(Mode::Test));
        assert_eq!("PRODUCTION".parse::<Mode>(), Ok(Mode::Production));
        assert!("staging".parse::<Mode>().is_err());
        assert_eq!(Mode::default(), Mode::Test);
        assert_eq!(Mode::Production.to_string(), "production");
    }

    #[test]
    fn test_test_mode_stores_everything() {
        let table = StoragePolicyTable::new(Mode::Test, &BTreeMap::new());
        for t in EntityType::ALL {
            assert_eq!(table.policy_for(t), StoragePolicy::Full);
        }
        assert_eq!(table.stored_value(EntityType::Password, "Heslo123"), "Heslo123");
    }

    #[test]
    fn test_production_defaults() {
        let table = StoragePolicyTable::new(Mode::Production, &BTreeMap::new());
        assert_eq!(table.stored_value(EntityType::Iban, "CZ65 0800 0000 1920 0014 5399"), "…5399");
        assert_eq!(table.stored_value(EntityType::Bank, "19-2000145399/0800"), "…0800");
        assert_eq!(table.stored_value(EntityType::ApiKey, "sk_live_abcdef1234567890"), REDACTED_MARKER);
        assert_eq!(table.stored_value(EntityType::Person, "Jan Novák"), "Jan Novák");
        assert!(!table.retains_original(EntityType::Card));
        assert!(table.retains_original(EntityType::Phone));
    }

    #[test]
    fn test_production_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert(EntityType::Card, StoragePolicy::Redacted);
        overrides.insert(EntityType::BirthId, StoragePolicy::Redacted);
        let table = StoragePolicyTable::new(Mode::Production, &overrides);
        assert_eq!(table.stored_value(EntityType::Card, "4111 1111 1111 1111"), REDACTED_MARKER);
        assert_eq!(table.policy_for(EntityType::BirthId), StoragePolicy::Redacted);

        let test_table = StoragePolicyTable::new(Mode::Test, &overrides);
        assert_eq!(test_table.policy_for(EntityType::Card), StoragePolicy::Full);
    }

    #[test]
    fn test_partial_reveal_short_values_are_redacted() {
        assert_eq!(partial_reveal("123"), REDACTED_MARKER);
        assert_eq!(partial_reveal("4532 1234 5678 9012"), "…9012");
    }
}
