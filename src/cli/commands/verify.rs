//! Verify command implementation
//!
//! Re-checks a tagged document against its JSON entity map: every token must
//! have a map entry, every entry must occur, the counts must agree, and the
//! end-scan rules must find no residual personal data.

use crate::anonymization::detector::patterns::PatternRegistry;
use crate::anonymization::enforcer::{verify_bijection, ConsistencyEnforcer};
use crate::anonymization::tagging::EntityMap;
use crate::config::load_config_or_default;
use crate::core::output::read_document;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Tagged document (`*_anon.txt`)
    pub anon: PathBuf,

    /// Entity map written with it (`*_map.json`)
    pub map: PathBuf,

    /// Skip the residual leak scan
    #[arg(long)]
    pub skip_leak_scan: bool,
}

impl VerifyArgs {
    /// Execute the verify command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
        tracing::info!(
            anon = %self.anon.display(),
            map = %self.map.display(),
            "Verifying tagged document"
        );

        println!("🔍 Verifying {}", self.anon.display());
        println!();

        let text = match read_document(&self.anon) {
            Ok(text) => text,
            Err(e) => {
                println!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let map = match std::fs::read_to_string(&self.map)
            .map_err(crate::domain::RedaktError::from)
            .and_then(|content| EntityMap::from_json(&content))
        {
            Ok(map) => map,
            Err(e) => {
                println!("❌ Failed to read entity map {}: {e}", self.map.display());
                return Ok(e.exit_code());
            }
        };

        if let Err(e) = verify_bijection(&map.document, &text, &map, None) {
            tracing::error!(error = %e, "Bijection check failed");
            println!("❌ {e}");
            return Ok(e.exit_code());
        }
        println!("✅ Tokens and map entries are in bijection");
        println!("  Document: {}", map.document);
        println!("  Mode: {}", map.mode);
        println!("  Map entries: {}", map.len());
        for (entity_type, count) in map.counts() {
            println!("    {entity_type}: {count}");
        }

        if self.skip_leak_scan {
            println!();
            return Ok(0);
        }

        let enforcer = match build_enforcer(config_path) {
            Ok(enforcer) => enforcer,
            Err(e) => {
                println!("❌ {e:#}");
                return Ok(2);
            }
        };

        let leaks = enforcer.residual_leaks(&text)?;
        println!();
        if leaks.is_empty() {
            println!("✅ No residual personal data found");
            println!();
            return Ok(0);
        }

        tracing::warn!(leaks = leaks.len(), "Residual personal data in tagged document");
        println!("❌ {} residual value(s) found:", leaks.len());
        for leak in &leaks {
            // positions only, never the value itself
            println!(
                "   {} at bytes {}..{} (rule {})",
                leak.entity_type, leak.start, leak.end, leak.rule
            );
        }
        println!();
        Ok(3)
    }
}

fn build_enforcer(config_path: Option<&Path>) -> anyhow::Result<ConsistencyEnforcer> {
    let config = load_config_or_default(config_path)?;
    let registry = match config.anonymization.pattern_library {
        Some(ref path) => PatternRegistry::from_file(path)?,
        None => PatternRegistry::default_rules()?,
    };
    Ok(ConsistencyEnforcer::new(Arc::new(registry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::EntityType;
    use crate::anonymization::policy::Mode;
    use crate::anonymization::tagging::{MapEntry, Tag};
    use tempfile::tempdir;

    fn write_pair(dir: &Path, text: &str, occurrences: usize) -> (PathBuf, PathBuf) {
        let mut map = EntityMap::new("smlouva.txt", Mode::Test);
        map.insert(MapEntry {
            entity_type: EntityType::Phone,
            tag: Tag::new(EntityType::Phone, 1),
            value: "777 123 456".into(),
            occurrences,
            variants: vec![],
        });
        let anon = dir.join("smlouva_anon.txt");
        let map_path = dir.join("smlouva_map.json");
        std::fs::write(&anon, text).unwrap();
        std::fs::write(&map_path, map.to_json().unwrap()).unwrap();
        (anon, map_path)
    }

    #[tokio::test]
    async fn test_verify_consistent_pair() {
        let dir = tempdir().unwrap();
        let (anon, map) = write_pair(dir.path(), "Tel.: [[PHONE_1]]", 1);
        let args = VerifyArgs {
            anon,
            map,
            skip_leak_scan: true,
        };
        assert_eq!(args.execute(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_verify_count_mismatch() {
        let dir = tempdir().unwrap();
        let (anon, map) = write_pair(dir.path(), "Tel.: [[PHONE_1]], [[PHONE_1]]", 1);
        let args = VerifyArgs {
            anon,
            map,
            skip_leak_scan: true,
        };
        assert_eq!(args.execute(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_verify_orphan_token() {
        let dir = tempdir().unwrap();
        let (anon, map) = write_pair(dir.path(), "Tel.: [[PHONE_1]] [[EMAIL_1]]", 1);
        let args = VerifyArgs {
            anon,
            map,
            skip_leak_scan: true,
        };
        assert_eq!(args.execute(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_verify_missing_map() {
        let dir = tempdir().unwrap();
        let (anon, _) = write_pair(dir.path(), "Tel.: [[PHONE_1]]", 1);
        let args = VerifyArgs {
            anon,
            map: dir.path().join("missing.json"),
            skip_leak_scan: true,
        };
        assert_eq!(args.execute(None).await.unwrap(), 1);
    }
}
