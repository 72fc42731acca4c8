//! Audit logger for redaction runs

use crate::anonymization::models::AnonymizedDocument;
use crate::anonymization::tagging::MapEntry;
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    document_id: String,
    mode: String,
    entity_count: usize,
    processing_time_ms: u64,
    entities: Vec<AuditEntity>,
}

/// Audit entity entry (with hashed value)
#[derive(Debug, Serialize)]
struct AuditEntity {
    #[serde(rename = "type")]
    entity_type: String,
    tag: String,
    occurrences: usize,
    /// SHA-256 hash of the stored value (never log plaintext PII)
    value_hash: String,
}

/// Append-only audit log, one record per finalized document
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
    // batch workers share one logger; lines must not interleave
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
            write_lock: Mutex::new(()),
        })
    }

    /// Log a finalized document
    pub fn log_document(&self, document: &AnonymizedDocument) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: document.timestamp.to_rfc3339(),
            document_id: document.document_id.clone(),
            mode: document.mode.to_string(),
            entity_count: document.entity_count(),
            processing_time_ms: document.processing_time_ms,
            entities: document
                .map
                .entries()
                .iter()
                .map(|e| self.create_audit_entity(e))
                .collect(),
        };

        self.write_entry(&entry)
    }

    fn create_audit_entity(&self, entry: &MapEntry) -> AuditEntity {
        AuditEntity {
            entity_type: entry.entity_type.label().to_string(),
            tag: entry.tag.to_string(),
            occurrences: entry.occurrences,
            value_hash: self.hash_value(&entry.value),
        }
    }

    /// Hash a value using SHA-256
    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        format!("{result:x}")
    }

    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let line = if self.json_format {
            serde_json::to_string(entry).context("Failed to serialize audit entry")?
        } else {
            format!(
                "[{}] Document: {} | Mode: {} | Entities: {} | Time: {}ms",
                entry.timestamp,
                entry.document_id,
                entry.mode,
                entry.entity_count,
                entry.processing_time_ms
            )
        };

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Audit log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;
        writeln!(file, "{line}").context("Failed to write audit entry")?;

        Ok(())
    }
}
