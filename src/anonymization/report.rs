//! Redaction statistics across documents
//!
//! A [`RedactionReport`] aggregates per-type counts and timings of finalized
//! documents. It never holds original values, so it can be printed or
//! written next to the outputs.

use crate::anonymization::models::{AnonymizedDocument, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated redaction statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionReport {
    /// Documents finalized
    pub total_documents: usize,

    /// Distinct canonical entities across all documents
    pub total_entities: usize,

    /// Token occurrences across all documents
    pub total_occurrences: usize,

    /// Distinct entities per type
    pub entities_by_type: BTreeMap<EntityType, usize>,

    /// Token occurrences per type
    pub occurrences_by_type: BTreeMap<EntityType, usize>,

    /// Warnings collected while processing
    pub warnings: Vec<String>,

    pub stats: ProcessingStats,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Average processing time per document (ms)
    pub avg_processing_time_ms: u64,

    /// Total processing time (ms)
    pub total_processing_time_ms: u64,

    pub documents_with_entities: usize,

    pub documents_without_entities: usize,
}

impl RedactionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the counts of a finalized document
    pub fn add_document(&mut self, document: &AnonymizedDocument) {
        self.total_documents += 1;
        self.stats.total_processing_time_ms += document.processing_time_ms;

        if document.map.is_empty() {
            self.stats.documents_without_entities += 1;
        } else {
            self.stats.documents_with_entities += 1;
        }

        for entry in document.map.entries() {
            *self.entities_by_type.entry(entry.entity_type).or_insert(0) += 1;
            self.total_entities += 1;
        }
        for (&entity_type, &count) in document.counts() {
            *self.occurrences_by_type.entry(entity_type).or_insert(0) += count;
            self.total_occurrences += count;
        }

        self.stats.avg_processing_time_ms =
            self.stats.total_processing_time_ms / self.total_documents as u64;
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();
        let rule = "───────────────────────────────────────────────────────────────\n";

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                       REDACTION REPORT                        \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n\n");

        output.push_str("SUMMARY\n");
        output.push_str(rule);
        output.push_str(&format!("  Documents redacted:          {}\n", self.total_documents));
        output.push_str(&format!(
            "  Documents with entities:     {}\n",
            self.stats.documents_with_entities
        ));
        output.push_str(&format!(
            "  Documents without entities:  {}\n",
            self.stats.documents_without_entities
        ));
        output.push_str(&format!("  Distinct entities:           {}\n", self.total_entities));
        output.push_str(&format!("  Tokens written:              {}\n", self.total_occurrences));
        output.push_str(&format!(
            "  Avg processing time:         {} ms\n\n",
            self.stats.avg_processing_time_ms
        ));

        if !self.entities_by_type.is_empty() {
            output.push_str("ENTITIES BY TYPE\n");
            output.push_str(rule);
            output.push_str(&format!("  {:20} {:>8} {:>8}\n", "type", "entities", "tokens"));

            let mut types: Vec<_> = self.entities_by_type.iter().collect();
            types.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (entity_type, count) in types {
                let tokens = self.occurrences_by_type.get(entity_type).copied().unwrap_or(0);
                output.push_str(&format!(
                    "  {:20} {:>8} {:>8}\n",
                    entity_type.label(),
                    count,
                    tokens
                ));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("WARNINGS\n");
            output.push_str(rule);
            for warning in &self.warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON report to `path`
    pub fn write_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = self.format_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::Occurrence;
    use crate::anonymization::policy::Mode;
    use crate::anonymization::tagging::{EntityMap, MapEntry, Tag};
    use chrono::Utc;

    fn document(entries: &[(EntityType, u32, usize)], ms: u64) -> AnonymizedDocument {
        let mut map = EntityMap::new("doc", Mode::Test);
        let mut occurrences = Vec::new();
        for &(entity_type, seq, count) in entries {
            let tag = Tag::new(entity_type, seq);
            map.insert(MapEntry {
                entity_type,
                tag,
                value: format!("value {seq}"),
                occurrences: count,
                variants: Vec::new(),
            });
            occurrences.extend((0..count).map(|_| Occurrence { tag, surface: None }));
        }
        AnonymizedDocument {
            document_id: "doc".into(),
            text: String::new(),
            map,
            occurrences,
            mode: Mode::Test,
            processing_time_ms: ms,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = RedactionReport::new();
        assert_eq!(report.total_documents, 0);
        assert!(report.entities_by_type.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_add_documents() {
        let mut report = RedactionReport::new();
        report.add_document(&document(
            &[(EntityType::Person, 1, 3), (EntityType::Person, 2, 1), (EntityType::Email, 1, 1)],
            10,
        ));
        report.add_document(&document(&[], 20));

        assert_eq!(report.total_documents, 2);
        assert_eq!(report.total_entities, 3);
        assert_eq!(report.total_occurrences, 5);
        assert_eq!(report.entities_by_type.get(&EntityType::Person), Some(&2));
        assert_eq!(report.occurrences_by_type.get(&EntityType::Person), Some(&4));
        assert_eq!(report.stats.documents_with_entities, 1);
        assert_eq!(report.stats.documents_without_entities, 1);
        assert_eq!(report.stats.avg_processing_time_ms, 15);
    }

    #[test]
    fn test_format_console() {
        let mut report = RedactionReport::new();
        report.add_document(&document(&[(EntityType::Iban, 1, 2)], 5));
        report.add_warning("smlouva2.txt: skipped");

        let output = report.format_console();
        assert!(output.contains("REDACTION REPORT"));
        assert!(output.contains("Documents redacted:          1"));
        assert!(output.contains("IBAN"));
        assert!(output.contains("smlouva2.txt: skipped"));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut report = RedactionReport::new();
        report.add_document(&document(&[(EntityType::Phone, 1, 1)], 1));
        let json = report.format_json().unwrap();
        let parsed: RedactionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.total_entities, 1);
    }
}
