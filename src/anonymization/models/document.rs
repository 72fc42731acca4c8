//! Anonymized document output

use super::entity::EntityType;
use crate::anonymization::policy::Mode;
use crate::anonymization::tagging::{find_tokens, EntityMap, Tag};
use crate::domain::{RedaktError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One token occurrence in the tagged text, in text order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub tag: Tag,
    /// Replaced surface text, kept only where the storage policy retains originals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
}

/// Result of running the pipeline over one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizedDocument {
    /// Caller-supplied document identifier (usually the file name)
    pub document_id: String,

    /// Rewritten text with `[[TYPE_N]]` tokens
    pub text: String,

    /// Tag → stored value map
    pub map: EntityMap,

    /// Token occurrences in text order
    pub occurrences: Vec<Occurrence>,

    pub mode: Mode,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,

    /// Completion timestamp
    pub timestamp: DateTime<Utc>,
}

impl AnonymizedDocument {
    /// Occurrence counts per entity type
    pub fn counts(&self) -> &BTreeMap<EntityType, usize> {
        self.map.counts()
    }

    /// Number of distinct canonical entities
    pub fn entity_count(&self) -> usize {
        self.map.len()
    }

    /// Plain-text rendering of the map
    pub fn map_text(&self) -> String {
        self.map.render_text()
    }

    /// Rebuild the original text by putting every surface form back.
    ///
    /// Fails when an occurrence did not retain its surface (production mode
    /// for high-sensitivity types) or when tokens and occurrences disagree.
    pub fn restore(&self) -> Result<String> {
        let tokens = find_tokens(&self.text);
        if tokens.len() != self.occurrences.len() {
            return Err(RedaktError::inconsistency(
                &self.document_id,
                format!(
                    "{} tokens in text but {} recorded occurrences",
                    tokens.len(),
                    self.occurrences.len()
                ),
            ));
        }

        let mut restored = String::with_capacity(self.text.len());
        let mut cursor = 0;
        for (token, occurrence) in tokens.iter().zip(&self.occurrences) {
            if token.tag != Some(occurrence.tag) {
                return Err(RedaktError::inconsistency(
                    &self.document_id,
                    format!("token {} does not match occurrence {}", token.raw, occurrence.tag),
                ));
            }
            let surface = occurrence.surface.as_deref().ok_or_else(|| {
                RedaktError::Validation(format!(
                    "original value of {} is not retained in {} mode",
                    occurrence.tag, self.mode
                ))
            })?;
            restored.push_str(&self.text[cursor..token.start]);
            restored.push_str(surface);
            cursor = token.end;
        }
        restored.push_str(&self.text[cursor..]);
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::tagging::MapEntry;

    fn document(surface: Option<&str>) -> AnonymizedDocument {
        let tag = Tag::new(EntityType::BirthId, 1);
        let mut map = EntityMap::new("doc", Mode::Test);
        map.insert(MapEntry {
            entity_type: EntityType::BirthId,
            tag,
            value: "930715/1245".into(),
            occurrences: 1,
            variants: vec!["930715/1245".into()],
        });
        AnonymizedDocument {
            document_id: "doc".into(),
            text: "Rodné číslo: [[BIRTH_ID_1]].".into(),
            map,
            occurrences: vec![Occurrence {
                tag,
                surface: surface.map(str::to_string),
            }],
            mode: Mode::Test,
            processing_time_ms: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_restore() {
        let doc = document(Some("930715/1245"));
        assert_eq!(doc.restore().unwrap(), "Rodné číslo: 930715/1245.");
        assert_eq!(doc.entity_count(), 1);
        assert_eq!(doc.counts().get(&EntityType::BirthId), Some(&1));
    }

    #[test]
    fn test_restore_without_surface_fails() {
        let doc = document(None);
        assert!(matches!(doc.restore(), Err(RedaktError::Validation(_))));
    }

    #[test]
    fn test_restore_detects_mismatch() {
        let mut doc = document(Some("930715/1245"));
        doc.occurrences.clear();
        assert!(doc.restore().unwrap_err().is_inconsistency());
    }
}
