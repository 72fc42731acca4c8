//! Entity map: the audit record binding tags to stored values

use super::allocator::Tag;
use crate::anonymization::models::EntityType;
use crate::anonymization::policy::Mode;
use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Map format version written into every JSON map
pub const MAP_FORMAT_VERSION: &str = "1.0";

/// One tag and what it stands for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub tag: Tag,
    /// Stored value according to the active storage policy
    pub value: String,
    /// Number of times the tag occurs in the tagged text
    pub occurrences: usize,
    /// Distinct surface forms (recorded only for fully stored values)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

/// Ordered map of tags to stored values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMap {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub document: String,
    pub mode: Mode,
    entities: Vec<MapEntry>,
    #[serde(default)]
    counts: BTreeMap<EntityType, usize>,
}

impl EntityMap {
    pub fn new(document: impl Into<String>, mode: Mode) -> Self {
        Self {
            version: MAP_FORMAT_VERSION.to_string(),
            generated_at: Utc::now(),
            document: document.into(),
            mode,
            entities: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    /// Insert an entry, keeping entries ordered by type then sequence number.
    /// An entry with an already present tag replaces the old one.
    pub fn insert(&mut self, entry: MapEntry) {
        match self.entities.binary_search_by(|e| e.tag.cmp(&entry.tag)) {
            Ok(pos) => self.entities[pos] = entry,
            Err(pos) => self.entities.insert(pos, entry),
        }
        self.refresh_counts();
    }

    /// Remove the entry for `tag`
    pub fn remove(&mut self, tag: &Tag) -> Option<MapEntry> {
        let pos = self.entities.iter().position(|e| &e.tag == tag)?;
        let removed = self.entities.remove(pos);
        self.refresh_counts();
        Some(removed)
    }

    pub fn get(&self, tag: &Tag) -> Option<&MapEntry> {
        self.entities
            .binary_search_by(|e| e.tag.cmp(tag))
            .ok()
            .map(|pos| &self.entities[pos])
    }

    /// Reverse lookup: the tag whose stored value equals `value`.
    /// Redacted and partially stored values are not unique and never match.
    pub fn tag_for_value(&self, entity_type: EntityType, value: &str) -> Option<Tag> {
        self.entities
            .iter()
            .find(|e| e.entity_type == entity_type && e.value == value && !e.variants.is_empty())
            .map(|e| e.tag)
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn tags(&self) -> BTreeSet<Tag> {
        self.entities.iter().map(|e| e.tag).collect()
    }

    /// Set the occurrence count of every entry
    pub fn set_occurrences(&mut self, counts: &BTreeMap<Tag, usize>) {
        for entry in &mut self.entities {
            entry.occurrences = counts.get(&entry.tag).copied().unwrap_or(0);
        }
        self.refresh_counts();
    }

    /// Occurrence totals per entity type
    pub fn counts(&self) -> &BTreeMap<EntityType, usize> {
        &self.counts
    }

    fn refresh_counts(&mut self) {
        self.counts.clear();
        for entry in &self.entities {
            *self.counts.entry(entry.entity_type).or_insert(0) += entry.occurrences;
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON map written by [`EntityMap::to_json`]
    pub fn from_json(content: &str) -> Result<Self> {
        let mut map: EntityMap = serde_json::from_str(content)?;
        map.entities.sort_by(|a, b| a.tag.cmp(&b.tag));
        map.refresh_counts();
        Ok(map)
    }

    /// Flattened plain-text rendering, one section per entity type
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "ENTITY MAP  {}", self.document);
        let _ = writeln!(
            out,
            "mode: {}  generated: {}",
            self.mode,
            self.generated_at.to_rfc3339()
        );

        let mut current: Option<EntityType> = None;
        for entry in &self.entities {
            if current != Some(entry.entity_type) {
                current = Some(entry.entity_type);
                let header = entry.entity_type.label();
                let _ = writeln!(out);
                let _ = writeln!(out, "{header}");
                let _ = writeln!(out, "{}", "-".repeat(header.len()));
            }
            let _ = writeln!(out, "{}: {}", entry.tag.token(), entry.value);
            if entry.entity_type == EntityType::Person {
                for variant in entry.variants.iter().filter(|v| **v != entry.value) {
                    let _ = writeln!(out, "  - {variant}");
                }
            }
        }

        if !self.counts.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "COUNTS");
            let _ = writeln!(out, "------");
            for (entity_type, count) in &self.counts {
                let _ = writeln!(out, "{entity_type}: {count}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entity_type: EntityType, seq: u32, value: &str, occurrences: usize) -> MapEntry {
        MapEntry {
            entity_type,
            tag: Tag::new(entity_type, seq),
            value: value.to_string(),
            occurrences,
            variants: vec![value.to_string()],
        }
    }

    #[test]
    fn test_entries_are_ordered_by_type_then_sequence() {
        let mut map = EntityMap::new("doc.txt", Mode::Test);
        map.insert(entry(EntityType::Phone, 1, "777 123 456", 1));
        map.insert(entry(EntityType::Person, 2, "Eva Malá", 1));
        map.insert(entry(EntityType::Person, 1, "Jan Novák", 3));

        let tags: Vec<String> = map.entries().iter().map(|e| e.tag.to_string()).collect();
        assert_eq!(tags, vec!["PERSON_1", "PERSON_2", "PHONE_1"]);
        assert_eq!(map.counts().get(&EntityType::Person), Some(&4));
    }

    #[test]
    fn test_lookups() {
        let mut map = EntityMap::new("doc.txt", Mode::Test);
        map.insert(entry(EntityType::Email, 1, "jan@example.cz", 1));

        let tag = Tag::new(EntityType::Email, 1);
        assert_eq!(map.get(&tag).unwrap().value, "jan@example.cz");
        assert_eq!(map.tag_for_value(EntityType::Email, "jan@example.cz"), Some(tag));
        assert_eq!(map.tag_for_value(EntityType::Phone, "jan@example.cz"), None);

        assert!(map.remove(&tag).is_some());
        assert!(map.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let mut map = EntityMap::new("smlouva.txt", Mode::Production);
        map.insert(entry(EntityType::BirthId, 1, "930715/1245", 2));

        let json = map.to_json().unwrap();
        assert!(json.contains("\"version\": \"1.0\""));
        assert!(json.contains("\"type\": \"BIRTH_ID\""));
        assert!(json.contains("\"tag\": \"BIRTH_ID_1\""));

        let back = EntityMap::from_json(&json).unwrap();
        assert_eq!(back.entries(), map.entries());
        assert_eq!(back.mode, Mode::Production);
    }

    #[test]
    fn test_render_text_lists_person_variants() {
        let mut map = EntityMap::new("doc.txt", Mode::Test);
        let mut person = entry(EntityType::Person, 1, "Jan Novák", 2);
        person.variants.push("Jana Nováka".to_string());
        map.insert(person);

        let text = map.render_text();
        assert!(text.contains("PERSON\n------\n[[PERSON_1]]: Jan Novák\n  - Jana Nováka"));
        assert!(text.contains("PERSON: 2"));
    }
}
