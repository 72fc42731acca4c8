//! Tag allocation

use crate::anonymization::models::EntityType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Placeholder identifier `TYPE_N`, bound 1:1 to a canonical entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    entity_type: EntityType,
    seq: u32,
}

impl Tag {
    pub fn new(entity_type: EntityType, seq: u32) -> Self {
        Self { entity_type, seq }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Inline token form, `[[TYPE_N]]`
    pub fn token(&self) -> String {
        format!("[[{self}]]")
    }

    /// Parse `TYPE_N`; the label may itself contain underscores
    pub fn parse(s: &str) -> Option<Self> {
        let (label, seq) = s.rsplit_once('_')?;
        let seq: u32 = seq.parse().ok()?;
        if seq == 0 {
            return None;
        }
        let entity_type = EntityType::from_label(label)?;
        entity_type.is_taggable().then_some(Self { entity_type, seq })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.entity_type.label(), self.seq)
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Tag::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid tag: {raw}")))
    }
}

/// Per-type monotonic sequence counters for one document
#[derive(Debug, Default, Clone)]
pub struct TagAllocator {
    counters: HashMap<EntityType, u32>,
}

impl TagAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next tag for `entity_type`, starting at 1
    pub fn allocate(&mut self, entity_type: EntityType) -> Tag {
        let counter = self.counters.entry(entity_type).or_insert(0);
        *counter += 1;
        Tag::new(entity_type, *counter)
    }

    /// Number of tags issued so far for `entity_type`
    pub fn issued(&self, entity_type: EntityType) -> u32 {
        self.counters.get(&entity_type).copied().unwrap_or(0)
    }
}
