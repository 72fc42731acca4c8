//! Per-document processing state
//!
//! A [`DocumentContext`] carries one document through the pipeline stages
//! `RAW → SCANNED → RESOLVED → CANONICALIZED → TAGGED → END_SCANNED → CLEANED
//! → FINALIZED`. Stages only move forward; calling an operation out of order
//! is a pipeline error. Tag counters live here, so documents never share
//! numbering state.

use crate::anonymization::models::{
    AnonymizedDocument, CandidateSpan, EntityType, Occurrence,
};
use crate::anonymization::persons::{fold, PersonName};
use crate::anonymization::policy::StoragePolicyTable;
use crate::anonymization::tagging::{
    contains_tokens, find_tokens, EntityMap, MapEntry, Tag, TagAllocator,
};
use crate::domain::{RedaktError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Pipeline stage of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStage {
    Raw,
    Scanned,
    Resolved,
    Canonicalized,
    Tagged,
    EndScanned,
    Cleaned,
    Finalized,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "RAW",
            Self::Scanned => "SCANNED",
            Self::Resolved => "RESOLVED",
            Self::Canonicalized => "CANONICALIZED",
            Self::Tagged => "TAGGED",
            Self::EndScanned => "END_SCANNED",
            Self::Cleaned => "CLEANED",
            Self::Finalized => "FINALIZED",
        };
        f.write_str(name)
    }
}

/// One real-world entity of a document
#[derive(Debug, Clone)]
pub struct CanonicalEntity {
    pub entity_type: EntityType,
    /// Identity key the entity is interned under
    pub key: String,
    /// Tag, once the first occurrence has been rewritten
    pub tag: Option<Tag>,
    /// Distinct surface forms, in order of appearance
    pub variants: Vec<String>,
    /// Nominative name for persons
    pub person: Option<PersonName>,
}

impl CanonicalEntity {
    /// Original value the map stores for this entity.
    ///
    /// Persons use their nominative name; other types use the smallest
    /// surface form so the value does not depend on occurrence order.
    pub fn canonical_value(&self) -> String {
        if let Some(person) = &self.person {
            return person.display();
        }
        self.variants
            .iter()
            .min()
            .cloned()
            .unwrap_or_else(|| self.key.clone())
    }

    fn add_variant(&mut self, surface: &str) {
        if !self.variants.iter().any(|v| v == surface) {
            self.variants.push(surface.to_string());
        }
    }
}

/// Identity key of a non-person value.
///
/// Numeric identifiers ignore spacing and separators, network handles ignore
/// case, free-text locations ignore diacritics, and secrets are compared
/// exactly.
pub fn identity_key(entity_type: EntityType, value: &str) -> String {
    let value = value.trim();
    match entity_type {
        EntityType::Password
        | EntityType::ApiKey
        | EntityType::Secret
        | EntityType::SshKey
        | EntityType::Username
        | EntityType::AccountId
        | EntityType::VoiceId
        | EntityType::BioHash
        | EntityType::PhotoId
        | EntityType::GeneticId => value.to_string(),
        EntityType::Email
        | EntityType::Host
        | EntityType::Linkedin
        | EntityType::Facebook
        | EntityType::Instagram
        | EntityType::Skype => value.to_lowercase(),
        EntityType::Person
        | EntityType::Address
        | EntityType::BirthPlace
        | EntityType::BirthDate => fold(value)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end_matches(['.', ','])
            .to_string(),
        _ => {
            let compact: String = value
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_uppercase)
                .collect();
            if compact.is_empty() {
                value.to_string()
            } else {
                compact
            }
        }
    }
}

/// Working state of one document
#[derive(Debug)]
pub struct DocumentContext {
    document_id: String,
    stage: ProcessingStage,
    text: String,
    candidates: Vec<CandidateSpan>,
    accepted: Vec<CandidateSpan>,
    entities: Vec<CanonicalEntity>,
    index: HashMap<(EntityType, String), usize>,
    allocator: TagAllocator,
    occurrences: Vec<Occurrence>,
}

impl DocumentContext {
    /// Start a document in the `RAW` stage.
    ///
    /// Text that already contains `[[TYPE_N]]` tokens is rejected.
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let document_id = document_id.into();
        let text = text.into();
        if contains_tokens(&text) {
            return Err(RedaktError::InvalidInput(format!(
                "document '{document_id}' already contains placeholder tokens"
            )));
        }
        Ok(Self {
            document_id,
            stage: ProcessingStage::Raw,
            text,
            candidates: Vec::new(),
            accepted: Vec::new(),
            entities: Vec::new(),
            index: HashMap::new(),
            allocator: TagAllocator::new(),
            occurrences: Vec::new(),
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn stage(&self) -> ProcessingStage {
        self.stage
    }

    /// Current text: raw until `TAGGED`, tagged afterwards
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn candidates(&self) -> &[CandidateSpan] {
        &self.candidates
    }

    pub fn accepted(&self) -> &[CandidateSpan] {
        &self.accepted
    }

    pub fn entities(&self) -> &[CanonicalEntity] {
        &self.entities
    }

    pub fn entity(&self, index: usize) -> Option<&CanonicalEntity> {
        self.entities.get(index)
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    fn require(&self, expected: ProcessingStage) -> Result<()> {
        if self.stage != expected {
            return Err(RedaktError::Pipeline(format!(
                "document '{}' is in stage {} but {} was required",
                self.document_id, self.stage, expected
            )));
        }
        Ok(())
    }

    fn advance(&mut self, from: ProcessingStage, to: ProcessingStage) -> Result<()> {
        self.require(from)?;
        tracing::trace!(document = %self.document_id, from = %from, to = %to, "Stage transition");
        self.stage = to;
        Ok(())
    }

    /// `RAW → SCANNED`: store every detector proposal
    pub fn record_candidates(&mut self, candidates: Vec<CandidateSpan>) -> Result<()> {
        self.advance(ProcessingStage::Raw, ProcessingStage::Scanned)?;
        self.candidates = candidates;
        Ok(())
    }

    /// `SCANNED → RESOLVED`: store the winning spans, minus guard types
    pub fn record_resolution(&mut self, accepted: Vec<CandidateSpan>) -> Result<()> {
        self.advance(ProcessingStage::Scanned, ProcessingStage::Resolved)?;
        self.accepted = accepted
            .into_iter()
            .filter(|span| span.entity_type.is_taggable())
            .collect();
        Ok(())
    }

    /// Canonical entity for `(entity_type, key)`, created when first seen
    pub fn intern(&mut self, entity_type: EntityType, key: String) -> usize {
        if let Some(&existing) = self.index.get(&(entity_type, key.clone())) {
            return existing;
        }
        self.entities.push(CanonicalEntity {
            entity_type,
            key: key.clone(),
            tag: None,
            variants: Vec::new(),
            person: None,
        });
        let id = self.entities.len() - 1;
        self.index.insert((entity_type, key), id);
        id
    }

    /// Canonical entity for a non-person value
    pub fn intern_value(&mut self, entity_type: EntityType, value: &str) -> usize {
        self.intern(entity_type, identity_key(entity_type, value))
    }

    /// Canonical entity for a person
    pub fn intern_person(&mut self, name: PersonName) -> usize {
        let id = self.intern(EntityType::Person, name.key());
        self.entities[id].person.get_or_insert(name);
        id
    }

    /// Existing entity for a value, if any
    pub fn lookup_value(&self, entity_type: EntityType, value: &str) -> Option<usize> {
        self.index
            .get(&(entity_type, identity_key(entity_type, value)))
            .copied()
    }

    /// `RESOLVED → CANONICALIZED`: replace the accepted spans with their
    /// entity-bound version (which may include swept variant occurrences)
    pub fn record_canonicalization(&mut self, mut spans: Vec<CandidateSpan>) -> Result<()> {
        self.require(ProcessingStage::Resolved)?;
        if let Some(unbound) = spans.iter().find(|s| s.bound_entity.is_none()) {
            return Err(RedaktError::Pipeline(format!(
                "span {}..{} of rule '{}' has no canonical entity",
                unbound.start, unbound.end, unbound.rule
            )));
        }
        spans.sort_by_key(|s| s.start);
        self.accepted = spans;
        self.advance(ProcessingStage::Resolved, ProcessingStage::Canonicalized)
    }

    /// `CANONICALIZED → TAGGED`: rewrite every accepted span as its token
    pub fn apply_tags(&mut self) -> Result<usize> {
        self.require(ProcessingStage::Canonicalized)?;
        let spans = std::mem::take(&mut self.accepted);
        let written = self.rewrite(&spans)?;
        self.accepted = spans;
        self.advance(ProcessingStage::Canonicalized, ProcessingStage::Tagged)?;
        Ok(written)
    }

    /// `TAGGED → END_SCANNED`: rewrite end-scan hits.
    ///
    /// Hits bound to an entity keep it; other hits reuse the entity with the
    /// same identity key or create a new one, whose tag continues the
    /// per-type sequence.
    pub fn apply_end_scan(&mut self, hits: Vec<CandidateSpan>) -> Result<usize> {
        self.require(ProcessingStage::Tagged)?;
        let mut bound = Vec::with_capacity(hits.len());
        for hit in hits.into_iter().filter(|h| h.entity_type.is_taggable()) {
            let id = match hit.bound_entity {
                Some(id) => id,
                None => self.intern_value(hit.entity_type, &hit.text),
            };
            bound.push(hit.bound_to(id));
        }
        bound.sort_by_key(|s| s.start);
        let written = self.rewrite(&bound)?;
        self.advance(ProcessingStage::Tagged, ProcessingStage::EndScanned)?;
        Ok(written)
    }

    /// `END_SCANNED → CLEANED`: untag entities whose token no longer occurs.
    /// Returns the dropped tags; their numbers are not reused.
    pub fn cleanup(&mut self) -> Result<Vec<Tag>> {
        self.require(ProcessingStage::EndScanned)?;
        let present: BTreeSet<Tag> = find_tokens(&self.text)
            .into_iter()
            .filter_map(|t| t.tag)
            .collect();
        let mut dropped = Vec::new();
        for entity in &mut self.entities {
            if let Some(tag) = entity.tag {
                if !present.contains(&tag) {
                    dropped.push(tag);
                    entity.tag = None;
                }
            }
        }
        self.advance(ProcessingStage::EndScanned, ProcessingStage::Cleaned)?;
        Ok(dropped)
    }

    /// Map of every tagged entity under `policy`
    pub fn build_map(&self, policy: &StoragePolicyTable) -> EntityMap {
        let mut counts: BTreeMap<Tag, usize> = BTreeMap::new();
        for occurrence in &self.occurrences {
            *counts.entry(occurrence.tag).or_insert(0) += 1;
        }

        let mut map = EntityMap::new(&self.document_id, policy.mode());
        for entity in &self.entities {
            let Some(tag) = entity.tag else { continue };
            let retains = policy.retains_original(entity.entity_type);
            map.insert(MapEntry {
                entity_type: entity.entity_type,
                tag,
                value: policy.stored_value(entity.entity_type, &entity.canonical_value()),
                occurrences: counts.get(&tag).copied().unwrap_or(0),
                variants: if retains {
                    entity.variants.clone()
                } else {
                    Vec::new()
                },
            });
        }
        map
    }

    /// `CLEANED → FINALIZED`: produce the output document.
    ///
    /// `map` must have been built by [`build_map`](Self::build_map) and
    /// verified by the caller.
    pub fn finalize(
        mut self,
        map: EntityMap,
        policy: &StoragePolicyTable,
        processing_time_ms: u64,
    ) -> Result<AnonymizedDocument> {
        self.advance(ProcessingStage::Cleaned, ProcessingStage::Finalized)?;

        let occurrences = self
            .occurrences
            .into_iter()
            .map(|o| Occurrence {
                surface: o
                    .surface
                    .filter(|_| policy.retains_original(o.tag.entity_type())),
                tag: o.tag,
            })
            .collect();

        Ok(AnonymizedDocument {
            document_id: self.document_id,
            text: self.text,
            map,
            occurrences,
            mode: policy.mode(),
            processing_time_ms,
            timestamp: Utc::now(),
        })
    }

    fn tag_for(&mut self, id: usize) -> Result<Tag> {
        let entity = self.entities.get_mut(id).ok_or_else(|| {
            RedaktError::Pipeline(format!("unknown canonical entity #{id}"))
        })?;
        if let Some(tag) = entity.tag {
            return Ok(tag);
        }
        let tag = self.allocator.allocate(entity.entity_type);
        entity.tag = Some(tag);
        Ok(tag)
    }

    /// Replace `spans` (sorted, disjoint, entity-bound, outside existing
    /// tokens) with tokens, keeping the occurrence list in text order
    fn rewrite(&mut self, spans: &[CandidateSpan]) -> Result<usize> {
        let text = std::mem::take(&mut self.text);
        let tokens = find_tokens(&text);
        let previous = std::mem::take(&mut self.occurrences);
        if tokens.len() != previous.len() {
            return Err(RedaktError::inconsistency(
                &self.document_id,
                format!(
                    "{} tokens in text but {} recorded occurrences",
                    tokens.len(),
                    previous.len()
                ),
            ));
        }

        let mut out = String::with_capacity(text.len());
        let mut occurrences = Vec::with_capacity(previous.len() + spans.len());
        let mut existing = tokens.iter().zip(previous).peekable();
        let mut cursor = 0;

        for span in spans {
            while let Some((token, _)) = existing.peek() {
                if token.start >= span.start {
                    break;
                }
                if let Some((token, occurrence)) = existing.next() {
                    out.push_str(&text[cursor..token.end]);
                    occurrences.push(occurrence);
                    cursor = token.end;
                }
            }
            if span.start < cursor || span.end > text.len() {
                return Err(RedaktError::inconsistency(
                    &self.document_id,
                    format!("span {}..{} overlaps an earlier rewrite", span.start, span.end),
                ));
            }
            let id = span.bound_entity.ok_or_else(|| {
                RedaktError::Pipeline(format!("span of rule '{}' is unbound", span.rule))
            })?;
            let tag = self.tag_for(id)?;
            self.entities[id].add_variant(&span.text);

            out.push_str(&text[cursor..span.start]);
            out.push_str(&tag.token());
            occurrences.push(Occurrence {
                tag,
                surface: Some(span.text.clone()),
            });
            cursor = span.end;
        }
        for (token, occurrence) in existing {
            out.push_str(&text[cursor..token.end]);
            occurrences.push(occurrence);
            cursor = token.end;
        }
        out.push_str(&text[cursor..]);

        self.text = out;
        self.occurrences = occurrences;
        Ok(spans.len())
    }
}
