//! Candidate spans produced by detectors

use super::entity::EntityType;

/// How a person candidate was phrased in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonMention {
    /// Given name followed by surname, as observed (possibly declined)
    Full { first: String, last: String },
    /// Bare given name
    FirstOnly(String),
    /// Bare surname (honorific or maiden-name context)
    SurnameOnly(String),
}

/// A provisional match of one entity type over a byte range of the text
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSpan {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    pub entity_type: EntityType,
    /// Matched surface text
    pub text: String,
    /// Precedence rank, lower wins
    pub priority: u32,
    /// Whether the producing rule required surrounding context
    pub contextual: bool,
    /// Name of the producing rule
    pub rule: String,
    /// Detector confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Parsed name parts for person candidates
    pub person: Option<PersonMention>,
    /// Canonical entity this span is already known to belong to
    /// (index into the document context), set by passes that search
    /// for variants of known entities
    pub bound_entity: Option<usize>,
}

impl CandidateSpan {
    /// Create a new candidate span
    pub fn new(
        start: usize,
        end: usize,
        entity_type: EntityType,
        text: impl Into<String>,
        priority: u32,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            entity_type,
            text: text.into(),
            priority,
            contextual: false,
            rule: rule.into(),
            confidence: 1.0,
            person: None,
            bound_entity: None,
        }
    }

    /// Mark the span as produced by a context-bearing rule
    pub fn with_context(mut self, contextual: bool) -> Self {
        self.contextual = contextual;
        self
    }

    /// Attach a confidence score
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Attach parsed person name parts
    pub fn with_person(mut self, mention: PersonMention) -> Self {
        self.person = Some(mention);
        self
    }

    /// Bind the span to an existing canonical entity
    pub fn bound_to(mut self, entity: usize) -> Self {
        self.bound_entity = Some(entity);
        self
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether the span intersects the half-open range `[start, end)`
    pub fn intersects(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}
