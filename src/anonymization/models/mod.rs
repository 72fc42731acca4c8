//! Data models shared across the pipeline

pub mod candidate;
pub mod document;
pub mod entity;

pub use candidate::{CandidateSpan, PersonMention};
pub use document::{AnonymizedDocument, Occurrence};
pub use entity::EntityType;
