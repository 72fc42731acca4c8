//! Detection and tagging engine
//!
//! Finds personal and sensitive values in Czech legal text and replaces each
//! one with a stable `[[TYPE_N]]` token, recording a token → value map.
//!
//! # Architecture
//!
//! - **Detection**: rule table ([`detector`]) and person recognizer ([`persons`])
//! - **Resolution**: one winner per character range ([`resolver`])
//! - **Canonicalization**: inflected forms collapse to one entity ([`context`])
//! - **Tagging**: per-type sequences and the entity map ([`tagging`], [`policy`])
//! - **Consistency**: end-scan, cleanup and bijection check ([`enforcer`])
//! - **Audit**: hashed per-document records ([`audit`])
//!
//! # Usage
//!
//! ```rust,ignore
//! use redakt::anonymization::{AnonymizationEngine, config::AnonymizationConfig};
//!
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//! let document = engine.anonymize("smlouva.txt", &text)?;
//! println!("{}", document.map_text());
//! ```

pub mod audit;
pub mod config;
pub mod context;
pub mod detector;
pub mod enforcer;
pub mod engine;
pub mod models;
pub mod persons;
pub mod policy;
pub mod report;
pub mod resolver;
pub mod tagging;

pub use config::AnonymizationConfig;
pub use engine::AnonymizationEngine;
pub use models::{AnonymizedDocument, EntityType};
pub use policy::Mode;
pub use report::RedactionReport;
