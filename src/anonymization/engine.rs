//! Main redaction engine
//!
//! [`AnonymizationEngine`] drives one document through every pipeline stage:
//!
//! 1. **Scan**: the rule detector and the person recognizer propose spans
//! 2. **Resolve**: the precedence resolver keeps one winner per range
//! 3. **Canonicalize**: spans are bound to canonical entities; inflected
//!    forms of known persons are swept up as extra occurrences
//! 4. **Tag**: spans are rewritten as `[[TYPE_N]]` tokens
//! 5. **End-scan / cleanup / verify**: see [`ConsistencyEnforcer`]
//! 6. **Finalize**: the map is built under the storage policy and audited
//!
//! # Examples
//!
//! ```no_run
//! use redakt::anonymization::{AnonymizationEngine, config::AnonymizationConfig};
//!
//! # fn example() -> redakt::domain::Result<()> {
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//! let document = engine.anonymize("smlouva.txt", "Rodné číslo: 930715/1245")?;
//! assert_eq!(document.text, "Rodné číslo: [[BIRTH_ID_1]]");
//! # Ok(())
//! # }
//! ```

use crate::anonymization::{
    audit::AuditLogger,
    config::AnonymizationConfig,
    context::{DocumentContext, ProcessingStage},
    detector::{patterns::PatternRegistry, regex::RegexDetector, PiiDetector},
    enforcer::{verify_bijection, ConsistencyEnforcer},
    models::{AnonymizedDocument, CandidateSpan, EntityType, PersonMention},
    persons::{find_word_occurrences, NameDictionary, PersonCanonicalizer, PersonRecognizer},
    policy::{Mode, StoragePolicyTable},
    resolver::PrecedenceResolver,
};
use crate::domain::{RedaktError, Result};
use crate::{log_document_complete, log_document_start, log_stage};
use std::sync::Arc;
use std::time::Instant;

/// Rule name of occurrences found by the known-variant sweep
pub const RULE_PERSON_VARIANT: &str = "person_variant";

/// Main redaction engine
///
/// The engine holds only read-only state (rule table, dictionary, policy)
/// and is shared across batch workers behind an `Arc`. Every call to
/// [`anonymize`](Self::anonymize) works on its own [`DocumentContext`].
pub struct AnonymizationEngine {
    config: AnonymizationConfig,
    detectors: Vec<Arc<dyn PiiDetector>>,
    canonicalizer: PersonCanonicalizer,
    resolver: PrecedenceResolver,
    enforcer: ConsistencyEnforcer,
    policy: StoragePolicyTable,
    audit_logger: Option<AuditLogger>,
    variant_priority: u32,
}

impl AnonymizationEngine {
    /// Create a new engine
    ///
    /// # Errors
    ///
    /// Returns [`RedaktError::Configuration`] if:
    /// - configuration validation fails
    /// - the rule table cannot be loaded or is malformed
    /// - the audit logger cannot be initialized
    ///
    /// An unreadable name dictionary is not an error; recognition degrades
    /// to context-based person rules.
    pub fn new(config: AnonymizationConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| RedaktError::Configuration(format!("{e:#}")))?;

        let registry = match config.pattern_library {
            Some(ref path) => PatternRegistry::from_file(path),
            None => PatternRegistry::default_rules(),
        }
        .map_err(|e| RedaktError::Configuration(format!("{e:#}")))?;
        let registry = Arc::new(registry);

        let dictionary = Arc::new(NameDictionary::load(config.dictionary.as_deref()));

        let detectors: Vec<Arc<dyn PiiDetector>> = vec![
            Arc::new(RegexDetector::with_registry(Arc::clone(&registry))),
            Arc::new(PersonRecognizer::new(
                Arc::clone(&dictionary),
                config.first_name_heuristic.clone(),
                &registry,
            )),
        ];

        let audit_logger = if config.audit.enabled {
            Some(
                AuditLogger::new(config.audit.log_path.clone(), config.audit.json_format, true)
                    .map_err(|e| RedaktError::Configuration(format!("{e:#}")))?,
            )
        } else {
            None
        };

        let variant_priority = registry
            .structural(RULE_PERSON_VARIANT)
            .map_or(85, |s| s.priority);

        tracing::debug!(
            mode = %config.mode,
            rules = registry.rules().len(),
            names = dictionary.len(),
            "Redaction engine ready"
        );

        Ok(Self {
            policy: StoragePolicyTable::new(config.mode, &config.storage_policy),
            canonicalizer: PersonCanonicalizer::new(dictionary),
            resolver: PrecedenceResolver::new(),
            enforcer: ConsistencyEnforcer::new(registry),
            detectors,
            audit_logger,
            variant_priority,
            config,
        })
    }

    /// Redact one document
    ///
    /// Either every stage completes and a verified [`AnonymizedDocument`]
    /// is returned, or the document fails as a whole. Zero findings is a
    /// valid outcome.
    ///
    /// # Errors
    ///
    /// - [`RedaktError::InvalidInput`] when `text` already contains tokens
    /// - [`RedaktError::Detection`] when a detector fails
    /// - [`RedaktError::Inconsistency`] when the token/map bijection fails
    pub fn anonymize(&self, document_id: &str, text: &str) -> Result<AnonymizedDocument> {
        let start = Instant::now();
        log_document_start!(document_id, text.len());

        let mut ctx = DocumentContext::new(document_id, text)?;

        let candidates = self.scan(ctx.text())?;
        log_stage!(document_id, ProcessingStage::Scanned, candidates.len());
        ctx.record_candidates(candidates.clone())?;

        let resolved = self.resolver.resolve(candidates);
        let reserved: Vec<(usize, usize)> = resolved.iter().map(|s| (s.start, s.end)).collect();
        ctx.record_resolution(resolved)?;
        log_stage!(document_id, ProcessingStage::Resolved, ctx.accepted().len());

        let bound = self.canonicalize(&mut ctx, &reserved);
        ctx.record_canonicalization(bound)?;
        log_stage!(document_id, ProcessingStage::Canonicalized, ctx.entities().len());

        let written = ctx.apply_tags()?;
        log_stage!(document_id, ProcessingStage::Tagged, written);

        let retagged = self.enforcer.end_scan(&mut ctx)?;
        log_stage!(document_id, ProcessingStage::EndScanned, retagged);

        let dropped = self.enforcer.cleanup(&mut ctx)?;
        log_stage!(document_id, ProcessingStage::Cleaned, dropped.len());

        let map = ctx.build_map(&self.policy);
        verify_bijection(document_id, ctx.text(), &map, Some(ctx.occurrences()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        let document = ctx.finalize(map, &self.policy, elapsed)?;
        log_document_complete!(document_id, document.entity_count(), elapsed);

        if let Some(ref logger) = self.audit_logger {
            logger
                .log_document(&document)
                .map_err(|e| RedaktError::Io(format!("{e:#}")))?;
        }

        Ok(document)
    }

    /// Candidates of every detector over `text`
    fn scan(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        let mut candidates = Vec::new();
        for detector in &self.detectors {
            let found = detector
                .scan(text)
                .map_err(|e| RedaktError::Detection(format!("{}: {e:#}", detector.name())))?;
            tracing::trace!(detector = detector.name(), candidates = found.len(), "Scan finished");
            candidates.extend(found);
        }
        Ok(candidates)
    }

    /// Bind every accepted span to a canonical entity and add the
    /// occurrences of known full names that no detector proposed
    fn canonicalize(
        &self,
        ctx: &mut DocumentContext,
        reserved: &[(usize, usize)],
    ) -> Vec<CandidateSpan> {
        let accepted = ctx.accepted().to_vec();

        let mentions: Vec<(usize, PersonMention)> = accepted
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.person.clone().map(|m| (i, m)))
            .collect();
        let resolution = self
            .canonicalizer
            .canonicalize(&mentions.iter().map(|(_, m)| m.clone()).collect::<Vec<_>>());
        let person_ids: Vec<usize> = resolution
            .names
            .iter()
            .map(|name| ctx.intern_person(name.clone()))
            .collect();

        let mut entity_of = vec![None; accepted.len()];
        for ((i, _), identity) in mentions.iter().zip(&resolution.assignment) {
            entity_of[*i] = Some(person_ids[*identity]);
        }

        let mut bound: Vec<CandidateSpan> = accepted
            .into_iter()
            .zip(entity_of)
            .map(|(span, id)| {
                let id = id.unwrap_or_else(|| ctx.intern_value(span.entity_type, &span.text));
                span.bound_to(id)
            })
            .collect();

        let text = ctx.text();
        let mut sweep = Vec::new();
        for (name, &id) in resolution.names.iter().zip(&person_ids) {
            if !name.is_full() {
                continue;
            }
            for variant in name.surface_variants() {
                for (start, end) in find_word_occurrences(text, &variant) {
                    sweep.push(
                        CandidateSpan::new(
                            start,
                            end,
                            EntityType::Person,
                            &text[start..end],
                            self.variant_priority,
                            RULE_PERSON_VARIANT,
                        )
                        .bound_to(id),
                    );
                }
            }
        }
        let swept = self.resolver.resolve_with_reserved(sweep, reserved);
        if !swept.is_empty() {
            tracing::debug!(
                document = %ctx.document_id(),
                occurrences = swept.len(),
                "Known person variants added"
            );
        }
        bound.extend(swept);
        bound
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn policy(&self) -> &StoragePolicyTable {
        &self.policy
    }

    pub fn enforcer(&self) -> &ConsistencyEnforcer {
        &self.enforcer
    }

    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }
}
