//! Consistency enforcement over tagged text
//!
//! Three passes run after tagging:
//!
//! - **End-scan**: the `end_scan` rules plus two structural passes (ALL-CAPS or
//!   diacritic-free renderings of known persons, known addresses repeated
//!   without their postal code) search the tagged text for values that
//!   escaped the first pass.
//! - **Cleanup**: entities whose token no longer occurs lose their tag.
//! - **Verification**: the token set of the text and the tag set of the map
//!   must be in bijection with matching occurrence counts. A violation is a
//!   hard failure and is never corrected automatically.

use crate::anonymization::context::DocumentContext;
use crate::anonymization::detector::patterns::PatternRegistry;
use crate::anonymization::detector::regex::RegexDetector;
use crate::anonymization::detector::{discard_token_overlaps, PiiDetector};
use crate::anonymization::models::{CandidateSpan, EntityType, Occurrence};
use crate::anonymization::persons::{find_word_occurrences, fold};
use crate::anonymization::resolver::PrecedenceResolver;
use crate::anonymization::tagging::{find_tokens, EntityMap, Tag};
use crate::domain::{RedaktError, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

pub const RULE_PERSON_CAPS: &str = "person_caps";
pub const RULE_ADDRESS_VARIANT: &str = "address_variant";

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{L}+(?:-\p{L}+)*").expect("word pattern is valid"))
}

fn postal_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}\s?\d{2}\b\s*").expect("postal code pattern is valid"))
}

/// End-scan, cleanup and bijection checks
pub struct ConsistencyEnforcer {
    end_scan: RegexDetector,
    resolver: PrecedenceResolver,
    person_caps_priority: u32,
    address_variant_priority: u32,
}

impl ConsistencyEnforcer {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        let person_caps_priority = registry
            .structural(RULE_PERSON_CAPS)
            .map_or(86, |s| s.priority);
        let address_variant_priority = registry
            .structural(RULE_ADDRESS_VARIANT)
            .map_or(61, |s| s.priority);
        Self {
            end_scan: RegexDetector::end_scan(registry),
            resolver: PrecedenceResolver::new(),
            person_caps_priority,
            address_variant_priority,
        }
    }

    /// Resolved end-scan hits over the current (tagged) text of `ctx`
    pub fn end_scan_hits(&self, ctx: &DocumentContext) -> Result<Vec<CandidateSpan>> {
        let text = ctx.text();
        let mut hits = self
            .end_scan
            .scan(text)
            .map_err(|e| RedaktError::Detection(format!("end-scan: {e:#}")))?;
        hits.extend(self.person_caps_hits(ctx));
        hits.extend(self.address_variant_hits(ctx));

        let hits = discard_token_overlaps(text, hits);
        Ok(self
            .resolver
            .resolve(hits)
            .into_iter()
            .filter(|h| h.entity_type.is_taggable())
            .collect())
    }

    /// Run the end-scan pass and rewrite its hits
    pub fn end_scan(&self, ctx: &mut DocumentContext) -> Result<usize> {
        let hits = self.end_scan_hits(ctx)?;
        let found = hits.len();
        if found > 0 {
            tracing::debug!(
                document = %ctx.document_id(),
                hits = found,
                "End-scan retagged leaked values"
            );
        }
        ctx.apply_end_scan(hits)
    }

    /// Drop tags that no longer occur in the text
    pub fn cleanup(&self, ctx: &mut DocumentContext) -> Result<Vec<Tag>> {
        let dropped = ctx.cleanup()?;
        if !dropped.is_empty() {
            tracing::debug!(
                document = %ctx.document_id(),
                dropped = dropped.len(),
                "Removed unused map entries"
            );
        }
        Ok(dropped)
    }

    /// Values an end-scan would still find in tagged text
    pub fn residual_leaks(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        let hits = self
            .end_scan
            .scan(text)
            .map_err(|e| RedaktError::Detection(format!("end-scan: {e:#}")))?;
        Ok(self
            .resolver
            .resolve(hits)
            .into_iter()
            .filter(|h| h.entity_type.is_taggable())
            .collect())
    }

    /// ALL-CAPS and diacritic-free renderings of known full names
    fn person_caps_hits(&self, ctx: &DocumentContext) -> Vec<CandidateSpan> {
        let mut folded: HashMap<String, usize> = HashMap::new();
        for (id, entity) in ctx.entities().iter().enumerate() {
            let Some(person) = entity.person.as_ref().filter(|p| p.is_full()) else {
                continue;
            };
            if entity.tag.is_none() {
                continue;
            }
            for variant in person.surface_variants() {
                folded.entry(fold(&variant)).or_insert(id);
            }
        }
        if folded.is_empty() {
            return Vec::new();
        }

        let text = ctx.text();
        let words: Vec<_> = word_regex().find_iter(text).collect();
        words
            .windows(2)
            .filter(|pair| {
                let gap = &text[pair[0].end()..pair[1].start()];
                !gap.is_empty() && gap.chars().all(|c| c == ' ' || c == '\t')
            })
            .filter_map(|pair| {
                let key = format!("{} {}", fold(pair[0].as_str()), fold(pair[1].as_str()));
                let id = *folded.get(&key)?;
                let (start, end) = (pair[0].start(), pair[1].end());
                Some(
                    CandidateSpan::new(
                        start,
                        end,
                        EntityType::Person,
                        &text[start..end],
                        self.person_caps_priority,
                        RULE_PERSON_CAPS,
                    )
                    .bound_to(id),
                )
            })
            .collect()
    }

    /// Known addresses written again without the postal code
    fn address_variant_hits(&self, ctx: &DocumentContext) -> Vec<CandidateSpan> {
        let text = ctx.text();
        let mut hits = Vec::new();
        for (id, entity) in ctx.entities().iter().enumerate() {
            if entity.entity_type != EntityType::Address || entity.tag.is_none() {
                continue;
            }
            for variant in &entity.variants {
                let stripped = postal_code_regex().replace_all(variant, "");
                let stripped = stripped.trim().trim_end_matches(',').trim();
                if stripped == variant.trim() || stripped.chars().count() < 6 {
                    continue;
                }
                for (start, end) in find_word_occurrences(text, stripped) {
                    hits.push(
                        CandidateSpan::new(
                            start,
                            end,
                            EntityType::Address,
                            &text[start..end],
                            self.address_variant_priority,
                            RULE_ADDRESS_VARIANT,
                        )
                        .bound_to(id),
                    );
                }
            }
        }
        hits
    }
}

/// Check that the tokens of `text` and the tags of `map` are in bijection.
///
/// Every token must parse as a known tag, every tag must occur at least once,
/// occurrence counts must agree, and when `occurrences` is given it must list
/// the tokens in text order.
pub fn verify_bijection(
    document_id: &str,
    text: &str,
    map: &EntityMap,
    occurrences: Option<&[Occurrence]>,
) -> Result<()> {
    let tokens = find_tokens(text);
    let mut counts: BTreeMap<Tag, usize> = BTreeMap::new();
    for token in &tokens {
        let tag = token.tag.ok_or_else(|| {
            RedaktError::inconsistency(document_id, format!("unknown token [[{}]]", token.raw))
        })?;
        *counts.entry(tag).or_insert(0) += 1;
    }

    for (tag, count) in &counts {
        let entry = map.get(tag).ok_or_else(|| {
            RedaktError::inconsistency(document_id, format!("tag {tag} has no map entry"))
        })?;
        if entry.occurrences != *count {
            return Err(RedaktError::inconsistency(
                document_id,
                format!(
                    "tag {tag} occurs {count} times but the map records {}",
                    entry.occurrences
                ),
            ));
        }
    }

    if let Some(orphan) = map.entries().iter().find(|e| !counts.contains_key(&e.tag)) {
        return Err(RedaktError::inconsistency(
            document_id,
            format!("map entry {} does not occur in the text", orphan.tag),
        ));
    }

    if let Some(occurrences) = occurrences {
        let in_text: Vec<Option<Tag>> = tokens.iter().map(|t| t.tag).collect();
        let recorded: Vec<Option<Tag>> = occurrences.iter().map(|o| Some(o.tag)).collect();
        if in_text != recorded {
            return Err(RedaktError::inconsistency(
                document_id,
                "occurrence list does not follow the tokens of the text",
            ));
        }
    }

    Ok(())
}
