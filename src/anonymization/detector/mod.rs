//! Entity detection
//!
//! Provides the trait-based detection interface and the rule-driven
//! implementation. Detectors only propose [`CandidateSpan`]s; the resolver
//! decides which of them survive.

pub mod patterns;
pub mod regex;
pub mod validators;

use crate::anonymization::models::CandidateSpan;
use crate::anonymization::tagging::token_ranges;
use anyhow::Result;

/// Trait for detector implementations
pub trait PiiDetector: Send + Sync {
    /// Detector name used in logs
    fn name(&self) -> &str;

    /// Propose candidate spans over `text`
    fn scan(&self, text: &str) -> Result<Vec<CandidateSpan>>;
}

/// Drop candidates that touch an existing `[[TYPE_N]]` token
pub fn discard_token_overlaps(text: &str, candidates: Vec<CandidateSpan>) -> Vec<CandidateSpan> {
    let tokens = token_ranges(text);
    if tokens.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| !tokens.iter().any(|&(s, e)| c.intersects(s, e)))
        .collect()
}
