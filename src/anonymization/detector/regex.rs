//! Rule-driven detector

use super::{discard_token_overlaps, patterns::PatternRegistry, PiiDetector};
use crate::anonymization::models::CandidateSpan;
use anyhow::Result;
use std::sync::Arc;

/// Which rules a [`RegexDetector`] runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Every rule except the end-scan-only sweeps, over raw text
    Full,
    /// Only rules flagged `end_scan`, over tagged text
    EndScan,
}

/// Detector running the compiled rule table
pub struct RegexDetector {
    pattern_registry: Arc<PatternRegistry>,
    mode: ScanMode,
}

impl RegexDetector {
    /// Create a detector over the built-in rule table
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_rules()?;
        Ok(Self::with_registry(Arc::new(registry)))
    }

    /// Create a detector over a shared rule table
    pub fn with_registry(registry: Arc<PatternRegistry>) -> Self {
        Self {
            pattern_registry: registry,
            mode: ScanMode::Full,
        }
    }

    /// Detector restricted to end-scan rules
    pub fn end_scan(registry: Arc<PatternRegistry>) -> Self {
        Self {
            pattern_registry: registry,
            mode: ScanMode::EndScan,
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.pattern_registry
    }
}

impl PiiDetector for RegexDetector {
    fn name(&self) -> &str {
        match self.mode {
            ScanMode::Full => "rules",
            ScanMode::EndScan => "end_scan_rules",
        }
    }

    fn scan(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        let mut candidates = Vec::new();

        for rule in self.pattern_registry.rules() {
            let selected = match self.mode {
                ScanMode::Full => !rule.end_scan_only,
                ScanMode::EndScan => rule.end_scan,
            };
            if selected {
                candidates.extend(rule.find(text)?);
            }
        }

        tracing::trace!(
            detector = self.name(),
            candidates = candidates.len(),
            "Rule scan complete"
        );

        Ok(discard_token_overlaps(text, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::EntityType;

    fn types(candidates: &[CandidateSpan]) -> Vec<EntityType> {
        candidates.iter().map(|c| c.entity_type).collect()
    }

    #[test]
    fn test_detect_email_and_phone() {
        let detector = RegexDetector::new().unwrap();
        let candidates = detector
            .scan("Kontakt: jan.novak@example.cz, tel.: +420 777 123 456")
            .unwrap();

        let found = types(&candidates);
        assert!(found.contains(&EntityType::Email));
        assert!(found.contains(&EntityType::Phone));
        assert!(candidates
            .iter()
            .any(|c| c.entity_type == EntityType::Phone && c.text == "+420 777 123 456"));
    }

    #[test]
    fn test_birth_id_and_bank_both_proposed() {
        let detector = RegexDetector::new().unwrap();
        let candidates = detector.scan("Rodné číslo: 930715/1245").unwrap();
        let found = types(&candidates);
        assert!(found.contains(&EntityType::BirthId));
        assert!(found.contains(&EntityType::Bank));
    }

    #[test]
    fn test_end_scan_mode_skips_other_rules() {
        let registry = Arc::new(PatternRegistry::default_rules().unwrap());
        let detector = RegexDetector::end_scan(registry);
        assert_eq!(detector.mode(), ScanMode::EndScan);

        let candidates = detector
            .scan("jan.novak@example.cz 4111 1111 1111 1111")
            .unwrap();
        let found = types(&candidates);
        assert!(found.contains(&EntityType::Card));
        assert!(!found.contains(&EntityType::Email));
    }

    #[test]
    fn test_tokens_are_not_rescanned() {
        let detector = RegexDetector::new().unwrap();
        let candidates = detector.scan("Heslo: [[PASSWORD_1]]").unwrap();
        assert!(candidates.is_empty());
    }
}
