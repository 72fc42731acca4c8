//! Precedence resolution between overlapping candidates

use crate::anonymization::models::CandidateSpan;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Greedy interval selection by rank.
///
/// Candidates are visited by (priority, start, longer first, rule name); a
/// candidate is accepted only when it intersects no accepted range. The
/// outcome does not depend on the order candidates were proposed in.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrecedenceResolver;

impl PrecedenceResolver {
    pub fn new() -> Self {
        Self
    }

    /// Accepted spans in document order
    pub fn resolve(&self, candidates: Vec<CandidateSpan>) -> Vec<CandidateSpan> {
        self.resolve_with_reserved(candidates, &[])
    }

    /// Like [`resolve`](Self::resolve), treating `reserved` ranges as already taken
    pub fn resolve_with_reserved(
        &self,
        mut candidates: Vec<CandidateSpan>,
        reserved: &[(usize, usize)],
    ) -> Vec<CandidateSpan> {
        candidates.retain(|c| !c.is_empty());
        candidates.sort_by(|a, b| {
            (a.priority, a.start, Reverse(a.len()), &a.rule)
                .cmp(&(b.priority, b.start, Reverse(b.len()), &b.rule))
        });

        // start -> end of every taken range
        let mut taken: BTreeMap<usize, usize> = BTreeMap::new();
        for &(start, end) in reserved {
            if end > start {
                let slot = taken.entry(start).or_insert(end);
                *slot = (*slot).max(end);
            }
        }

        let mut accepted = Vec::new();
        for candidate in candidates {
            if overlaps(&taken, candidate.start, candidate.end) {
                continue;
            }
            taken.insert(candidate.start, candidate.end);
            accepted.push(candidate);
        }

        accepted.sort_by_key(|c| c.start);
        accepted
    }
}

fn overlaps(taken: &BTreeMap<usize, usize>, start: usize, end: usize) -> bool {
    // reserved ranges may nest, so the nearest preceding range is not enough
    taken
        .range(..end)
        .rev()
        .any(|(&s, &e)| s < end && start < e)
}
