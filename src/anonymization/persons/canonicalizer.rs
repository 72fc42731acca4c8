//! Declension-aware person identities
//!
//! Every person mention is reduced to a nominative [`PersonName`]. Mentions
//! that inflect the same name (`Jan Novák`, `Jana Nováka`, `Janu Novákovi`)
//! share an identity key and therefore a tag.

use super::declension::{
    first_name_readings, first_name_variants, infer_surname_nominative, surname_gender,
    surname_variants,
};
use super::dictionary::{fold, Gender, NameDictionary};
use crate::anonymization::models::PersonMention;
use std::collections::HashMap;
use std::sync::Arc;

/// Nominative name of one person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub first: Option<String>,
    pub last: Option<String>,
    pub gender: Gender,
}

impl PersonName {
    pub fn full(first: impl Into<String>, last: impl Into<String>, gender: Gender) -> Self {
        Self {
            first: Some(first.into()),
            last: Some(last.into()),
            gender,
        }
    }

    /// Identity key: folded first and last nominative
    pub fn key(&self) -> String {
        format!(
            "{}|{}",
            self.first.as_deref().map(fold).unwrap_or_default(),
            self.last.as_deref().map(fold).unwrap_or_default()
        )
    }

    pub fn is_full(&self) -> bool {
        self.first.is_some() && self.last.is_some()
    }

    /// Value shown in the map
    pub fn display(&self) -> String {
        match (&self.first, &self.last) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => String::new(),
        }
    }

    /// Inflected surface forms of the whole name
    pub fn surface_variants(&self) -> Vec<String> {
        match (&self.first, &self.last) {
            (Some(first), Some(last)) => {
                let firsts = first_name_variants(first, self.gender);
                let lasts = surname_variants(last);
                firsts
                    .iter()
                    .flat_map(|f| lasts.iter().map(move |l| format!("{f} {l}")))
                    .collect()
            }
            (Some(first), None) => first_name_variants(first, self.gender),
            (None, Some(last)) => surname_variants(last),
            (None, None) => Vec::new(),
        }
    }
}

/// Result of canonicalizing the person mentions of one document
#[derive(Debug, Clone, Default)]
pub struct PersonResolution {
    /// Distinct identities, full names first
    pub names: Vec<PersonName>,
    /// Identity index for each input mention
    pub assignment: Vec<usize>,
}

/// Maps person mentions to identities
pub struct PersonCanonicalizer {
    dictionary: Arc<NameDictionary>,
}

impl PersonCanonicalizer {
    pub fn new(dictionary: Arc<NameDictionary>) -> Self {
        Self { dictionary }
    }

    /// Nominative name for an observed `first last` pair.
    ///
    /// Each dictionary reading of the given name is scored by its own
    /// reading score, gender agreement with the inferred surname and whether
    /// it reproduces an identity in `known`.
    pub fn canonical_full(&self, first: &str, last: &str, known: &[PersonName]) -> PersonName {
        let inferred_last = infer_surname_nominative(last);
        let last_gender = surname_gender(&inferred_last);

        let mut best: Option<(u32, PersonName)> = None;
        for reading in first_name_readings(first, &self.dictionary) {
            let first_is_nominative = fold(&reading.nominative) == fold(first);
            // a nominative masculine given name keeps an `-a` surname as written (Jan Kolda)
            let candidate_last = if first_is_nominative
                && reading.gender != Gender::Female
                && last.ends_with('a')
            {
                last.to_string()
            } else {
                inferred_last.clone()
            };

            let gender = match reading.gender {
                Gender::Unisex => last_gender,
                g => g,
            };
            let candidate = PersonName::full(reading.nominative, candidate_last, gender);

            let mut score = u32::from(reading.score);
            score += match (reading.gender, last_gender) {
                (a, b) if a == b => 2,
                (Gender::Unisex, _) | (_, Gender::Unisex) => 1,
                _ => 0,
            };
            if known.iter().any(|k| k.key() == candidate.key()) {
                score += 3;
            }

            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, candidate));
            }
        }

        best.map(|(_, name)| name).unwrap_or_else(|| {
            PersonName::full(first.trim(), inferred_last.clone(), last_gender)
        })
    }

    /// Assign every mention to an identity.
    ///
    /// Full mentions are interned first so that partial mentions can merge
    /// into a full identity regardless of where it appears in the document.
    pub fn canonicalize(&self, mentions: &[PersonMention]) -> PersonResolution {
        let mut resolution = PersonResolution {
            names: Vec::new(),
            assignment: vec![0; mentions.len()],
        };
        let mut index: HashMap<String, usize> = HashMap::new();

        let mut intern = |names: &mut Vec<PersonName>, name: PersonName| -> usize {
            *index.entry(name.key()).or_insert_with(|| {
                names.push(name);
                names.len() - 1
            })
        };

        for (i, mention) in mentions.iter().enumerate() {
            if let PersonMention::Full { first, last } = mention {
                let name = self.canonical_full(first, last, &resolution.names);
                resolution.assignment[i] = intern(&mut resolution.names, name);
            }
        }

        let full_count = resolution.names.len();
        for (i, mention) in mentions.iter().enumerate() {
            let id = match mention {
                PersonMention::Full { .. } => continue,
                PersonMention::FirstOnly(observed) => {
                    let readings = first_name_readings(observed, &self.dictionary);
                    let matches: Vec<usize> = (0..full_count)
                        .filter(|&id| {
                            resolution.names[id].first.as_deref().is_some_and(|f| {
                                readings.iter().any(|r| fold(&r.nominative) == fold(f))
                            })
                        })
                        .collect();
                    match matches.as_slice() {
                        [only] => *only,
                        _ => {
                            let (nominative, gender) = readings
                                .first()
                                .map(|r| (r.nominative.clone(), r.gender))
                                .unwrap_or_else(|| (observed.clone(), Gender::Unisex));
                            intern(
                                &mut resolution.names,
                                PersonName {
                                    first: Some(nominative),
                                    last: None,
                                    gender,
                                },
                            )
                        }
                    }
                }
                PersonMention::SurnameOnly(observed) => {
                    let nominative = infer_surname_nominative(observed);
                    let folded_observed = fold(observed);
                    let matches: Vec<usize> = (0..full_count)
                        .filter(|&id| {
                            resolution.names[id].last.as_deref().is_some_and(|l| {
                                fold(l) == fold(&nominative)
                                    || surname_variants(l).iter().any(|v| fold(v) == folded_observed)
                            })
                        })
                        .collect();
                    match matches.as_slice() {
                        [only] => *only,
                        _ => {
                            let gender = surname_gender(&nominative);
                            intern(
                                &mut resolution.names,
                                PersonName {
                                    first: None,
                                    last: Some(nominative),
                                    gender,
                                },
                            )
                        }
                    }
                }
            };
            resolution.assignment[i] = id;
        }

        resolution
    }
}

/// Byte ranges of whole-word occurrences of `needle` in `text`
pub fn find_word_occurrences(text: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    text.match_indices(needle)
        .map(|(start, m)| (start, start + m.len()))
        .filter(|&(start, end)| {
            let before = text[..start].chars().next_back();
            let after = text[end..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
        .collect()
}
