//! Person-name recognition
//!
//! Proposes person candidates from five structural shapes: titled names,
//! honorific mentions, maiden names, dictionary-validated `First Last` pairs
//! and scored bare given names. Rank and context flag of each shape come from
//! the `[[structural]]` entries of the rule table.

use super::declension::first_name_readings;
use super::dictionary::{fold, NameDictionary};
use crate::anonymization::config::FirstNameHeuristicConfig;
use crate::anonymization::detector::patterns::PatternRegistry;
use crate::anonymization::detector::{discard_token_overlaps, PiiDetector};
use crate::anonymization::models::{CandidateSpan, EntityType, PersonMention};
use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

pub const RULE_TITLED: &str = "person_titled";
pub const RULE_HONORIFIC: &str = "person_honorific";
pub const RULE_MAIDEN: &str = "person_maiden";
pub const RULE_STANDALONE_FIRST: &str = "person_standalone_first";
pub const RULE_FULL: &str = "person_full";

const DICTIONARY_SCORE: f32 = 0.4;
const VERB_SCORE: f32 = 0.4;
const SENTENCE_START_SCORE: f32 = 0.1;

/// Institution, legal-form and product words that never form a name
const CRITICAL_BLACKLIST: &[&str] = &[
    "sro", "spol", "ltd", "inc", "corp", "gmbh", "llc", "czech", "republic", "gymnazium",
    "university", "univerzita", "fakulta", "klinika", "nemocnice", "centrum", "ustav",
    "institute", "akademie", "windows", "linux", "office", "reditel", "reditelka", "jednatel",
    "jednatelka", "manager", "director", "chief", "officer", "vysetrovatel", "lekar", "doktor",
    "sestra", "spolecnost", "banka", "sporitelna", "komercni", "credit", "bank", "pojistovna",
];

/// Capitalized document vocabulary: headings, labels, places, months
const IGNORE_WORDS: &[&str] = &[
    "misto", "datum", "castku", "bytem", "sidlo", "adresa", "cislo", "kontakt", "telefon",
    "email", "rodne", "narozena", "narozen", "smlouva", "smlouvy", "dohoda", "stare", "mesto",
    "nove", "mala", "strana", "strany", "vaclavske", "namesti", "hlavni", "nadrazi", "ceska",
    "cesky", "ceske", "praha", "prahy", "praze", "brno", "brna", "brne", "ostrava", "plzen",
    "olomouc", "liberec", "kupni", "pracovni", "najemni", "darovaci", "prodavajici",
    "kupujici", "pronajimatel", "najemce", "zamestnavatel", "zamestnanec", "objednatel",
    "zhotovitel", "dluznik", "veritel", "clanek", "odstavec", "priloha", "predmet", "cena",
    "podpis", "dne", "pan", "pani", "ulice", "okres", "kraj", "soud", "policie", "urad",
    "financni", "statni", "republika", "evropska", "unie", "leden", "unor", "brezen", "duben",
    "kveten", "cerven", "cervenec", "srpen", "zari", "rijen", "listopad", "prosinec", "ledna",
    "unora", "brezna", "dubna", "kvetna", "cervna", "cervence", "srpna", "rijna", "listopadu",
    "prosince", "pondeli", "utery", "streda", "ctvrtek", "patek", "sobota", "nedele", "heslo",
    "login", "uzivatel", "ucet", "iban", "karta", "platnost", "poznamka", "vec", "prilohy",
];

/// Role nouns that precede or stand in for names
const ROLE_WORDS: &[&str] = &[
    "predseda", "predsedkyne", "mistopredseda", "clen", "clenka", "svedek", "svedkyne",
    "advokat", "advokatka", "notar", "notarka", "soudce", "soudkyne", "zastupce",
    "zastupkyne", "vedouci", "prokurista", "spravce", "likvidator", "insolvencni", "tajemnik",
    "tajemnice", "referent", "referentka", "asistent", "asistentka", "obchodni", "technicky",
    "personalni",
];

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{L}+(?:-\p{L}+)*").expect("word pattern is valid"))
}

fn titled_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:Ing|Mgr|Bc|MUDr|JUDr|PhDr|RNDr|MVDr|PharmDr|PaedDr|ThDr|Prof|prof|Doc|doc)\.(?:\s*(?:Ing|Mgr|Bc|MUDr|JUDr|PhDr|RNDr|Prof|prof|Doc|doc)\.)*\s*(\p{Lu}\p{Ll}+)(?:[ \t]+(\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?))?",
        )
        .expect("title pattern is valid")
    })
}

fn honorific_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:[Pp]an(?:a|u|e|em|í)?|[Ss]lečn(?:a|y|ě|u|ou))[ \t]+(\p{Lu}\p{Ll}+)(?:[ \t]+(\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?))?",
        )
        .expect("honorific pattern is valid")
    })
}

fn maiden_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\((?:rozená|rozenou|roz\.|dříve|dřív|původně)\s+(\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?)\)")
            .expect("maiden-name pattern is valid")
    })
}

fn legal_form_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*,?\s*(?:s\.\s?r\.\s?o\.|a\.\s?s\.|spol\.|k\.\s?s\.|v\.\s?o\.\s?s\.|ltd\b\.?|inc\b\.?|gmbh\b)")
            .expect("legal-form pattern is valid")
    })
}

#[derive(Debug, Clone, Copy)]
struct Shape {
    priority: u32,
    contextual: bool,
}

#[derive(Debug, Clone, Copy)]
struct Word<'t> {
    start: usize,
    end: usize,
    text: &'t str,
}

impl Word<'_> {
    fn is_capitalized(&self) -> bool {
        let mut chars = self.text.chars();
        matches!(
            (chars.next(), chars.next()),
            (Some(a), Some(b)) if a.is_uppercase() && b.is_lowercase()
        )
    }
}

/// Detector for person mentions
pub struct PersonRecognizer {
    dictionary: Arc<NameDictionary>,
    heuristic: FirstNameHeuristicConfig,
    blacklist: HashSet<String>,
    verbs: HashSet<String>,
    stoplist: HashSet<String>,
    titled: Shape,
    honorific: Shape,
    maiden: Shape,
    standalone: Shape,
    full: Shape,
}

impl PersonRecognizer {
    pub fn new(
        dictionary: Arc<NameDictionary>,
        heuristic: FirstNameHeuristicConfig,
        registry: &PatternRegistry,
    ) -> Self {
        let shape = |name: &str, priority: u32, contextual: bool| {
            registry
                .structural(name)
                .map(|s| Shape {
                    priority: s.priority,
                    contextual: s.contextual,
                })
                .unwrap_or(Shape {
                    priority,
                    contextual,
                })
        };

        let blacklist = CRITICAL_BLACKLIST
            .iter()
            .chain(IGNORE_WORDS)
            .chain(ROLE_WORDS)
            .map(|w| w.to_string())
            .collect();
        let verbs = heuristic.verbs.iter().map(|v| fold(v)).collect();
        let stoplist = heuristic
            .stoplist
            .iter()
            .map(|w| fold(w.trim_end_matches('.')))
            .collect();

        Self {
            dictionary,
            blacklist,
            verbs,
            stoplist,
            titled: shape(RULE_TITLED, 80, true),
            honorific: shape(RULE_HONORIFIC, 81, true),
            maiden: shape(RULE_MAIDEN, 82, true),
            standalone: shape(RULE_STANDALONE_FIRST, 83, true),
            full: shape(RULE_FULL, 84, false),
            heuristic,
        }
    }

    pub fn dictionary(&self) -> &NameDictionary {
        &self.dictionary
    }

    fn is_blacklisted(&self, word: &str) -> bool {
        self.blacklist.contains(&fold(word))
    }

    /// Whether `word` reads as a dictionary given name in some case
    fn is_first_name(&self, word: &str) -> bool {
        !self.dictionary.is_empty()
            && first_name_readings(word, &self.dictionary)
                .first()
                .is_some_and(|r| r.score >= 2)
    }

    fn span(
        &self,
        text: &str,
        start: usize,
        end: usize,
        rule: &str,
        shape: Shape,
        confidence: f32,
        mention: PersonMention,
    ) -> CandidateSpan {
        CandidateSpan::new(start, end, EntityType::Person, &text[start..end], shape.priority, rule)
            .with_context(shape.contextual)
            .with_confidence(confidence)
            .with_person(mention)
    }

    /// Mention for one or two name words found after a title or honorific
    fn mention_after_marker(
        &self,
        first: (usize, usize, &str),
        second: Option<(usize, usize, &str)>,
    ) -> Option<(usize, usize, PersonMention)> {
        if self.is_blacklisted(first.2) {
            return None;
        }
        match second.filter(|s| !self.is_blacklisted(s.2)) {
            Some(second) => Some((
                first.0,
                second.1,
                PersonMention::Full {
                    first: first.2.to_string(),
                    last: second.2.to_string(),
                },
            )),
            None if self.is_first_name(first.2) => {
                Some((first.0, first.1, PersonMention::FirstOnly(first.2.to_string())))
            }
            None => Some((first.0, first.1, PersonMention::SurnameOnly(first.2.to_string()))),
        }
    }

    fn scan_marked(
        &self,
        text: &str,
        re: &Regex,
        rule: &str,
        shape: Shape,
        confidence: f32,
        out: &mut Vec<CandidateSpan>,
    ) {
        for caps in re.captures_iter(text) {
            let Some(first) = caps.get(1) else { continue };
            let second = caps.get(2).map(|m| (m.start(), m.end(), m.as_str()));
            let first = (first.start(), first.end(), first.as_str());
            if let Some((start, end, mention)) = self.mention_after_marker(first, second) {
                if legal_form_regex().is_match(&text[end..]) {
                    continue;
                }
                out.push(self.span(text, start, end, rule, shape, confidence, mention));
            }
        }
    }

    fn scan_maiden(&self, text: &str, out: &mut Vec<CandidateSpan>) {
        for caps in maiden_regex().captures_iter(text) {
            let Some(name) = caps.get(1) else { continue };
            if self.is_blacklisted(name.as_str()) {
                continue;
            }
            out.push(self.span(
                text,
                name.start(),
                name.end(),
                RULE_MAIDEN,
                self.maiden,
                0.95,
                PersonMention::SurnameOnly(name.as_str().to_string()),
            ));
        }
    }

    fn scan_full(&self, text: &str, words: &[Word<'_>], out: &mut Vec<CandidateSpan>) {
        if self.dictionary.is_empty() {
            return;
        }
        for pair in words.windows(2) {
            let (first, last) = (pair[0], pair[1]);
            if !first.is_capitalized() || !last.is_capitalized() {
                continue;
            }
            if !same_line_gap(text, first.end, last.start) {
                continue;
            }
            if self.is_blacklisted(first.text) || self.is_blacklisted(last.text) {
                continue;
            }
            if !self.is_first_name(first.text) || last.text.chars().count() < 2 {
                continue;
            }
            if legal_form_regex().is_match(&text[last.end..]) {
                continue;
            }
            out.push(self.span(
                text,
                first.start,
                last.end,
                RULE_FULL,
                self.full,
                0.9,
                PersonMention::Full {
                    first: first.text.to_string(),
                    last: last.text.to_string(),
                },
            ));
        }
    }

    /// Score of a bare given name at `words[i]`
    fn standalone_score(&self, text: &str, words: &[Word<'_>], i: usize) -> f32 {
        let word = words[i];
        if !word.is_capitalized() || self.is_blacklisted(word.text) || !self.is_first_name(word.text) {
            return 0.0;
        }

        let prev = i.checked_sub(1).map(|p| words[p]);
        let next = words.get(i + 1).copied();

        if let Some(p) = prev {
            if p.is_capitalized() && same_line_gap(text, p.end, word.start) {
                return 0.0;
            }
        }
        let near_stopword = [prev, next]
            .into_iter()
            .flatten()
            .any(|w| self.stoplist.contains(&fold(w.text)));
        if near_stopword {
            return 0.0;
        }

        let mut score = DICTIONARY_SCORE;
        if let Some(n) = next {
            if same_line_gap(text, word.end, n.start) && self.verbs.contains(&fold(n.text)) {
                score += VERB_SCORE;
            }
        }
        if at_sentence_start(text, word.start) {
            score += SENTENCE_START_SCORE;
        }
        score
    }

    fn scan_standalone(&self, text: &str, words: &[Word<'_>], out: &mut Vec<CandidateSpan>) {
        if !self.heuristic.enabled || self.dictionary.is_empty() {
            return;
        }
        for i in 0..words.len() {
            let score = self.standalone_score(text, words, i);
            if score > 0.0 && score + f32::EPSILON >= self.heuristic.threshold {
                let word = words[i];
                out.push(self.span(
                    text,
                    word.start,
                    word.end,
                    RULE_STANDALONE_FIRST,
                    self.standalone,
                    score.min(1.0),
                    PersonMention::FirstOnly(word.text.to_string()),
                ));
            }
        }
    }
}

impl PiiDetector for PersonRecognizer {
    fn name(&self) -> &str {
        "persons"
    }

    fn scan(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        let words: Vec<Word<'_>> = word_regex()
            .find_iter(text)
            .map(|m| Word {
                start: m.start(),
                end: m.end(),
                text: m.as_str(),
            })
            .collect();

        let mut candidates = Vec::new();
        self.scan_marked(text, titled_regex(), RULE_TITLED, self.titled, 0.95, &mut candidates);
        self.scan_marked(text, honorific_regex(), RULE_HONORIFIC, self.honorific, 0.9, &mut candidates);
        self.scan_maiden(text, &mut candidates);
        self.scan_full(text, &words, &mut candidates);
        self.scan_standalone(text, &words, &mut candidates);

        tracing::trace!(candidates = candidates.len(), "Person scan complete");
        Ok(discard_token_overlaps(text, candidates))
    }
}

/// Only spaces or tabs between two words
fn same_line_gap(text: &str, end: usize, start: usize) -> bool {
    start > end && text[end..start].chars().all(|c| c == ' ' || c == '\t')
}

fn at_sentence_start(text: &str, start: usize) -> bool {
    let before = &text[..start];
    let trimmed = before.trim_end();
    trimmed.is_empty()
        || trimmed.ends_with(['.', '!', '?'])
        || before[trimmed.len()..].contains('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> PersonRecognizer {
        let registry = PatternRegistry::default_rules().unwrap();
        PersonRecognizer::new(
            Arc::new(NameDictionary::embedded().unwrap()),
            FirstNameHeuristicConfig::default(),
            &registry,
        )
    }

    fn find<'a>(candidates: &'a [CandidateSpan], rule: &str) -> Vec<&'a str> {
        candidates
            .iter()
            .filter(|c| c.rule == rule)
            .map(|c| c.text.as_str())
            .collect()
    }

    #[test]
    fn test_full_name() {
        let candidates = recognizer().scan("Smlouvu uzavírá Jan Novák, bytem Praha.").unwrap();
        assert_eq!(find(&candidates, RULE_FULL), vec!["Jan Novák"]);
        let span = candidates.iter().find(|c| c.rule == RULE_FULL).unwrap();
        assert_eq!(span.priority, 84);
        assert!(!span.contextual);
        assert_eq!(
            span.person,
            Some(PersonMention::Full {
                first: "Jan".into(),
                last: "Novák".into()
            })
        );
    }

    #[test]
    fn test_title_kept_outside_span() {
        let candidates = recognizer().scan("Zástupce: Ing. Petr Svoboda, Ph.D.").unwrap();
        assert_eq!(find(&candidates, RULE_TITLED), vec!["Petr Svoboda"]);
    }

    #[test]
    fn test_honorific_surname() {
        let candidates = recognizer().scan("Dokument převzala paní Nováková osobně.").unwrap();
        let span = candidates.iter().find(|c| c.rule == RULE_HONORIFIC).unwrap();
        assert_eq!(span.text, "Nováková");
        assert_eq!(span.person, Some(PersonMention::SurnameOnly("Nováková".into())));
        assert!(span.contextual);
    }

    #[test]
    fn test_maiden_name() {
        let candidates = recognizer()
            .scan("Eva Nováková (rozená Svobodová) souhlasí.")
            .unwrap();
        assert_eq!(find(&candidates, RULE_MAIDEN), vec!["Svobodová"]);
    }

    #[test]
    fn test_company_legal_form_rejected() {
        let candidates = recognizer().scan("Dodavatel Petr Dvořák s.r.o. dodá zboží.").unwrap();
        assert!(find(&candidates, RULE_FULL).is_empty());
    }

    #[test]
    fn test_blacklisted_words_rejected() {
        let candidates = recognizer().scan("Sídlo: Václavské náměstí, Nové Město").unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_standalone_first_name_with_verb() {
        let candidates = recognizer().scan("Jakub pracoval jako vedoucí").unwrap();
        let span = candidates
            .iter()
            .find(|c| c.rule == RULE_STANDALONE_FIRST)
            .unwrap();
        assert_eq!(span.text, "Jakub");
        assert!(span.confidence >= 0.75);
    }

    #[test]
    fn test_standalone_first_name_without_verb_ignored() {
        let candidates = recognizer().scan("Dle dohody Jakub a další.").unwrap();
        assert!(find(&candidates, RULE_STANDALONE_FIRST).is_empty());
    }

    #[test]
    fn test_stoplist_zeroes_score() {
        let candidates = recognizer().scan("Nemocnice Jana byla otevřena.").unwrap();
        assert!(find(&candidates, RULE_STANDALONE_FIRST).is_empty());
    }

    #[test]
    fn test_degraded_without_dictionary() {
        let registry = PatternRegistry::default_rules().unwrap();
        let recognizer = PersonRecognizer::new(
            Arc::new(NameDictionary::empty()),
            FirstNameHeuristicConfig::default(),
            &registry,
        );
        let candidates = recognizer
            .scan("Jan Novák a Ing. Petr Svoboda. Jakub pracoval.")
            .unwrap();
        assert!(find(&candidates, RULE_FULL).is_empty());
        assert!(find(&candidates, RULE_STANDALONE_FIRST).is_empty());
        assert_eq!(find(&candidates, RULE_TITLED), vec!["Petr Svoboda"]);
    }

    #[test]
    fn test_tokens_skipped() {
        let candidates = recognizer().scan("[[PERSON_1]] pracoval").unwrap();
        assert!(candidates.is_empty());
    }
}
