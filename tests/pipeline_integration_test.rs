//! Integration tests for the redaction pipeline with synthetic Czech documents

use redakt::anonymization::enforcer::verify_bijection;
use redakt::anonymization::models::EntityType;
use redakt::anonymization::policy::{Mode, StoragePolicy};
use redakt::anonymization::tagging::{contains_tokens, find_tokens, EntityMap, Tag};
use redakt::anonymization::{AnonymizationConfig, AnonymizationEngine, RedactionReport};
use redakt::domain::RedaktError;
use test_case::test_case;

const LEASE_AGREEMENT: &str = "\
NÁJEMNÍ SMLOUVA

Pronajímatel: Ing. Petr Svoboda, nar. 12.3.1975, bytem Korunní 12, 120 00 Praha 2,
tel. +420 777 123 456, e-mail petr.svoboda@seznam.cz.

Nájemce: Jan Novák, rodné číslo 850101/1234.

Nájemné bude hrazeno na účet 123456789/0800.
Smlouvu podepsal Jan Novák a převzal ji Petr Svoboda.
";

fn engine(mode: Mode) -> AnonymizationEngine {
    let mut config = AnonymizationConfig::default();
    config.mode = mode;
    config.audit.enabled = false;
    AnonymizationEngine::new(config).unwrap()
}

fn tags_of(text: &str, entity_type: EntityType) -> Vec<Tag> {
    find_tokens(text)
        .into_iter()
        .filter_map(|t| t.tag)
        .filter(|t| t.entity_type() == entity_type)
        .collect()
}

#[test]
fn test_lease_agreement_removes_identifiers() {
    let doc = engine(Mode::Test)
        .anonymize("najem.txt", LEASE_AGREEMENT)
        .unwrap();

    for value in [
        "850101/1234",
        "777 123 456",
        "petr.svoboda@seznam.cz",
        "123456789/0800",
    ] {
        assert!(!doc.text.contains(value), "{value} leaked into tagged text");
    }
    assert!(doc.text.contains("NÁJEMNÍ SMLOUVA"));
    assert!(doc.entity_count() >= 4);
    assert!(contains_tokens(&doc.text));
}

#[test]
fn test_output_is_in_bijection_with_map() {
    let doc = engine(Mode::Test)
        .anonymize("najem.txt", LEASE_AGREEMENT)
        .unwrap();
    verify_bijection("najem.txt", &doc.text, &doc.map, Some(&doc.occurrences)).unwrap();

    let total: usize = doc.map.entries().iter().map(|e| e.occurrences).sum();
    assert_eq!(total, find_tokens(&doc.text).len());
}

#[test]
fn test_repeated_person_shares_tag() {
    let doc = engine(Mode::Test)
        .anonymize("najem.txt", LEASE_AGREEMENT)
        .unwrap();

    let persons = tags_of(&doc.text, EntityType::Person);
    let novak: Vec<_> = doc
        .map
        .entries()
        .iter()
        .filter(|e| e.entity_type == EntityType::Person && e.value == "Jan Novák")
        .collect();
    assert_eq!(novak.len(), 1);
    assert_eq!(novak[0].occurrences, 2);
    assert_eq!(
        persons.iter().filter(|t| **t == novak[0].tag).count(),
        2
    );
}

#[test]
fn test_tags_numbered_by_first_appearance() {
    let doc = engine(Mode::Test)
        .anonymize(
            "doc",
            "Kontakt: jana@example.cz, dále petr@example.cz a znovu jana@example.cz.",
        )
        .unwrap();
    assert_eq!(
        doc.text,
        "Kontakt: [[EMAIL_1]], dále [[EMAIL_2]] a znovu [[EMAIL_1]]."
    );
    let first = doc.map.get(&Tag::new(EntityType::Email, 1)).unwrap();
    assert_eq!(first.value, "jana@example.cz");
    assert_eq!(first.occurrences, 2);
}

#[test]
fn test_processing_is_deterministic() {
    let engine = engine(Mode::Test);
    let first = engine.anonymize("a", LEASE_AGREEMENT).unwrap();
    let second = engine.anonymize("a", LEASE_AGREEMENT).unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(first.map.entries(), second.map.entries());
}

#[test]
fn test_documents_are_independent() {
    let engine = engine(Mode::Test);
    let first = engine.anonymize("a", "Tel.: 777 123 456").unwrap();
    let second = engine.anonymize("b", "Tel.: 602 987 654").unwrap();
    assert_eq!(first.text, "Tel.: [[PHONE_1]]");
    assert_eq!(second.text, "Tel.: [[PHONE_1]]");
    assert_eq!(second.map.entries()[0].value, "602 987 654");
}

#[test]
fn test_restore_in_test_mode() {
    let doc = engine(Mode::Test)
        .anonymize("najem.txt", LEASE_AGREEMENT)
        .unwrap();
    assert_eq!(doc.restore().unwrap(), LEASE_AGREEMENT);
}

#[test]
fn test_map_json_round_trip() {
    let doc = engine(Mode::Test)
        .anonymize("najem.txt", LEASE_AGREEMENT)
        .unwrap();
    let parsed = EntityMap::from_json(&doc.map.to_json().unwrap()).unwrap();
    assert_eq!(parsed.document, "najem.txt");
    assert_eq!(parsed.mode, Mode::Test);
    assert_eq!(parsed.entries(), doc.map.entries());
    verify_bijection("najem.txt", &doc.text, &parsed, None).unwrap();
}

#[test]
fn test_text_map_lists_every_tag() {
    let doc = engine(Mode::Test)
        .anonymize("najem.txt", LEASE_AGREEMENT)
        .unwrap();
    let rendered = doc.map_text();
    for entry in doc.map.entries() {
        assert!(rendered.contains(&format!("{}", entry.tag)));
    }
}

#[test_case("Platba kartou 4532 1234 5678 9012.", EntityType::Card, "…9012" ; "card keeps last four")]
#[test_case("Účet: 123456789/0800.", EntityType::Bank, "…0800" ; "bank keeps last four")]
fn test_production_partial_values(text: &str, entity_type: EntityType, expected: &str) {
    let doc = engine(Mode::Production).anonymize("doc", text).unwrap();
    let entry = doc
        .map
        .entries()
        .iter()
        .find(|e| e.entity_type == entity_type)
        .unwrap();
    assert_eq!(entry.value, expected);
    assert!(entry.variants.is_empty());
}

#[test]
fn test_production_override() {
    let mut config = AnonymizationConfig::default();
    config.mode = Mode::Production;
    config.audit.enabled = false;
    config
        .storage_policy
        .insert(EntityType::Email, StoragePolicy::Redacted);
    let engine = AnonymizationEngine::new(config).unwrap();

    let doc = engine.anonymize("doc", "E-mail: jana@example.cz").unwrap();
    assert_eq!(doc.map.entries()[0].value, "***REDACTED***");
}

#[test]
fn test_test_mode_keeps_full_values() {
    let doc = engine(Mode::Test)
        .anonymize("doc", "Platba kartou 4532 1234 5678 9012.")
        .unwrap();
    assert_eq!(doc.map.entries()[0].value, "4532 1234 5678 9012");
}

#[test]
fn test_text_without_personal_data() {
    let text = "Smluvní strany se dohodly na následujícím.";
    let doc = engine(Mode::Test).anonymize("doc", text).unwrap();
    assert_eq!(doc.text, text);
    assert!(doc.map.is_empty());
    assert_eq!(doc.entity_count(), 0);
}

#[test]
fn test_already_tagged_input_is_rejected() {
    let err = engine(Mode::Test)
        .anonymize("doc", "Nájemce: [[PERSON_1]], tel. 777 123 456")
        .unwrap_err();
    assert!(matches!(err, RedaktError::InvalidInput(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_report_aggregates_documents() {
    let engine = engine(Mode::Test);
    let mut report = RedactionReport::new();
    report.add_document(&engine.anonymize("a", "Tel.: 777 123 456").unwrap());
    report.add_document(
        &engine
            .anonymize("b", "Tel.: 602 987 654, e-mail jana@example.cz")
            .unwrap(),
    );

    assert_eq!(report.total_documents, 2);
    assert_eq!(report.entities_by_type.get(&EntityType::Phone), Some(&2));
    assert_eq!(report.entities_by_type.get(&EntityType::Email), Some(&1));
    assert!(report.format_console().contains("REDACTION REPORT"));
}

#[test]
fn test_birth_id_wins_over_bank_account() {
    let doc = engine(Mode::Test)
        .anonymize("doc", "Rodné číslo: 930715/1245")
        .unwrap();
    assert_eq!(doc.text, "Rodné číslo: [[BIRTH_ID_1]]");
    assert!(tags_of(&doc.text, EntityType::Bank).is_empty());
}

#[test_case("Spisová značka: 12 C 345/2023, č.j. 930715/1245" ; "case number is left verbatim")]
#[test_case("Celkem 12 500,- Kč bez DPH." ; "amount is left verbatim")]
fn test_guard_spans_are_not_tagged(text: &str) {
    let doc = engine(Mode::Test).anonymize("doc", text).unwrap();
    assert_eq!(doc.text, text);
    assert!(doc.map.is_empty());
}

#[test]
fn test_phone_beats_amount() {
    let doc = engine(Mode::Test)
        .anonymize("doc", "Cena činí 1 250 000 Kč, tel. 777 123 456.")
        .unwrap();
    assert_eq!(doc.text, "Cena činí 1 250 000 Kč, tel. [[PHONE_1]].");
    assert_eq!(doc.map.len(), 1);
    assert!(tags_of(&doc.text, EntityType::Amount).is_empty());
}

#[test]
fn test_credential_resolved_before_bank_number() {
    let doc = engine(Mode::Test)
        .anonymize("doc", "Heslo: 123456/0800")
        .unwrap();
    assert_eq!(doc.text, "Heslo: [[PASSWORD_1]]");
    assert!(tags_of(&doc.text, EntityType::Bank).is_empty());
    assert!(tags_of(&doc.text, EntityType::BirthId).is_empty());
}
