//! Person names
//!
//! Dictionary, declension rules, recognition and canonicalization of Czech
//! personal names.

pub mod canonicalizer;
pub mod declension;
pub mod dictionary;
pub mod recognizer;

pub use canonicalizer::{find_word_occurrences, PersonCanonicalizer, PersonName, PersonResolution};
pub use dictionary::{fold, Gender, NameDictionary};
pub use recognizer::PersonRecognizer;
