//! Tag allocation, inline tokens and the entity map
//!
//! Tags are written into the text as `[[TYPE_N]]` tokens. Helpers here find
//! those tokens again so later passes can skip or verify them.

pub mod allocator;
pub mod map;

pub use allocator::{Tag, TagAllocator};
pub use map::{EntityMap, MapEntry};

use regex::Regex;
use std::sync::OnceLock;

/// A `[[...]]` token found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub start: usize,
    pub end: usize,
    /// Text between the brackets
    pub raw: String,
    /// Parsed tag, `None` when the label is not a known entity type
    pub tag: Option<Tag>,
}

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"\[\[([A-Z][A-Z0-9_]*_[0-9]+)\]\]").expect("token pattern is valid")
    })
}

/// All placeholder tokens in `text`, in order
pub fn find_tokens(text: &str) -> Vec<TokenMatch> {
    token_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let raw = caps.get(1)?.as_str().to_string();
            Some(TokenMatch {
                start: whole.start(),
                end: whole.end(),
                tag: Tag::parse(&raw),
                raw,
            })
        })
        .collect()
}

/// Byte ranges covered by placeholder tokens
pub fn token_ranges(text: &str) -> Vec<(usize, usize)> {
    token_regex()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Whether `text` contains anything shaped like a placeholder token
pub fn contains_tokens(text: &str) -> bool {
    token_regex().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::EntityType;

    #[test]
    fn test_find_tokens() {
        let text = "[[PERSON_1]] zaplatil na [[BANK_2]] a [[FOO_3]].";
        let tokens = find_tokens(text);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].tag, Some(Tag::new(EntityType::Person, 1)));
        assert_eq!(&text[tokens[1].start..tokens[1].end], "[[BANK_2]]");
        assert_eq!(tokens[2].raw, "FOO_3");
        assert!(tokens[2].tag.is_none());
    }

    #[test]
    fn test_contains_tokens() {
        assert!(contains_tokens("foo [[EMAIL_1]] bar"));
        assert!(!contains_tokens("foo [EMAIL_1] bar"));
        assert_eq!(token_ranges("ab[[IP_1]]"), vec![(2, 10)]);
    }
}
