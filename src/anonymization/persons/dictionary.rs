//! Given-name dictionary with gender

use crate::domain::{RedaktError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const EMBEDDED_DICTIONARY: &str = include_str!("../../../data/cz_names.v1.json");

/// Grammatical gender of a given name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    /// Used for both genders, or unknown
    Unisex,
}

impl Gender {
    fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Some(Self::Male),
            "F" | "FEMALE" => Some(Self::Female),
            "U" | "UNISEX" => Some(Self::Unisex),
            _ => None,
        }
    }

    /// Whether a name of this gender may pair with a surname of `other` gender
    pub fn agrees_with(&self, other: Gender) -> bool {
        *self == Gender::Unisex || other == Gender::Unisex || *self == other
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DictionaryFile {
    Grouped {
        firstnames: BTreeMap<String, Vec<String>>,
    },
    Split {
        #[serde(default)]
        male: Vec<String>,
        #[serde(default)]
        female: Vec<String>,
    },
    Plain(Vec<String>),
}

/// Lookup of given names by exact (lowercase) and diacritic-free forms
#[derive(Debug, Clone, Default)]
pub struct NameDictionary {
    exact: HashMap<String, (String, Gender)>,
    folded: HashMap<String, (String, Gender)>,
}

impl NameDictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dictionary bundled with the crate
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_DICTIONARY)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RedaktError::Dictionary(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse any of the supported JSON layouts
    pub fn from_json(content: &str) -> Result<Self> {
        let file: DictionaryFile = serde_json::from_str(content)
            .map_err(|e| RedaktError::Dictionary(format!("invalid dictionary JSON: {e}")))?;

        let mut dictionary = Self::empty();
        match file {
            DictionaryFile::Grouped { firstnames } => {
                for (key, names) in firstnames {
                    let Some(gender) = Gender::from_key(&key) else {
                        tracing::warn!(key = %key, "Skipping unknown gender group in name dictionary");
                        continue;
                    };
                    for name in names {
                        dictionary.insert(&name, gender);
                    }
                }
            }
            DictionaryFile::Split { male, female } => {
                for name in male {
                    dictionary.insert(&name, Gender::Male);
                }
                for name in female {
                    dictionary.insert(&name, Gender::Female);
                }
            }
            DictionaryFile::Plain(names) => {
                for name in names {
                    dictionary.insert(&name, Gender::Unisex);
                }
            }
        }

        Ok(dictionary)
    }

    /// Load the configured dictionary, or the embedded one when no path is set.
    ///
    /// An unreadable configured dictionary is not fatal: a warning is logged
    /// and an empty dictionary is returned, leaving only the context-based
    /// person recognizers active.
    pub fn load(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        };
        match loaded {
            Ok(dictionary) => {
                tracing::debug!(names = dictionary.len(), "Name dictionary loaded");
                dictionary
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Name dictionary unavailable, person recognition limited to titled, honorific and maiden-name mentions"
                );
                Self::empty()
            }
        }
    }

    /// Add a name; a name listed under several genders becomes unisex
    pub fn insert(&mut self, name: &str, gender: Gender) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let lower = name.to_lowercase();
        let gender = match self.exact.get(&lower) {
            Some((_, existing)) if *existing != gender => Gender::Unisex,
            _ => gender,
        };
        self.folded.insert(fold(&lower), (name.to_string(), gender));
        self.exact.insert(lower, (name.to_string(), gender));
    }

    /// Gender of `name`, matching the exact form first and then without diacritics
    pub fn gender(&self, name: &str) -> Option<Gender> {
        self.lookup(name).map(|(_, g)| g)
    }

    /// Dictionary spelling of `name`
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|(n, _)| n)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &str) -> Option<(&str, Gender)> {
        let lower = name.trim().to_lowercase();
        self.exact
            .get(&lower)
            .or_else(|| self.folded.get(&fold(&lower)))
            .map(|(n, g)| (n.as_str(), *g))
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Lowercase and strip Czech diacritics
pub fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' => 'a',
            'č' => 'c',
            'ď' => 'd',
            'é' | 'ě' => 'e',
            'í' => 'i',
            'ň' => 'n',
            'ó' | 'ö' => 'o',
            'ř' => 'r',
            'š' => 's',
            'ť' => 't',
            'ú' | 'ů' | 'ü' => 'u',
            'ý' => 'y',
            'ž' => 'z',
            'ä' => 'a',
            'ľ' | 'ĺ' => 'l',
            'ŕ' => 'r',
            'ô' => 'o',
            other => other,
        })
        .collect()
}
