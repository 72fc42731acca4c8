//! Czech name declension
//!
//! Maps inflected (oblique-case) forms of given names and surnames back to
//! their nominative, and generates the inflected forms of a known nominative.
//! The rules cover the regular paradigms seen in contracts; irregular names
//! fall back to the observed form.

use super::dictionary::{fold, Gender, NameDictionary};

/// Masculine surnames that end in `-a` in the nominative
pub const MALE_SURNAMES_WITH_A: &[&str] = &[
    "svoboda", "skala", "hora", "kula", "hala", "krejca", "krejča", "liska", "liška", "vrba",
    "ryba", "kocka", "kočka", "sluka", "janda", "prochazka", "procházka", "blaha", "kafka",
    "smetana", "kuratka", "kubicka", "kubíčka", "marecka", "marečka", "vasicka", "sembera",
    "šembera", "slama", "sláma", "seda", "šeda", "vrana", "vrána", "vala", "vála", "pala",
    "vojta", "hruska", "hruška", "krupicka", "krupička", "popelka", "vlna", "fiala", "sýkora",
    "kučera", "kucera", "skála", "baťa", "zeman", "holoubka", "mácha", "macha",
];

/// A possible nominative reading of an observed given name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstNameReading {
    pub nominative: String,
    pub gender: Gender,
    /// 3 = dictionary form, 2 = declension rule confirmed by the dictionary,
    /// 1 = unconfirmed guess
    pub score: u8,
}

const VOWELS: &str = "aeiouyáéěíóúůý";

fn is_vowel(c: char) -> bool {
    VOWELS.contains(c.to_lowercase().next().unwrap_or(c))
}

fn is_male_a_surname(word: &str) -> bool {
    let lower = word.to_lowercase();
    MALE_SURNAMES_WITH_A.contains(&lower.as_str())
}

/// Re-insert the fleeting `e` dropped in oblique cases (`Hájk` → `Hájek`,
/// `Zdeňk` → `Zdeněk`).
pub fn insert_fleeting_e(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n < 4 {
        return stem.to_string();
    }
    let last = chars[n - 1];
    let prev = chars[n - 2];
    if !matches!(last, 'k' | 'l' | 'c') || is_vowel(prev) {
        return stem.to_string();
    }
    let mut out: String = chars[..n - 2].iter().collect();
    match prev {
        'ň' => out.push_str("ně"),
        'ď' => out.push_str("dě"),
        'ť' => out.push_str("tě"),
        other => {
            out.push(other);
            out.push('e');
        }
    }
    out.push(last);
    out
}

/// Drop the fleeting `e` of a nominative (`Hájek` → `Hájk`), if it has one
pub fn drop_fleeting_e(nominative: &str) -> Option<String> {
    let chars: Vec<char> = nominative.chars().collect();
    let n = chars.len();
    if n < 4 {
        return None;
    }
    let (last, e, before) = (chars[n - 1], chars[n - 2], chars[n - 3]);
    if !matches!(last, 'k' | 'l' | 'c') || !matches!(e, 'e' | 'ě') || is_vowel(before) {
        return None;
    }
    let mut out: String = chars[..n - 3].iter().collect();
    match (before, e) {
        ('n', 'ě') => out.push('ň'),
        ('d', 'ě') => out.push('ď'),
        ('t', 'ě') => out.push('ť'),
        (b, _) => out.push(b),
    }
    out.push(last);
    Some(out)
}

/// Gender implied by a nominative surname
pub fn surname_gender(nominative: &str) -> Gender {
    if nominative.ends_with('á') {
        Gender::Female
    } else if nominative.ends_with('í') {
        Gender::Unisex
    } else {
        Gender::Male
    }
}

/// Nominative of an observed surname form
pub fn infer_surname_nominative(observed: &str) -> String {
    let w = observed.trim();
    if w.chars().count() < 3 {
        return w.to_string();
    }

    if w.ends_with("ová") {
        return w.to_string();
    }
    if let Some(stem) = w.strip_suffix("ové") {
        return format!("{stem}ová");
    }
    if let Some(stem) = w.strip_suffix("ovou") {
        return format!("{stem}ová");
    }
    for (oblique, nominative) in [("skou", "ská"), ("ckou", "cká"), ("ské", "ská"), ("cké", "cká")] {
        if let Some(stem) = w.strip_suffix(oblique) {
            return format!("{stem}{nominative}");
        }
    }
    if let Some(stem) = w.strip_suffix("ou") {
        let male = format!("{stem}a");
        return if is_male_a_surname(&male) {
            male
        } else {
            format!("{stem}á")
        };
    }
    for suffix in ["ého", "ému", "ým", "ém"] {
        if let Some(stem) = w.strip_suffix(suffix) {
            return format!("{stem}ý");
        }
    }
    for suffix in ["ího", "ímu", "ím"] {
        if let Some(stem) = w.strip_suffix(suffix) {
            return format!("{stem}í");
        }
    }
    if let Some(stem) = w.strip_suffix('é') {
        return format!("{stem}á");
    }
    if let Some(stem) = w.strip_suffix("ovi") {
        return masculine_from_stem(stem);
    }
    if let Some(stem) = w.strip_suffix("em") {
        if stem.chars().count() >= 3 {
            return masculine_from_stem(stem);
        }
    }
    if is_male_a_surname(w) {
        return w.to_string();
    }
    for suffix in ['a', 'u'] {
        if let Some(stem) = w.strip_suffix(suffix) {
            if is_male_a_surname(&format!("{stem}a")) {
                return format!("{stem}a");
            }
            if stem.chars().last().is_some_and(|c| !is_vowel(c)) {
                return insert_fleeting_e(stem);
            }
        }
    }
    for suffix in ['y', 'ě'] {
        if let Some(stem) = w.strip_suffix(suffix) {
            if is_male_a_surname(&format!("{stem}a")) {
                return format!("{stem}a");
            }
        }
    }

    w.to_string()
}

fn masculine_from_stem(stem: &str) -> String {
    let with_a = format!("{stem}a");
    if is_male_a_surname(&with_a) {
        with_a
    } else {
        insert_fleeting_e(stem)
    }
}

/// Candidate nominatives for an observed given name, best first
pub fn first_name_readings(observed: &str, dictionary: &NameDictionary) -> Vec<FirstNameReading> {
    let w = observed.trim();
    let mut readings: Vec<FirstNameReading> = Vec::new();
    let mut push = |nominative: String, gender: Gender, score: u8| {
        match readings
            .iter_mut()
            .find(|r| fold(&r.nominative) == fold(&nominative))
        {
            Some(existing) if existing.score >= score => {}
            Some(existing) => *existing = FirstNameReading { nominative, gender, score },
            None => readings.push(FirstNameReading { nominative, gender, score }),
        }
    };

    if let (Some(name), Some(gender)) = (dictionary.canonical(w), dictionary.gender(w)) {
        push(name.to_string(), gender, 3);
    }

    // masculine oblique cases
    for suffix in ["ovi", "em", "ho", "mu", "a", "u", "e", "i", "m"] {
        let Some(stem) = w.strip_suffix(suffix) else {
            continue;
        };
        if stem.chars().count() < 2 {
            continue;
        }
        let mut stems = vec![stem.to_string(), insert_fleeting_e(stem)];
        if let Some(s) = stem.strip_suffix('ř') {
            stems.push(format!("{s}r"));
        }
        for candidate in stems {
            if let (Some(name), Some(gender)) =
                (dictionary.canonical(&candidate), dictionary.gender(&candidate))
            {
                if gender != Gender::Female {
                    push(name.to_string(), gender, 2);
                }
            }
        }
    }

    // feminine oblique cases
    for candidate in feminine_nominatives(w) {
        if let (Some(name), Some(gender)) =
            (dictionary.canonical(&candidate), dictionary.gender(&candidate))
        {
            if gender != Gender::Male {
                push(name.to_string(), gender, 2);
            }
        }
    }

    if readings.is_empty() {
        let gender = if w.ends_with('a') || w.ends_with("ie") {
            Gender::Female
        } else {
            Gender::Male
        };
        readings.push(FirstNameReading {
            nominative: w.to_string(),
            gender,
            score: 1,
        });
    }

    readings.sort_by(|a, b| b.score.cmp(&a.score));
    readings
}

fn feminine_nominatives(w: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (oblique, nominative) in [
        ("ce", "ka"),
        ("ře", "ra"),
        ("lze", "lga"),
        ("ze", "ha"),
        ("ii", "ie"),
        ("ií", "ie"),
    ] {
        if let Some(stem) = w.strip_suffix(oblique) {
            out.push(format!("{stem}{nominative}"));
        }
    }
    for suffix in ["ou", "y", "ě", "e", "u", "o"] {
        if let Some(stem) = w.strip_suffix(suffix) {
            if stem.chars().count() >= 2 {
                out.push(format!("{stem}a"));
            }
        }
    }
    out
}

/// Inflected forms of a nominative given name
pub fn first_name_variants(nominative: &str, gender: Gender) -> Vec<String> {
    let n = nominative.trim();
    let mut out = vec![n.to_string()];
    if n.is_empty() {
        return out;
    }

    if let Some(stem) = n.strip_suffix("ie") {
        out.extend([format!("{stem}ii"), format!("{stem}ií")]);
    } else if let Some(stem) = n.strip_suffix('a') {
        for suffix in ["y", "e", "ě", "u", "ou", "o"] {
            out.push(format!("{stem}{suffix}"));
        }
        for (nom, dat) in [("k", "ce"), ("r", "ře"), ("g", "ze"), ("h", "ze")] {
            if let Some(s) = stem.strip_suffix(nom) {
                out.push(format!("{s}{dat}"));
            }
        }
        if gender != Gender::Female {
            out.push(format!("{stem}ovi"));
        }
    } else if let Some(stem) = n.strip_suffix('í') {
        for suffix in ["ího", "ímu", "ím"] {
            out.push(format!("{stem}{suffix}"));
        }
    } else if let Some(stem) = n.strip_suffix('o') {
        for suffix in ["a", "ovi", "em", "u"] {
            out.push(format!("{stem}{suffix}"));
        }
    } else if gender != Gender::Female {
        let mut stems = vec![n.to_string()];
        stems.extend(drop_fleeting_e(n));
        for stem in &stems {
            for suffix in ["a", "ovi", "em", "u", "e", "i"] {
                out.push(format!("{stem}{suffix}"));
            }
        }
        if let Some(s) = n.strip_suffix('r') {
            out.push(format!("{s}ře"));
        }
    }

    dedup(out)
}

/// Inflected forms of a nominative surname
pub fn surname_variants(nominative: &str) -> Vec<String> {
    let n = nominative.trim();
    let mut out = vec![n.to_string()];
    if n.is_empty() {
        return out;
    }

    if let Some(base) = n.strip_suffix('á') {
        out.extend([format!("{base}é"), format!("{base}ou")]);
    } else if let Some(stem) = n.strip_suffix('ý') {
        for suffix in ["ého", "ému", "ým", "ém"] {
            out.push(format!("{stem}{suffix}"));
        }
    } else if let Some(stem) = n.strip_suffix('í') {
        for suffix in ["ího", "ímu", "ím"] {
            out.push(format!("{stem}{suffix}"));
        }
    } else if is_male_a_surname(n) {
        if let Some(stem) = n.strip_suffix('a') {
            for suffix in ["y", "ovi", "u", "o", "ou", "ě", "e"] {
                out.push(format!("{stem}{suffix}"));
            }
        }
    } else {
        let mut stems = vec![n.to_string()];
        stems.extend(drop_fleeting_e(n));
        for stem in &stems {
            for suffix in ["a", "ovi", "e", "em", "u", "ů", "ům"] {
                out.push(format!("{stem}{suffix}"));
            }
        }
    }

    dedup(out)
}

fn dedup(mut items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.retain(|v| seen.insert(v.clone()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn dict() -> NameDictionary {
        NameDictionary::embedded().unwrap()
    }

    fn best(observed: &str) -> String {
        first_name_readings(observed, &dict())[0].nominative.clone()
    }

    #[test_case("Novákové", "Nováková")]
    #[test_case("Novákovou", "Nováková")]
    #[test_case("Malou", "Malá")]
    #[test_case("Svobodou", "Svoboda")]
    #[test_case("Novotného", "Novotný")]
    #[test_case("Novotným", "Novotný")]
    #[test_case("Krejčího", "Krejčí")]
    #[test_case("Novákovi", "Novák")]
    #[test_case("Hájkovi", "Hájek")]
    #[test_case("Havlem", "Havel")]
    #[test_case("Nováka", "Novák")]
    #[test_case("Procházka", "Procházka")]
    #[test_case("Procházky", "Procházka")]
    #[test_case("Svobodovi", "Svoboda")]
    #[test_case("Dvořákovou", "Dvořáková")]
    #[test_case("Černé", "Černá")]
    #[test_case("Nováku", "Novák")]
    #[test_case("Novák", "Novák")]
    fn test_surname_nominative(observed: &str, expected: &str) {
        assert_eq!(infer_surname_nominative(observed), expected);
    }

    #[test_case("Radka", "Radka" ; "dictionary form first")]
    #[test_case("Radkovi", "Radek" ; "fleeting e")]
    #[test_case("Petrovi", "Petr")]
    #[test_case("Janou", "Jana")]
    #[test_case("Lucii", "Lucie")]
    #[test_case("Jiřího", "Jiří")]
    #[test_case("Tomáši", "Tomáš")]
    #[test_case("Radce", "Radka")]
    #[test_case("Olze", "Olga")]
    #[test_case("Petře", "Petr")]
    fn test_first_name_best_reading(observed: &str, expected: &str) {
        assert_eq!(best(observed), expected);
    }

    #[test]
    fn test_ambiguous_readings_are_kept() {
        let readings = first_name_readings("Petra", &dict());
        let names: Vec<&str> = readings.iter().map(|r| r.nominative.as_str()).collect();
        assert!(names.contains(&"Petra"));
        assert!(names.contains(&"Petr"));
        assert_eq!(readings[0].score, 3);
    }

    #[test]
    fn test_unknown_name_falls_back() {
        let readings = first_name_readings("Xaverius", &dict());
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].score, 1);
    }

    #[test]
    fn test_fleeting_e() {
        assert_eq!(insert_fleeting_e("Hájk"), "Hájek");
        assert_eq!(insert_fleeting_e("Zdeňk"), "Zdeněk");
        assert_eq!(insert_fleeting_e("Novák"), "Novák");
        assert_eq!(drop_fleeting_e("Zdeněk").as_deref(), Some("Zdeňk"));
        assert_eq!(drop_fleeting_e("Pavel").as_deref(), Some("Pavl"));
        assert_eq!(drop_fleeting_e("Daniel"), None);
    }

    #[test]
    fn test_variants() {
        let first = first_name_variants("Radek", Gender::Male);
        assert!(first.contains(&"Radka".to_string()));
        assert!(first.contains(&"Radkovi".to_string()));

        let female = first_name_variants("Jana", Gender::Female);
        assert!(female.contains(&"Janou".to_string()));
        assert!(female.contains(&"Janě".to_string()));

        let surname = surname_variants("Nováková");
        assert_eq!(surname, vec!["Nováková", "Novákové", "Novákovou"]);

        let male = surname_variants("Hájek");
        assert!(male.contains(&"Hájkem".to_string()));
        assert!(male.contains(&"Hájka".to_string()));

        let svoboda = surname_variants("Svoboda");
        assert!(svoboda.contains(&"Svobodovi".to_string()));
        assert!(!svoboda.contains(&"Svobodaa".to_string()));
    }

    #[test]
    fn test_surname_gender() {
        assert_eq!(surname_gender("Nováková"), Gender::Female);
        assert_eq!(surname_gender("Novák"), Gender::Male);
        assert_eq!(surname_gender("Krejčí"), Gender::Unisex);
    }
}
