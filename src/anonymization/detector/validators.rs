//! Checksum and plausibility validators referenced by rules

use std::str::FromStr;

/// Named validator a rule can attach to its matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Luhn checksum over 13-19 digits
    Luhn,
    /// Dotted quad with octets 0-255
    Ipv4,
    /// ISO 13616 mod-97 check
    Iban,
    /// Czech birth number date plausibility (month offsets for women and extended series)
    BirthId,
    /// Czech company ID (IČO) weighted mod-11 check digit
    CompanyId,
    /// 17 characters mixing letters and digits
    Vin,
}

impl FromStr for Validator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "luhn" => Ok(Self::Luhn),
            "ipv4" => Ok(Self::Ipv4),
            "iban" => Ok(Self::Iban),
            "birth_id" => Ok(Self::BirthId),
            "company_id" | "ico" => Ok(Self::CompanyId),
            "vin" => Ok(Self::Vin),
            other => Err(format!("Unknown validator: {other}")),
        }
    }
}

impl Validator {
    pub fn check(&self, value: &str) -> bool {
        match self {
            Self::Luhn => luhn_valid(value),
            Self::Ipv4 => ipv4_valid(value),
            Self::Iban => iban_valid(value),
            Self::BirthId => birth_id_plausible(value),
            Self::CompanyId => company_id_valid(value),
            Self::Vin => vin_shape(value),
        }
    }
}

fn digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Luhn check; separators (spaces, dashes) are ignored
pub fn luhn_valid(value: &str) -> bool {
    if value.chars().any(|c| !(c.is_ascii_digit() || c == ' ' || c == '-')) {
        return false;
    }
    let digits = digits(value);
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

pub fn ipv4_valid(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|p| {
            !p.is_empty() && p.len() <= 3 && p.chars().all(|c| c.is_ascii_digit())
                && p.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
        })
}

pub fn iban_valid(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if !(15..=34).contains(&compact.len()) || !compact.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return false;
    }
    let (head, tail) = compact.split_at(4);
    let mut remainder: u32 = 0;
    for c in tail.chars().chain(head.chars()) {
        let n = match c.to_digit(36) {
            Some(n) => n,
            None => return false,
        };
        remainder = if n >= 10 {
            (remainder * 100 + n) % 97
        } else {
            (remainder * 10 + n) % 97
        };
    }
    remainder == 1
}

pub fn birth_id_plausible(value: &str) -> bool {
    let digits = digits(value);
    if !(9..=10).contains(&digits.len()) {
        return false;
    }
    let month = digits[2] * 10 + digits[3];
    let day = digits[4] * 10 + digits[5];
    let month_ok = matches!(month, 1..=12 | 21..=32 | 51..=62 | 71..=82);
    month_ok && (1..=31).contains(&day)
}

pub fn company_id_valid(value: &str) -> bool {
    let digits = digits(value);
    if digits.len() != 8 {
        return false;
    }
    let weighted: u32 = digits[..7]
        .iter()
        .zip((2..=8).rev())
        .map(|(d, w)| d * w)
        .sum();
    let expected = match weighted % 11 {
        0 => 1,
        1 => 0,
        r => 11 - r,
    };
    digits[7] == expected % 10
}

pub fn vin_shape(value: &str) -> bool {
    value.len() == 17
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| c.is_ascii_uppercase())
}
