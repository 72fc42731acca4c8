//! Entity type enumeration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of sensitive information recognized in a document
///
/// The declaration order is the order in which map sections are rendered.
/// `CaseNumber` and `Amount` are guard categories: they take part in precedence
/// resolution so that file numbers and money amounts are not mistaken for
/// identifiers, but they are never replaced by a tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    BirthId,
    BirthDate,
    BirthPlace,
    Address,
    Email,
    Phone,
    Bank,
    Iban,
    Card,
    Cvv,
    CardExpiry,
    IdCard,
    Passport,
    DriverLicense,
    CompanyId,
    TaxId,
    InsuranceId,
    BenefitCard,
    Rfid,
    LicensePlate,
    Vin,
    Ip,
    Mac,
    Imei,
    Host,
    Username,
    AccountId,
    Password,
    ApiKey,
    Secret,
    SshKey,
    Linkedin,
    Facebook,
    Instagram,
    Skype,
    VoiceId,
    BioHash,
    PhotoId,
    GeneticId,
    CaseNumber,
    Amount,
}

impl EntityType {
    /// Every entity type in declaration order
    pub const ALL: [EntityType; 42] = [
        Self::Person,
        Self::BirthId,
        Self::BirthDate,
        Self::BirthPlace,
        Self::Address,
        Self::Email,
        Self::Phone,
        Self::Bank,
        Self::Iban,
        Self::Card,
        Self::Cvv,
        Self::CardExpiry,
        Self::IdCard,
        Self::Passport,
        Self::DriverLicense,
        Self::CompanyId,
        Self::TaxId,
        Self::InsuranceId,
        Self::BenefitCard,
        Self::Rfid,
        Self::LicensePlate,
        Self::Vin,
        Self::Ip,
        Self::Mac,
        Self::Imei,
        Self::Host,
        Self::Username,
        Self::AccountId,
        Self::Password,
        Self::ApiKey,
        Self::Secret,
        Self::SshKey,
        Self::Linkedin,
        Self::Facebook,
        Self::Instagram,
        Self::Skype,
        Self::VoiceId,
        Self::BioHash,
        Self::PhotoId,
        Self::GeneticId,
        Self::CaseNumber,
        Self::Amount,
    ];

    /// Label used inside tags (`[[LABEL_N]]`) and in rule tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::BirthId => "BIRTH_ID",
            Self::BirthDate => "BIRTH_DATE",
            Self::BirthPlace => "BIRTH_PLACE",
            Self::Address => "ADDRESS",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Bank => "BANK",
            Self::Iban => "IBAN",
            Self::Card => "CARD",
            Self::Cvv => "CVV",
            Self::CardExpiry => "CARD_EXPIRY",
            Self::IdCard => "ID_CARD",
            Self::Passport => "PASSPORT",
            Self::DriverLicense => "DRIVER_LICENSE",
            Self::CompanyId => "COMPANY_ID",
            Self::TaxId => "TAX_ID",
            Self::InsuranceId => "INSURANCE_ID",
            Self::BenefitCard => "BENEFIT_CARD",
            Self::Rfid => "RFID",
            Self::LicensePlate => "LICENSE_PLATE",
            Self::Vin => "VIN",
            Self::Ip => "IP",
            Self::Mac => "MAC",
            Self::Imei => "IMEI",
            Self::Host => "HOST",
            Self::Username => "USERNAME",
            Self::AccountId => "ACCOUNT_ID",
            Self::Password => "PASSWORD",
            Self::ApiKey => "API_KEY",
            Self::Secret => "SECRET",
            Self::SshKey => "SSH_KEY",
            Self::Linkedin => "LINKEDIN",
            Self::Facebook => "FACEBOOK",
            Self::Instagram => "INSTAGRAM",
            Self::Skype => "SKYPE",
            Self::VoiceId => "VOICE_ID",
            Self::BioHash => "BIO_HASH",
            Self::PhotoId => "PHOTO_ID",
            Self::GeneticId => "GENETIC_ID",
            Self::CaseNumber => "CASE_NUMBER",
            Self::Amount => "AMOUNT",
        }
    }

    /// Look up an entity type by its label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let upper = label.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|t| t.label() == upper)
    }

    /// Whether accepted spans of this type are replaced by a tag
    pub fn is_taggable(&self) -> bool {
        !matches!(self, Self::CaseNumber | Self::Amount)
    }

    /// High-sensitivity categories whose plaintext must never reach a production map
    pub fn is_high_sensitivity(&self) -> bool {
        matches!(
            self,
            Self::Bank
                | Self::Iban
                | Self::Card
                | Self::Cvv
                | Self::CardExpiry
                | Self::Password
                | Self::ApiKey
                | Self::Secret
                | Self::SshKey
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Unknown entity type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for t in EntityType::ALL {
            assert_eq!(EntityType::from_label(t.label()), Some(t));
        }
    }

    #[test]
    fn test_serde_matches_label() {
        for t in EntityType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.label()));
        }
    }

    #[test]
    fn test_guard_types_not_taggable() {
        assert!(!EntityType::CaseNumber.is_taggable());
        assert!(!EntityType::Amount.is_taggable());
        assert!(EntityType::BirthId.is_taggable());
    }

    #[test]
    fn test_high_sensitivity() {
        assert!(EntityType::Card.is_high_sensitivity());
        assert!(EntityType::Password.is_high_sensitivity());
        assert!(!EntityType::Person.is_high_sensitivity());
        assert!(!EntityType::Email.is_high_sensitivity());
    }

    #[test]
    fn test_from_str_unknown() {
        assert!("NOT_A_TYPE".parse::<EntityType>().is_err());
        assert_eq!("birth_id".parse::<EntityType>(), Ok(EntityType::BirthId));
    }
}
