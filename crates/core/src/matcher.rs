//! Physical card lookup classification.

use serde::{Deserialize, Serialize};

use crate::normalize::FidelityProfile;

/// Outcome of looking up a physical card.
///
/// Serializes as `{"status": "FOUND", "data": {...}}`; the other states carry
/// no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TesseraMatch {
    /// The card exists, is unclaimed, and the surname (if given) agrees.
    Found(FidelityProfile),
    /// No fidelity record has this card number.
    NotFound,
    /// A registered user already holds this card.
    AlreadyMigrated,
    /// The card exists but the supplied surname does not match.
    SurnameMismatch,
}

impl TesseraMatch {
    /// Wire name of the state.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Found(_) => "FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyMigrated => "ALREADY_MIGRATED",
            Self::SurnameMismatch => "SURNAME_MISMATCH",
        }
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The matched record, if any.
    #[must_use]
    pub fn into_profile(self) -> Option<FidelityProfile> {
        match self {
            Self::Found(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Classify a card lookup.
///
/// `migrated` wins over everything else: a claimed card reports
/// `AlreadyMigrated` whatever the surname. A blank `surname` is treated as
/// not supplied. Surnames compare trimmed and case-insensitively.
#[must_use]
pub fn classify(
    record: Option<FidelityProfile>,
    migrated: bool,
    surname: Option<&str>,
) -> TesseraMatch {
    if migrated {
        return TesseraMatch::AlreadyMigrated;
    }

    let Some(profile) = record else {
        return TesseraMatch::NotFound;
    };

    match surname.map(str::trim).filter(|s| !s.is_empty()) {
        Some(surname) if !surname_matches(surname, &profile.cognome) => {
            TesseraMatch::SurnameMismatch
        }
        _ => TesseraMatch::Found(profile),
    }
}

fn surname_matches(supplied: &str, stored: &str) -> bool {
    supplied.to_lowercase() == stored.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::{FidelityRecord, normalize};

    fn profile() -> FidelityProfile {
        let record: FidelityRecord = serde_json::from_value(json!({
            "card_number": "2020000028284",
            "cognome": "ABATANGELO",
            "nome": "CHIARA",
            "prog_spesa": "100,01",
        }))
        .unwrap();
        normalize(&record).unwrap()
    }

    #[test]
    fn test_found_with_matching_surname() {
        let outcome = classify(Some(profile()), false, Some("  abatangelo "));
        assert!(outcome.is_found());
        assert_eq!(outcome.into_profile().unwrap().nome, "CHIARA");
    }

    #[test]
    fn test_found_without_surname() {
        assert!(classify(Some(profile()), false, None).is_found());
        assert!(classify(Some(profile()), false, Some("   ")).is_found());
    }

    #[test]
    fn test_surname_mismatch() {
        assert_eq!(
            classify(Some(profile()), false, Some("ROSSI")),
            TesseraMatch::SurnameMismatch
        );
    }

    #[test]
    fn test_not_found() {
        assert_eq!(classify(None, false, Some("ROSSI")), TesseraMatch::NotFound);
    }

    #[test]
    fn test_already_migrated_ignores_surname() {
        assert_eq!(
            classify(Some(profile()), true, Some("ROSSI")),
            TesseraMatch::AlreadyMigrated
        );
        assert_eq!(classify(None, true, None), TesseraMatch::AlreadyMigrated);
    }

    #[test]
    fn test_wire_format() {
        let found = serde_json::to_value(classify(Some(profile()), false, None)).unwrap();
        assert_eq!(found["status"], "FOUND");
        assert_eq!(found["data"]["cognome"], "ABATANGELO");
        assert!((found["data"]["progressivo_spesa"].as_f64().unwrap() - 100.01).abs() < 1e-9);

        let missing = serde_json::to_value(TesseraMatch::NotFound).unwrap();
        assert_eq!(missing, json!({"status": "NOT_FOUND"}));
        assert_eq!(TesseraMatch::SurnameMismatch.status(), "SURNAME_MISMATCH");
    }
}
