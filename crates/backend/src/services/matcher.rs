//! Physical card lookup against the stores.

use tessera_core::{TesseraFisica, TesseraMatch, classify};

use crate::db::{FidelityStore, RepositoryError, UserStore};

/// Read-only card lookup.
///
/// Migration status is not stored anywhere: a card is migrated exactly when
/// a registered user holds it.
pub struct MatcherService<'a> {
    fidelity: &'a dyn FidelityStore,
    users: &'a dyn UserStore,
}

impl<'a> MatcherService<'a> {
    #[must_use]
    pub const fn new(fidelity: &'a dyn FidelityStore, users: &'a dyn UserStore) -> Self {
        Self { fidelity, users }
    }

    /// Classify a card number, optionally checking the holder's surname.
    ///
    /// A malformed card number cannot exist in the repository and reports
    /// `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a store lookup fails.
    pub async fn check(
        &self,
        tessera: &str,
        surname: Option<&str>,
    ) -> Result<TesseraMatch, RepositoryError> {
        let Ok(tessera) = TesseraFisica::parse(tessera) else {
            tracing::debug!(tessera, "malformed card number");
            return Ok(TesseraMatch::NotFound);
        };

        self.check_card(&tessera, surname).await
    }

    /// Classify an already validated card number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a store lookup fails.
    pub async fn check_card(
        &self,
        tessera: &TesseraFisica,
        surname: Option<&str>,
    ) -> Result<TesseraMatch, RepositoryError> {
        let migrated = self.users.find_by_tessera(tessera).await?.is_some();
        let record = if migrated {
            None
        } else {
            self.fidelity.get(tessera).await?
        };

        let outcome = classify(record, migrated, surname);
        tracing::debug!(%tessera, status = outcome.status(), "card lookup");
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tessera_core::{FidelityRecord, normalize};

    use super::*;
    use crate::db::MemoryStore;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let record: FidelityRecord = serde_json::from_value(json!({
            "card_number": "2020000028284",
            "cognome": "ABATANGELO",
            "nome": "CHIARA",
        }))
        .unwrap();
        store
            .upsert_batch(&[normalize(&record).unwrap()])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_check_states() {
        let store = seeded().await;
        let matcher = MatcherService::new(&store, &store);

        assert!(
            matcher
                .check("2020000028284", Some("Abatangelo"))
                .await
                .unwrap()
                .is_found()
        );
        assert_eq!(
            matcher.check("2020000028284", Some("Rossi")).await.unwrap(),
            TesseraMatch::SurnameMismatch
        );
        assert_eq!(
            matcher.check("9999999999999", None).await.unwrap(),
            TesseraMatch::NotFound
        );
        assert_eq!(
            matcher.check("not a card!", None).await.unwrap(),
            TesseraMatch::NotFound
        );
    }
}
