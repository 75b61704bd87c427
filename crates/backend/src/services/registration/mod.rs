//! Account registration and physical card migration.
//!
//! Registration checks email and card uniqueness up front for a clear
//! answer, but the stores have the final word: a concurrent registration
//! that slips between the check and the insert is rejected by the unique
//! constraint and mapped back to the same `Duplicate*` error.

mod error;

pub use error::RegistrationError;

use uuid::Uuid;

use tessera_core::{Email, TesseraFisica, TesseraMatch};

use crate::config::AuthSettings;
use crate::db::{FidelityStore, RepositoryError, USER_EMAIL_KEY, USER_TESSERA_KEY, UserStore};
use crate::models::{NewRegistration, NewUserProfile, UserProfile};
use crate::services::auth::{self, AuthError};
use crate::services::matcher::MatcherService;

/// Registration service.
pub struct RegistrationService<'a> {
    fidelity: &'a dyn FidelityStore,
    users: &'a dyn UserStore,
    settings: AuthSettings,
}

impl<'a> RegistrationService<'a> {
    #[must_use]
    pub const fn new(
        fidelity: &'a dyn FidelityStore,
        users: &'a dyn UserStore,
        settings: AuthSettings,
    ) -> Self {
        Self {
            fidelity,
            users,
            settings,
        }
    }

    /// Register a new account.
    ///
    /// The new account gets a fresh digital card and zero points. Profile
    /// fields are copied as given; a supplied physical card is recorded as
    /// migrated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail`, `WeakPassword` or `InvalidTessera` for bad
    /// input, `DuplicateEmail` / `DuplicateTessera` when the email or card is
    /// already registered.
    pub async fn register(&self, input: NewRegistration) -> Result<UserProfile, RegistrationError> {
        let email = Email::parse(&input.email)?;
        auth::validate_password(&input.password, self.settings).map_err(from_auth)?;
        let tessera_fisica = input
            .tessera_fisica
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(TesseraFisica::parse)
            .transpose()?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(RegistrationError::DuplicateEmail);
        }
        if let Some(tessera) = &tessera_fisica
            && self.users.find_by_tessera(tessera).await?.is_some()
        {
            return Err(RegistrationError::DuplicateTessera);
        }

        let password_hash = auth::hash_password(&input.password).map_err(from_auth)?;

        let user = self
            .users
            .create(NewUserProfile {
                email,
                password_hash,
                tessera_fisica,
                tessera_digitale: Uuid::new_v4(),
                nome: input.nome.trim().to_owned(),
                cognome: input.cognome.trim().to_owned(),
                telefono: input.telefono.trim().to_owned(),
                extended: input.extended,
            })
            .await
            .map_err(from_repository)?;

        tracing::info!(
            user_id = %user.id,
            tessera_digitale = %user.tessera_digitale,
            migrated = user.tessera_fisica.is_some(),
            "user registered"
        );
        Ok(user)
    }

    /// Migrate a physical card to a new account.
    ///
    /// The card must be found, unclaimed, and (when a surname is given) held
    /// by that surname. The account is created with every field of the
    /// normalized record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AlreadyMigrated` or `SurnameMismatch` from the
    /// lookup, then any error of [`Self::register`].
    pub async fn migrate(
        &self,
        tessera: &str,
        surname: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, RegistrationError> {
        let tessera = TesseraFisica::parse(tessera)?;

        let matcher = MatcherService::new(self.fidelity, self.users);
        let profile = match matcher.check_card(&tessera, surname).await? {
            TesseraMatch::Found(profile) => profile,
            TesseraMatch::NotFound => return Err(RegistrationError::NotFound),
            TesseraMatch::AlreadyMigrated => return Err(RegistrationError::AlreadyMigrated),
            TesseraMatch::SurnameMismatch => return Err(RegistrationError::SurnameMismatch),
        };

        self.register(NewRegistration::from_fidelity(profile, email, password))
            .await
            .map_err(|e| match e {
                // Lost a race with another migration of the same card
                RegistrationError::DuplicateTessera => RegistrationError::AlreadyMigrated,
                other => other,
            })
    }
}

fn from_auth(e: AuthError) -> RegistrationError {
    match e {
        AuthError::WeakPassword(reason) => RegistrationError::WeakPassword(reason),
        AuthError::InvalidEmail(e) => RegistrationError::InvalidEmail(e),
        AuthError::Repository(e) => RegistrationError::Repository(e),
        _ => RegistrationError::PasswordHash,
    }
}

fn from_repository(e: RepositoryError) -> RegistrationError {
    if e.is_conflict_on(USER_EMAIL_KEY) {
        RegistrationError::DuplicateEmail
    } else if e.is_conflict_on(USER_TESSERA_KEY) {
        RegistrationError::DuplicateTessera
    } else {
        RegistrationError::Repository(e)
    }
}
