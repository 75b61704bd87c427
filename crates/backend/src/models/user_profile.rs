//! Registered user domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::normalize::lenient;
use tessera_core::{Email, ExtendedProfile, FidelityProfile, TesseraFisica, UserProfileId};

/// A registered loyalty customer (domain type).
///
/// Serializes with the same field names as a normalized fidelity record, so a
/// migrated profile reads like the card it came from. The password hash is
/// never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: UserProfileId,
    /// Login email, stored lowercase.
    pub email: Email,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Physical card this account was migrated from, if any.
    pub tessera_fisica: Option<TesseraFisica>,
    /// Digital card issued at registration.
    pub tessera_digitale: Uuid,
    /// Redeemable points balance. Never negative.
    pub punti: i64,
    pub nome: String,
    pub cognome: String,
    pub telefono: String,
    #[serde(flatten)]
    pub extended: ExtendedProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated profile ready to be inserted.
///
/// Built by the registration service; stores assign `id` and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserProfile {
    pub email: Email,
    pub password_hash: String,
    pub tessera_fisica: Option<TesseraFisica>,
    pub tessera_digitale: Uuid,
    pub nome: String,
    pub cognome: String,
    pub telefono: String,
    pub extended: ExtendedProfile,
}

impl NewUserProfile {
    /// Materialize the stored profile.
    #[must_use]
    pub fn into_profile(self, id: UserProfileId, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id,
            email: self.email,
            password_hash: self.password_hash,
            tessera_fisica: self.tessera_fisica,
            tessera_digitale: self.tessera_digitale,
            punti: 0,
            nome: self.nome,
            cognome: self.cognome,
            telefono: self.telefono,
            extended: self.extended,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration input.
///
/// Profile fields are optional and lenient: `"progressivo_spesa": "1.980,53"`
/// or `"consenso_privacy": "1"` are accepted exactly as in the export.
#[derive(Clone, Default, Deserialize)]
pub struct NewRegistration {
    pub email: String,
    pub password: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub tessera_fisica: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub nome: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cognome: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub telefono: String,
    #[serde(flatten)]
    pub extended: ExtendedProfile,
}

impl NewRegistration {
    /// Registration input for migrating a physical card.
    ///
    /// Every profile field comes from the normalized record; only the login
    /// credentials come from the caller.
    #[must_use]
    pub fn from_fidelity(profile: FidelityProfile, email: &str, password: &str) -> Self {
        Self {
            email: email.to_owned(),
            password: password.to_owned(),
            tessera_fisica: Some(profile.tessera_fisica.into()),
            nome: profile.nome,
            cognome: profile.cognome,
            telefono: profile.telefono,
            extended: profile.extended,
        }
    }
}

impl fmt::Debug for NewRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRegistration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("tessera_fisica", &self.tessera_fisica)
            .field("nome", &self.nome)
            .field("cognome", &self.cognome)
            .finish_non_exhaustive()
    }
}
