//! Registered user repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use tessera_core::{Email, ExtendedProfile, TesseraFisica, UserProfileId};

use super::{RepositoryError, UserStore, map_write_error};
use crate::models::{NewUserProfile, UserProfile};

const USER_COLUMNS: &str = "id, email, password_hash, tessera_fisica, tessera_digitale, punti, \
                            nome, cognome, telefono, profile, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserProfileRow {
    id: i64,
    email: String,
    password_hash: String,
    tessera_fisica: Option<String>,
    tessera_digitale: Uuid,
    punti: i64,
    nome: String,
    cognome: String,
    telefono: String,
    profile: Json<ExtendedProfile>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserProfileRow> for UserProfile {
    type Error = RepositoryError;

    fn try_from(row: UserProfileRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let tessera_fisica = row
            .tessera_fisica
            .as_deref()
            .map(TesseraFisica::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid card number in database: {e}"))
            })?;

        Ok(Self {
            id: UserProfileId::new(row.id),
            email,
            password_hash: row.password_hash,
            tessera_fisica,
            tessera_digitale: row.tessera_digitale,
            punti: row.punti,
            nome: row.nome,
            cognome: row.cognome,
            telefono: row.telefono,
            extended: row.profile.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` implementation of [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM loyalty.user_profile WHERE {clause} = $1");
        let row = sqlx::query_as::<_, UserProfileRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, profile: NewUserProfile) -> Result<UserProfile, RepositoryError> {
        let sql = format!(
            "INSERT INTO loyalty.user_profile \
             (email, password_hash, tessera_fisica, tessera_digitale, nome, cognome, telefono, profile) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserProfileRow>(&sql)
            .bind(profile.email.as_str())
            .bind(&profile.password_hash)
            .bind(profile.tessera_fisica.as_ref().map(TesseraFisica::as_str))
            .bind(profile.tessera_digitale)
            .bind(&profile.nome)
            .bind(&profile.cognome)
            .bind(&profile.telefono)
            .bind(Json(&profile.extended))
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.try_into()
    }

    async fn get(&self, id: UserProfileId) -> Result<Option<UserProfile>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM loyalty.user_profile WHERE id = $1");
        let row = sqlx::query_as::<_, UserProfileRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        self.fetch_one_where("email", email.as_str()).await
    }

    async fn find_by_tessera(
        &self,
        tessera: &TesseraFisica,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        self.fetch_one_where("tessera_fisica", tessera.as_str()).await
    }

    async fn credit_points(
        &self,
        id: UserProfileId,
        amount: i64,
    ) -> Result<UserProfile, RepositoryError> {
        let sql = format!(
            "UPDATE loyalty.user_profile SET punti = punti + $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserProfileRow>(&sql)
            .bind(id)
            .bind(amount)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn redeem_points(
        &self,
        id: UserProfileId,
        cost: i64,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        // Single conditional UPDATE: concurrent redemptions cannot overdraw.
        let sql = format!(
            "UPDATE loyalty.user_profile SET punti = punti - $2, updated_at = NOW() \
             WHERE id = $1 AND punti >= $2 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserProfileRow>(&sql)
            .bind(id)
            .bind(cost)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.try_into().map(Some),
            None if self.get(id).await?.is_some() => Ok(None),
            None => Err(RepositoryError::NotFound),
        }
    }
}
