//! Fidelity card repository for `PostgreSQL`.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`), so the crate
//! builds without a live database.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use tessera_core::{ExtendedProfile, FidelityProfile, TesseraFisica};

use super::{FidelityStore, RepositoryError};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct FidelityCardRow {
    tessera_fisica: String,
    nome: String,
    cognome: String,
    email: String,
    telefono: String,
    profile: Json<ExtendedProfile>,
}

impl TryFrom<FidelityCardRow> for FidelityProfile {
    type Error = RepositoryError;

    fn try_from(row: FidelityCardRow) -> Result<Self, Self::Error> {
        let tessera_fisica = TesseraFisica::parse(&row.tessera_fisica).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid card number in database: {e}"))
        })?;

        Ok(Self {
            tessera_fisica,
            nome: row.nome,
            cognome: row.cognome,
            email: row.email,
            telefono: row.telefono,
            extended: row.profile.0,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` implementation of [`FidelityStore`].
#[derive(Debug, Clone)]
pub struct PgFidelityStore {
    pool: PgPool,
}

impl PgFidelityStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FidelityStore for PgFidelityStore {
    async fn upsert_batch(&self, profiles: &[FidelityProfile]) -> Result<u64, RepositoryError> {
        if profiles.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO loyalty.fidelity_card \
             (tessera_fisica, nome, cognome, email, telefono, profile) ",
        );
        builder.push_values(profiles, |mut row, profile| {
            row.push_bind(profile.tessera_fisica.as_str())
                .push_bind(&profile.nome)
                .push_bind(&profile.cognome)
                .push_bind(&profile.email)
                .push_bind(&profile.telefono)
                .push_bind(Json(&profile.extended));
        });
        builder.push(
            " ON CONFLICT (tessera_fisica) DO UPDATE SET \
             nome = EXCLUDED.nome, \
             cognome = EXCLUDED.cognome, \
             email = EXCLUDED.email, \
             telefono = EXCLUDED.telefono, \
             profile = EXCLUDED.profile, \
             updated_at = NOW()",
        );

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn get(
        &self,
        tessera: &TesseraFisica,
    ) -> Result<Option<FidelityProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, FidelityCardRow>(
            r"
            SELECT tessera_fisica, nome, cognome, email, telefono, profile
            FROM loyalty.fidelity_card
            WHERE tessera_fisica = $1
            ",
        )
        .bind(tessera.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loyalty.fidelity_card")
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative row count {count}")))
    }
}
