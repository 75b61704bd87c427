//! Store and cashier repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tessera_core::{CashierId, StoreId};

use super::{DirectoryStore, RepositoryError, map_write_error};
use crate::models::{Cashier, Store};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i64,
    name: String,
    address: String,
    qr_code: String,
    created_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            name: row.name,
            address: row.address,
            qr_code: row.qr_code,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CashierRow {
    id: i64,
    store_id: i64,
    name: String,
    qr_code: String,
    created_at: DateTime<Utc>,
}

impl From<CashierRow> for Cashier {
    fn from(row: CashierRow) -> Self {
        Self {
            id: CashierId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: row.name,
            qr_code: row.qr_code,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` implementation of [`DirectoryStore`].
///
/// Cashier cleanup on store deletion is done by the `ON DELETE CASCADE`
/// foreign key.
#[derive(Debug, Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn create_store(
        &self,
        name: &str,
        address: &str,
        qr_code: &str,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO loyalty.store (name, address, qr_code)
            VALUES ($1, $2, $3)
            RETURNING id, name, address, qr_code, created_at
            ",
        )
        .bind(name)
        .bind(address)
        .bind(qr_code)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            "SELECT id, name, address, qr_code, created_at FROM loyalty.store ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            "SELECT id, name, address, qr_code, created_at FROM loyalty.store WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_store(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM loyalty.store WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_cashier(
        &self,
        store_id: StoreId,
        name: &str,
        qr_code: &str,
    ) -> Result<Cashier, RepositoryError> {
        let row = sqlx::query_as::<_, CashierRow>(
            r"
            INSERT INTO loyalty.cashier (store_id, name, qr_code)
            VALUES ($1, $2, $3)
            RETURNING id, store_id, name, qr_code, created_at
            ",
        )
        .bind(store_id)
        .bind(name)
        .bind(qr_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            map_write_error(e)
        })?;

        Ok(row.into())
    }

    async fn list_cashiers(&self, store_id: StoreId) -> Result<Vec<Cashier>, RepositoryError> {
        let rows = sqlx::query_as::<_, CashierRow>(
            r"
            SELECT id, store_id, name, qr_code, created_at
            FROM loyalty.cashier
            WHERE store_id = $1
            ORDER BY id
            ",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_cashier(&self, id: CashierId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM loyalty.cashier WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
