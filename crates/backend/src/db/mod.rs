//! Persistence for the loyalty backend.
//!
//! # Schema: `loyalty`
//!
//! ## Tables
//!
//! - `fidelity_card` - Normalized records of the bulk export, keyed by card number
//! - `user_profile` - Registered customers (unique email, unique card when set)
//! - `store` - Physical stores
//! - `cashier` - Tills, deleted with their store
//! - `admin_user` - Dashboard accounts
//!
//! # Backends
//!
//! Each concern is a trait ([`FidelityStore`], [`UserStore`],
//! [`DirectoryStore`], [`AdminStore`]) with a `PostgreSQL` implementation and
//! an in-memory one ([`MemoryStore`]) used by tests and dry runs. Uniqueness
//! is enforced by the backend itself (unique indexes, or a single write lock
//! in memory), never by a read-then-write in the services.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/backend/migrations/` and run via:
//! ```bash
//! cargo run -p tessera-cli -- migrate
//! ```

pub mod admin_users;
pub mod directory;
pub mod fidelity;
pub mod memory;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tessera_core::{
    CashierId, Email, FidelityProfile, StoreId, TesseraFisica, UserProfileId,
};

use crate::models::{AdminUser, Cashier, NewAdminUser, NewUserProfile, Store, UserProfile};

pub use admin_users::PgAdminStore;
pub use directory::PgDirectoryStore;
pub use fidelity::PgFidelityStore;
pub use memory::MemoryStore;
pub use users::PgUserStore;

/// Unique constraint on `user_profile.email`.
pub const USER_EMAIL_KEY: &str = "user_profile_email_key";
/// Unique constraint on `user_profile.tessera_fisica`.
pub const USER_TESSERA_KEY: &str = "user_profile_tessera_fisica_key";
/// Unique constraint on `admin_user.email`.
pub const ADMIN_EMAIL_KEY: &str = "admin_user_email_key";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation. Carries the constraint name.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Whether this is a violation of the named unique constraint.
    #[must_use]
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, Self::Conflict(name) if name == constraint)
    }
}

/// Map a sqlx error, turning unique violations into [`RepositoryError::Conflict`].
pub(crate) fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let constraint = db_err.constraint().unwrap_or("unique").to_owned();
        return RepositoryError::Conflict(constraint);
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the embedded migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

// =============================================================================
// Store traits
// =============================================================================

/// Repository of normalized fidelity records.
#[async_trait]
pub trait FidelityStore: Send + Sync {
    /// Insert or replace records by card number. Returns rows written.
    ///
    /// A batch must not contain the same card twice.
    async fn upsert_batch(&self, profiles: &[FidelityProfile]) -> Result<u64, RepositoryError>;

    /// Look up one record.
    async fn get(&self, tessera: &TesseraFisica)
    -> Result<Option<FidelityProfile>, RepositoryError>;

    /// Number of records held.
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Repository of registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    ///
    /// Fails with [`RepositoryError::Conflict`] naming [`USER_EMAIL_KEY`] or
    /// [`USER_TESSERA_KEY`] when the email or card is already taken.
    async fn create(&self, profile: NewUserProfile) -> Result<UserProfile, RepositoryError>;

    async fn get(&self, id: UserProfileId) -> Result<Option<UserProfile>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError>;

    /// The user holding a physical card, i.e. whether the card is migrated.
    async fn find_by_tessera(
        &self,
        tessera: &TesseraFisica,
    ) -> Result<Option<UserProfile>, RepositoryError>;

    /// Add `amount` points. Fails with [`RepositoryError::NotFound`] for an unknown user.
    async fn credit_points(
        &self,
        id: UserProfileId,
        amount: i64,
    ) -> Result<UserProfile, RepositoryError>;

    /// Subtract `cost` points if the balance covers it.
    ///
    /// Returns `Ok(None)` when the balance is too low; the balance is left
    /// untouched. Fails with [`RepositoryError::NotFound`] for an unknown user.
    async fn redeem_points(
        &self,
        id: UserProfileId,
        cost: i64,
    ) -> Result<Option<UserProfile>, RepositoryError>;
}

/// Repository of stores and their cashiers.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn create_store(
        &self,
        name: &str,
        address: &str,
        qr_code: &str,
    ) -> Result<Store, RepositoryError>;

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError>;

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// Delete a store and all of its cashiers. Returns whether it existed.
    async fn delete_store(&self, id: StoreId) -> Result<bool, RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when the store does not exist.
    async fn create_cashier(
        &self,
        store_id: StoreId,
        name: &str,
        qr_code: &str,
    ) -> Result<Cashier, RepositoryError>;

    async fn list_cashiers(&self, store_id: StoreId) -> Result<Vec<Cashier>, RepositoryError>;

    /// Returns whether the cashier existed.
    async fn delete_cashier(&self, id: CashierId) -> Result<bool, RepositoryError>;
}

/// Repository of admin accounts.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] naming [`ADMIN_EMAIL_KEY`] on a taken email.
    async fn create(&self, admin: NewAdminUser) -> Result<AdminUser, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError>;

    async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError>;
}
