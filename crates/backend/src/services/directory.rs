//! Store and cashier management.

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

use tessera_core::{CashierId, StoreId};

use crate::db::{DirectoryStore, RepositoryError};
use crate::models::{Cashier, Store};

/// Length of the random part of a QR token.
const QR_TOKEN_LENGTH: usize = 24;

/// Errors that can occur when managing stores and cashiers.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("store not found: {0}")]
    StoreNotFound(StoreId),

    #[error("cashier not found: {0}")]
    CashierNotFound(CashierId),

    /// Names must not be blank.
    #[error("name cannot be empty")]
    EmptyName,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Stores, their cashiers, and the QR tokens that identify them.
pub struct DirectoryService<'a> {
    directory: &'a dyn DirectoryStore,
}

impl<'a> DirectoryService<'a> {
    #[must_use]
    pub const fn new(directory: &'a dyn DirectoryStore) -> Self {
        Self { directory }
    }

    /// Create a store with a fresh QR token.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` for a blank name.
    pub async fn create_store(&self, name: &str, address: &str) -> Result<Store, DirectoryError> {
        let name = non_blank(name)?;
        let store = self
            .directory
            .create_store(name, address.trim(), &generate_qr_token("ST"))
            .await?;

        tracing::info!(store_id = %store.id, name = %store.name, "store created");
        Ok(store)
    }

    /// All stores, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the lookup fails.
    pub async fn list_stores(&self) -> Result<Vec<Store>, DirectoryError> {
        Ok(self.directory.list_stores().await?)
    }

    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown store.
    pub async fn get_store(&self, id: StoreId) -> Result<Store, DirectoryError> {
        self.directory
            .get_store(id)
            .await?
            .ok_or(DirectoryError::StoreNotFound(id))
    }

    /// Delete a store together with its cashiers.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown store.
    pub async fn delete_store(&self, id: StoreId) -> Result<(), DirectoryError> {
        if !self.directory.delete_store(id).await? {
            return Err(DirectoryError::StoreNotFound(id));
        }

        tracing::info!(store_id = %id, "store deleted");
        Ok(())
    }

    /// Add a cashier to an existing store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown store, `EmptyName` for a blank name.
    pub async fn create_cashier(
        &self,
        store_id: StoreId,
        name: &str,
    ) -> Result<Cashier, DirectoryError> {
        let name = non_blank(name)?;
        let cashier = self
            .directory
            .create_cashier(store_id, name, &generate_qr_token("CA"))
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => DirectoryError::StoreNotFound(store_id),
                other => DirectoryError::Repository(other),
            })?;

        tracing::info!(cashier_id = %cashier.id, store_id = %store_id, "cashier created");
        Ok(cashier)
    }

    /// Cashiers of a store.
    ///
    /// # Errors
    ///
    /// Returns `StoreNotFound` for an unknown store.
    pub async fn list_cashiers(&self, store_id: StoreId) -> Result<Vec<Cashier>, DirectoryError> {
        self.get_store(store_id).await?;
        Ok(self.directory.list_cashiers(store_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CashierNotFound` for an unknown cashier.
    pub async fn delete_cashier(&self, id: CashierId) -> Result<(), DirectoryError> {
        if !self.directory.delete_cashier(id).await? {
            return Err(DirectoryError::CashierNotFound(id));
        }

        tracing::info!(cashier_id = %id, "cashier deleted");
        Ok(())
    }
}

fn non_blank(name: &str) -> Result<&str, DirectoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DirectoryError::EmptyName);
    }
    Ok(name)
}

/// Random token for a QR code, e.g. `ST-9fQe...`.
fn generate_qr_token(prefix: &str) -> String {
    let random: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(QR_TOKEN_LENGTH)
        .map(char::from)
        .collect();
    format!("{prefix}-{random}")
}
