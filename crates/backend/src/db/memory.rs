//! In-memory implementation of every store trait.
//!
//! Used by unit tests and by `import --dry-run`. Each collection sits behind
//! its own `tokio::sync::RwLock`; uniqueness checks and the insert they guard
//! happen under one write lock, which gives the same guarantees as the unique
//! indexes of the `PostgreSQL` schema.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use tessera_core::{
    AdminUserId, CashierId, Email, FidelityProfile, StoreId, TesseraFisica, UserProfileId,
};

use super::{
    ADMIN_EMAIL_KEY, AdminStore, DirectoryStore, FidelityStore, RepositoryError, USER_EMAIL_KEY,
    USER_TESSERA_KEY, UserStore,
};
use crate::models::{AdminUser, Cashier, NewAdminUser, NewUserProfile, Store, UserProfile};

#[derive(Debug)]
struct Table<T> {
    last_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    const fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
struct Directory {
    stores: Table<Store>,
    cashiers: Table<Cashier>,
}

/// Volatile backend holding everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    fidelity: RwLock<HashMap<TesseraFisica, FidelityProfile>>,
    users: RwLock<Table<UserProfile>>,
    directory: RwLock<Directory>,
    admins: RwLock<Table<AdminUser>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FidelityStore for MemoryStore {
    async fn upsert_batch(&self, profiles: &[FidelityProfile]) -> Result<u64, RepositoryError> {
        let mut fidelity = self.fidelity.write().await;
        for profile in profiles {
            fidelity.insert(profile.tessera_fisica.clone(), profile.clone());
        }
        Ok(profiles.len() as u64)
    }

    async fn get(
        &self,
        tessera: &TesseraFisica,
    ) -> Result<Option<FidelityProfile>, RepositoryError> {
        Ok(self.fidelity.read().await.get(tessera).cloned())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.fidelity.read().await.len() as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, profile: NewUserProfile) -> Result<UserProfile, RepositoryError> {
        let mut users = self.users.write().await;

        if users.rows.values().any(|u| u.email == profile.email) {
            return Err(RepositoryError::Conflict(USER_EMAIL_KEY.to_owned()));
        }
        if let Some(tessera) = &profile.tessera_fisica
            && users
                .rows
                .values()
                .any(|u| u.tessera_fisica.as_ref() == Some(tessera))
        {
            return Err(RepositoryError::Conflict(USER_TESSERA_KEY.to_owned()));
        }

        let id = users.next_id();
        let user = profile.into_profile(UserProfileId::new(id), Utc::now());
        users.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: UserProfileId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.users.read().await.rows.get(&id.as_i64()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.rows.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_tessera(
        &self,
        tessera: &TesseraFisica,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .rows
            .values()
            .find(|u| u.tessera_fisica.as_ref() == Some(tessera))
            .cloned())
    }

    async fn credit_points(
        &self,
        id: UserProfileId,
        amount: i64,
    ) -> Result<UserProfile, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .rows
            .get_mut(&id.as_i64())
            .ok_or(RepositoryError::NotFound)?;

        user.punti = user.punti.checked_add(amount).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("points overflow for user {id}"))
        })?;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn redeem_points(
        &self,
        id: UserProfileId,
        cost: i64,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .rows
            .get_mut(&id.as_i64())
            .ok_or(RepositoryError::NotFound)?;

        if user.punti < cost {
            return Ok(None);
        }
        user.punti -= cost;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn create_store(
        &self,
        name: &str,
        address: &str,
        qr_code: &str,
    ) -> Result<Store, RepositoryError> {
        let mut directory = self.directory.write().await;
        let id = directory.stores.next_id();
        let store = Store {
            id: StoreId::new(id),
            name: name.to_owned(),
            address: address.to_owned(),
            qr_code: qr_code.to_owned(),
            created_at: Utc::now(),
        };
        directory.stores.rows.insert(id, store.clone());
        Ok(store)
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let directory = self.directory.read().await;
        Ok(directory.stores.rows.values().cloned().collect())
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let directory = self.directory.read().await;
        Ok(directory.stores.rows.get(&id.as_i64()).cloned())
    }

    async fn delete_store(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let mut directory = self.directory.write().await;
        if directory.stores.rows.remove(&id.as_i64()).is_none() {
            return Ok(false);
        }
        directory.cashiers.rows.retain(|_, c| c.store_id != id);
        Ok(true)
    }

    async fn create_cashier(
        &self,
        store_id: StoreId,
        name: &str,
        qr_code: &str,
    ) -> Result<Cashier, RepositoryError> {
        let mut directory = self.directory.write().await;
        if !directory.stores.rows.contains_key(&store_id.as_i64()) {
            return Err(RepositoryError::NotFound);
        }

        let id = directory.cashiers.next_id();
        let cashier = Cashier {
            id: CashierId::new(id),
            store_id,
            name: name.to_owned(),
            qr_code: qr_code.to_owned(),
            created_at: Utc::now(),
        };
        directory.cashiers.rows.insert(id, cashier.clone());
        Ok(cashier)
    }

    async fn list_cashiers(&self, store_id: StoreId) -> Result<Vec<Cashier>, RepositoryError> {
        let directory = self.directory.read().await;
        Ok(directory
            .cashiers
            .rows
            .values()
            .filter(|c| c.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn delete_cashier(&self, id: CashierId) -> Result<bool, RepositoryError> {
        let mut directory = self.directory.write().await;
        Ok(directory.cashiers.rows.remove(&id.as_i64()).is_some())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn create(&self, admin: NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let mut admins = self.admins.write().await;
        if admins.rows.values().any(|a| a.email == admin.email) {
            return Err(RepositoryError::Conflict(ADMIN_EMAIL_KEY.to_owned()));
        }

        let id = admins.next_id();
        let now = Utc::now();
        let user = AdminUser {
            id: AdminUserId::new(id),
            email: admin.email,
            name: admin.name,
            role: admin.role,
            password_hash: admin.password_hash,
            created_at: now,
            updated_at: now,
        };
        admins.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError> {
        let admins = self.admins.read().await;
        Ok(admins.rows.values().find(|a| &a.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let admins = self.admins.read().await;
        Ok(admins.rows.values().rev().cloned().collect())
    }
}
