//! Store and cashier management commands.
//!
//! # Usage
//!
//! ```bash
//! tessera store create -n "Centro" -a "Via Roma 1, Milano"
//! tessera store list
//! tessera store delete 3          # also deletes its cashiers
//! tessera cashier create --store 3 -n "Cassa 1"
//! tessera cashier list --store 3
//! ```

use serde_json::json;
use tessera_backend::{AppError, BackendConfig};
use tessera_core::{CashierId, StoreId};

use super::{connect, print_json};

pub async fn create_store(config: &BackendConfig, name: &str, address: &str) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let store = backend.directory().create_store(name, address).await?;
    print_json(&store)
}

pub async fn list_stores(config: &BackendConfig) -> Result<(), AppError> {
    let backend = connect(config).await?;
    print_json(&backend.directory().list_stores().await?)
}

pub async fn show_store(config: &BackendConfig, id: StoreId) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let directory = backend.directory();
    let store = directory.get_store(id).await?;
    let cashiers = directory.list_cashiers(id).await?;
    print_json(&json!({ "store": store, "cashiers": cashiers }))
}

pub async fn delete_store(config: &BackendConfig, id: StoreId) -> Result<(), AppError> {
    let backend = connect(config).await?;
    backend.directory().delete_store(id).await?;
    print_json(&json!({ "deleted": id }))
}

pub async fn create_cashier(
    config: &BackendConfig,
    store: StoreId,
    name: &str,
) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let cashier = backend.directory().create_cashier(store, name).await?;
    print_json(&cashier)
}

pub async fn list_cashiers(config: &BackendConfig, store: StoreId) -> Result<(), AppError> {
    let backend = connect(config).await?;
    print_json(&backend.directory().list_cashiers(store).await?)
}

pub async fn delete_cashier(config: &BackendConfig, id: CashierId) -> Result<(), AppError> {
    let backend = connect(config).await?;
    backend.directory().delete_cashier(id).await?;
    print_json(&json!({ "deleted": id }))
}
