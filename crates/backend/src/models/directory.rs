//! Store and cashier domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tessera_core::{CashierId, StoreId};

/// A physical store of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    /// Opaque token encoded in the store's QR code.
    pub qr_code: String,
    pub created_at: DateTime<Utc>,
}

/// A till within a store.
///
/// Owned by its store: deleting the store deletes its cashiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cashier {
    pub id: CashierId,
    pub store_id: StoreId,
    pub name: String,
    /// Opaque token encoded in the cashier's QR code.
    pub qr_code: String,
    pub created_at: DateTime<Utc>,
}
