//! Admin user domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tessera_core::{AdminRole, AdminUserId, Email};

/// A dashboard admin account (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A validated admin account ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminUser {
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub password_hash: String,
}
