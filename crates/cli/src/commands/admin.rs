//! Admin user management and credential checks.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin user
//! tessera admin create -e admin@example.com -n "Admin Name" -r super_admin -p secret123
//!
//! # Check a password
//! tessera login -e admin@example.com -p secret123 --admin
//! ```
//!
//! # Environment Variables
//!
//! - `TESSERA_DATABASE_URL` - `PostgreSQL` connection string
//! - `TESSERA_MIN_PASSWORD_LENGTH` - Minimum password length (default: 8)

use tessera_backend::error::set_sentry_user;
use tessera_backend::{AppError, BackendConfig};

use super::{connect, print_json};

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `role` - Admin's role (`super_admin` or `admin`)
/// * `password` - Initial password
pub async fn create_user(
    config: &BackendConfig,
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<(), AppError> {
    let backend = connect(config).await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let admin = backend
        .auth()
        .create_admin(email, name, role, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );
    print_json(&admin)
}

pub async fn list_users(config: &BackendConfig) -> Result<(), AppError> {
    let backend = connect(config).await?;
    print_json(&backend.admins().list().await?)
}

/// Verify an email/password pair and print the account.
pub async fn login(
    config: &BackendConfig,
    email: &str,
    password: &str,
    admin: bool,
) -> Result<(), AppError> {
    let backend = connect(config).await?;
    let auth = backend.auth();

    if admin {
        let admin = auth.admin_login(email, password).await?;
        set_sentry_user(admin.id.as_i64(), Some(admin.email.as_str()));
        print_json(&admin)
    } else {
        let user = auth.login(email, password).await?;
        set_sentry_user(user.id.as_i64(), Some(user.email.as_str()));
        print_json(&user)
    }
}
