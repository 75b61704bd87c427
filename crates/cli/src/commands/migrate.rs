//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tessera migrate
//! ```
//!
//! # Environment Variables
//!
//! - `TESSERA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migrations live in `crates/backend/migrations/` and are embedded at build time.

use tessera_backend::db;
use tessera_backend::{AppError, BackendConfig};

/// Run all pending migrations.
pub async fn run(config: &BackendConfig) -> Result<(), AppError> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
