//! CLI command implementations.

pub mod admin;
pub mod cards;
pub mod directory;
pub mod import;
pub mod migrate;
pub mod points;

use serde::Serialize;
use tessera_backend::{AppError, Backend, BackendConfig};

/// Connect to the configured database.
async fn connect(config: &BackendConfig) -> Result<Backend, AppError> {
    tracing::debug!("Connecting to database...");
    Ok(Backend::connect(config).await?)
}

/// Print a command result as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(format!("cannot serialize output: {e}")))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
