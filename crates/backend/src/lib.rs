//! Tessera Backend - persistence and services of the loyalty program.
//!
//! # Architecture
//!
//! - [`config`] - Environment configuration
//! - [`db`] - Store traits with `PostgreSQL` and in-memory implementations
//! - [`models`] - Stored entities (user profiles, stores, cashiers, admins)
//! - [`services`] - Import, card lookup, registration, auth, points, directory
//! - [`state`] - The [`Backend`] container handed to entry points
//!
//! Services borrow their stores; nothing here holds global state.
//!
//! ```no_run
//! # async fn example() -> Result<(), tessera_backend::AppError> {
//! use tessera_backend::{Backend, BackendConfig};
//!
//! let config = BackendConfig::from_env()?;
//! let backend = Backend::connect(&config).await?;
//! let outcome = backend.matcher().check("2020000028284", Some("Rossi")).await?;
//! println!("{}", outcome.status());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

pub use config::{AuthSettings, BackendConfig, ConfigError};
pub use error::AppError;
pub use state::Backend;
