//! Core types for Tessera.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod tessera;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::AdminRole;
pub use tessera::{TesseraError, TesseraFisica};
