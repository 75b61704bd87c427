//! Registration error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Why a registration or card migration was refused.
///
/// Every variant except `PasswordHash` and `Repository` is a user-facing
/// rejection with a specific reason.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Another account already uses this email.
    #[error("email already registered")]
    DuplicateEmail,

    /// Another account already holds this physical card.
    #[error("card already registered")]
    DuplicateTessera,

    /// No fidelity record has this card number.
    #[error("card not found")]
    NotFound,

    /// The card has already been migrated to an account.
    #[error("card already migrated")]
    AlreadyMigrated,

    /// The surname does not match the card holder.
    #[error("surname does not match the card holder")]
    SurnameMismatch,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tessera_core::EmailError),

    /// Invalid card number.
    #[error("invalid card number: {0}")]
    InvalidTessera(#[from] tessera_core::TesseraError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
