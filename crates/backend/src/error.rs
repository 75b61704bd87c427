//! Unified error handling for entry points.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::services::{AuthError, DirectoryError, IngestError, PointsError, RegistrationError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Registration or card migration was refused.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Points error: {0}")]
    Points(#[from] PointsError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Import aborted.
    #[error("Import error: {0}")]
    Ingest(#[from] IngestError),

    /// Bad request from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(RepositoryError::Database(e))
    }
}

impl AppError {
    /// Whether this error is the system's fault rather than the caller's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Config(_) | Self::Database(_) | Self::Migration(_) | Self::Internal(_) => true,
            Self::Registration(e) => {
                matches!(
                    e,
                    RegistrationError::Repository(_) | RegistrationError::PasswordHash
                )
            }
            Self::Auth(e) => matches!(e, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Points(e) => matches!(e, PointsError::Repository(_)),
            Self::Directory(e) => matches!(e, DirectoryError::Repository(_)),
            Self::Ingest(e) => matches!(e, IngestError::Repository(_) | IngestError::Worker(_)),
            Self::BadRequest(_) => false,
        }
    }

    /// Message safe to show to the caller.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Registration(e) => e.to_string(),
            Self::Auth(e) => e.to_string(),
            Self::Points(e) => e.to_string(),
            Self::Directory(e) => e.to_string(),
            Self::Ingest(e) => e.to_string(),
            Self::BadRequest(message) => message.clone(),
            _ => self.to_string(),
        }
    }

    /// Log the error, sending server errors to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command failed"
            );
        } else {
            tracing::warn!(error = %self, "Command rejected");
        }
    }
}

/// Set the Sentry user context from a user ID.
pub fn set_sentry_user(user_id: i64, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
