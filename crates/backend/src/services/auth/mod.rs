//! Authentication service.
//!
//! Password login for loyalty customers and dashboard admins, and admin
//! account creation. Issuing session tokens is left to the caller.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use tessera_core::{AdminRole, Email};

use crate::config::AuthSettings;
use crate::db::{AdminStore, RepositoryError, UserStore};
use crate::models::{AdminUser, NewAdminUser, UserProfile};

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    admins: &'a dyn AdminStore,
    settings: AuthSettings,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        users: &'a dyn UserStore,
        admins: &'a dyn AdminStore,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            admins,
            settings,
        }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    // =========================================================================
    // Admins
    // =========================================================================

    /// Login to the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email)?;

        let admin = self
            .admins
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &admin.password_hash)?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "admin logged in");
        Ok(admin)
    }

    /// Create a dashboard account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRole` for an unknown role,
    /// `AuthError::InvalidEmail` / `AuthError::WeakPassword` for bad input, and
    /// `AuthError::AlreadyExists` if the email is taken.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        role: &str,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        let role: AdminRole = role
            .parse()
            .map_err(|_| AuthError::InvalidRole(role.to_owned()))?;
        let email = Email::parse(email)?;
        self.validate_password(password)?;
        let password_hash = hash_password(password)?;

        let admin = self
            .admins
            .create(NewAdminUser {
                email,
                name: name.trim().to_owned(),
                role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(admin_id = %admin.id, email = %admin.email, role = %admin.role, "admin created");
        Ok(admin)
    }

    /// Validate password meets requirements.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short.
    pub fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        validate_password(password, self.settings)
    }
}

/// Check a password against the policy.
pub(crate) fn validate_password(password: &str, settings: AuthSettings) -> Result<(), AuthError> {
    let min = settings.min_password_length;
    if password.chars().count() < min {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {min} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::db::MemoryStore;

    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("correct-horse").unwrap(),
            hash_password("correct-horse").unwrap()
        );
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_admin_create_and_login() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store, &store, AuthSettings::default());

        let admin = auth
            .create_admin("Boss@Tessera.it", " Boss ", "super_admin", "long-enough")
            .await
            .unwrap();
        assert_eq!(admin.email.as_str(), "boss@tessera.it");
        assert_eq!(admin.name, "Boss");
        assert!(admin.role.can_manage_admins());

        let logged_in = auth.admin_login("boss@tessera.it", "long-enough").await.unwrap();
        assert_eq!(logged_in.id, admin.id);

        assert!(matches!(
            auth.admin_login("boss@tessera.it", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.create_admin("boss@tessera.it", "Boss", "admin", "long-enough").await,
            Err(AuthError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_admin_create_rejects_bad_input() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store, &store, AuthSettings::default());

        assert!(matches!(
            auth.create_admin("a@b.it", "A", "viewer", "long-enough").await,
            Err(AuthError::InvalidRole(_))
        ));
        assert!(matches!(
            auth.create_admin("not-an-email", "A", "admin", "long-enough").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.create_admin("a@b.it", "A", "admin", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store, &store, AuthSettings::default());

        assert!(matches!(
            auth.login("nobody@tessera.it", "whatever1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_policy_is_configurable() {
        let store = MemoryStore::new();
        let auth = AuthService::new(
            &store,
            &store,
            AuthSettings {
                min_password_length: 12,
            },
        );

        assert!(auth.validate_password("elevenchars").is_err());
        assert!(auth.validate_password("twelve-chars").is_ok());
    }
}
