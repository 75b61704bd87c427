//! Service container shared by every entry point.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{AuthSettings, BackendConfig, DEFAULT_IMPORT_BATCH_SIZE};
use crate::db::{
    self, AdminStore, DirectoryStore, FidelityStore, MemoryStore, PgAdminStore, PgDirectoryStore,
    PgFidelityStore, PgUserStore, UserStore,
};
use crate::services::{
    AuthService, DirectoryService, IngestService, MatcherService, PointsService,
    RegistrationService,
};

/// Stores plus settings, built once and passed to whoever needs them.
///
/// Cloning is cheap.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    fidelity: Arc<dyn FidelityStore>,
    users: Arc<dyn UserStore>,
    directory: Arc<dyn DirectoryStore>,
    admins: Arc<dyn AdminStore>,
    pool: Option<PgPool>,
    auth: AuthSettings,
    import_batch_size: usize,
}

impl Backend {
    /// Connect to `PostgreSQL` using the configured URL.
    ///
    /// Migrations are not run here; see [`db::run_migrations`].
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the pool cannot connect.
    pub async fn connect(config: &BackendConfig) -> Result<Self, sqlx::Error> {
        let pool = db::create_pool(&config.database_url).await?;
        tracing::info!("Database pool created");
        Ok(Self::from_pool(pool, config))
    }

    /// Build on an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool, config: &BackendConfig) -> Self {
        Self {
            inner: Arc::new(BackendInner {
                fidelity: Arc::new(PgFidelityStore::new(pool.clone())),
                users: Arc::new(PgUserStore::new(pool.clone())),
                directory: Arc::new(PgDirectoryStore::new(pool.clone())),
                admins: Arc::new(PgAdminStore::new(pool.clone())),
                pool: Some(pool),
                auth: config.auth,
                import_batch_size: config.import_batch_size,
            }),
        }
    }

    /// A volatile backend with default settings.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::in_memory_with(AuthSettings::default(), DEFAULT_IMPORT_BATCH_SIZE)
    }

    /// A volatile backend with explicit settings.
    #[must_use]
    pub fn in_memory_with(auth: AuthSettings, import_batch_size: usize) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            inner: Arc::new(BackendInner {
                fidelity: store.clone(),
                users: store.clone(),
                directory: store.clone(),
                admins: store,
                pool: None,
                auth,
                import_batch_size,
            }),
        }
    }

    /// The `PostgreSQL` pool, if this backend has one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn fidelity(&self) -> &dyn FidelityStore {
        self.inner.fidelity.as_ref()
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    #[must_use]
    pub fn directory_store(&self) -> &dyn DirectoryStore {
        self.inner.directory.as_ref()
    }

    #[must_use]
    pub fn admins(&self) -> &dyn AdminStore {
        self.inner.admins.as_ref()
    }

    // =========================================================================
    // Services
    // =========================================================================

    #[must_use]
    pub fn ingest(&self) -> IngestService<'_> {
        IngestService::new(self.fidelity(), self.inner.import_batch_size)
    }

    #[must_use]
    pub fn matcher(&self) -> MatcherService<'_> {
        MatcherService::new(self.fidelity(), self.users())
    }

    #[must_use]
    pub fn registration(&self) -> RegistrationService<'_> {
        RegistrationService::new(self.fidelity(), self.users(), self.inner.auth)
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.users(), self.admins(), self.inner.auth)
    }

    #[must_use]
    pub fn points(&self) -> PointsService<'_> {
        PointsService::new(self.users())
    }

    #[must_use]
    pub fn directory(&self) -> DirectoryService<'_> {
        DirectoryService::new(self.directory_store())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;
    use tessera_core::TesseraMatch;

    use super::*;
    use crate::models::NewRegistration;

    /// A card imported from the export, looked up, migrated, then looked up again.
    #[tokio::test]
    async fn test_end_to_end_migration() {
        let backend = Backend::in_memory();
        let export = r#"{"card_number":"2020000028284","cognome":"ABATANGELO","nome":"CHIARA","email":"chiara"abatangelo@example.it","prog_spesa":"100,01","bollini":"25","flag_privacy":"1","celiaco":"0"}"#;

        let summary = backend
            .ingest()
            .import_reader(Cursor::new(export.as_bytes().to_vec()))
            .await
            .unwrap();
        assert_eq!(summary.report.repaired, 1);

        let found = backend
            .matcher()
            .check("2020000028284", Some("Abatangelo"))
            .await
            .unwrap();
        let wire = serde_json::to_value(&found).unwrap();
        assert_eq!(wire["status"], "FOUND");
        assert_eq!(wire["data"]["nome"], "CHIARA");
        assert_eq!(wire["data"]["bollini"], 25);
        assert_eq!(wire["data"]["consenso_privacy"], true);
        assert_eq!(wire["data"]["celiachia"], false);
        assert!((wire["data"]["progressivo_spesa"].as_f64().unwrap() - 100.01).abs() < 1e-9);

        let user = backend
            .registration()
            .migrate(
                "2020000028284",
                Some("Abatangelo"),
                "chiara@example.it",
                "correct-horse",
            )
            .await
            .unwrap();
        assert_eq!(user.extended.bollini, 25);
        assert_eq!(user.punti, 0);

        assert_eq!(
            backend.matcher().check("2020000028284", None).await.unwrap(),
            TesseraMatch::AlreadyMigrated
        );

        let logged_in = backend
            .auth()
            .login("Chiara@Example.it", "correct-horse")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_with_supplied_profile_fields() {
        let backend = Backend::in_memory();
        let input: NewRegistration = serde_json::from_value(json!({
            "email": "luca@example.it",
            "password": "correct-horse",
            "nome": "LUCA",
            "spesa_anno": "1.980,53",
            "numero_figli": "",
            "vegano": "1",
        }))
        .unwrap();

        let user = backend.registration().register(input).await.unwrap();
        let stored = backend.users().get(user.id).await.unwrap().unwrap();

        assert!((stored.extended.spesa_anno - 1980.53).abs() < 1e-9);
        assert_eq!(stored.extended.numero_figli, 0);
        assert!(stored.extended.vegano);
        assert!(!stored.extended.vegetariano);
    }

    #[test]
    fn test_in_memory_has_no_pool() {
        assert!(Backend::in_memory().pool().is_none());
    }
}
