//! Services module
//!
//! Business logic services and the composition root wiring them together

pub mod audit;
pub mod photo;

pub use audit::AuditService;
pub use photo::{PhotoKind, PhotoStore, PHOTO_ROOT_DIR};

use std::sync::Arc;

use tracing::info;

use crate::config::{DirectoryBackend, Settings};
use crate::database::{connection, DatabasePool, DatabaseService};
use crate::directory::{
    AuthProvider, DirectoryService, DocumentStore, JwtAuthProvider, MemoryDocumentStore,
    RedisDocumentStore,
};
use crate::report::ReportGenerator;
use crate::utils::errors::{AuditError, Result};

/// Every service of the application, built once from [`Settings`]
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub pool: DatabasePool,
    pub database: DatabaseService,
    pub photos: PhotoStore,
    pub audit: AuditService,
    pub directory: Arc<DirectoryService>,
    pub reports: ReportGenerator,
}

impl AppContext {
    /// Connect to the configured backends and run local migrations
    pub async fn initialize(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let pool = connection::create_pool(&settings.database).await?;
        connection::run_migrations(&pool).await?;

        let store = connect_document_store(&settings).await?;
        let auth: Arc<dyn AuthProvider> = Arc::new(JwtAuthProvider::new(&settings.auth)?);
        Ok(Self::with_backends(settings, pool, auth, store))
    }

    /// Wire services around already constructed backends
    pub fn with_backends(
        settings: Settings,
        pool: DatabasePool,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let database = DatabaseService::new(pool.clone());
        let photos = PhotoStore::new(&settings.photos);
        let audit = AuditService::new(database.clone(), photos.clone());
        let directory = Arc::new(DirectoryService::new(auth, store, settings.directory.clone()));
        let reports = ReportGenerator::new(database.clone(), settings.reports.clone());

        Self {
            settings,
            pool,
            database,
            photos,
            audit,
            directory,
            reports,
        }
    }

    /// Health check for the local store
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = connection::health_check(&self.pool).await.is_ok();
        let schema_version = connection::schema_version(&self.pool).await.unwrap_or(0);

        ServiceHealthStatus {
            database_healthy,
            schema_version,
            directory_backend: self.settings.directory.backend,
        }
    }
}

async fn connect_document_store(settings: &Settings) -> Result<Arc<dyn DocumentStore>> {
    let directory = &settings.directory;
    match directory.backend {
        DirectoryBackend::Memory => {
            info!("Using in-memory directory store");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        DirectoryBackend::Redis => {
            let url = directory.redis_url.as_deref().ok_or_else(|| {
                AuditError::Config("Redis URL is required for the redis backend".to_string())
            })?;
            Ok(Arc::new(RedisDocumentStore::connect(url, &directory.key_prefix).await?))
        }
    }
}

/// Health status of the application's backends
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub schema_version: i64,
    pub directory_backend: DirectoryBackend,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.schema_version == connection::SCHEMA_VERSION
    }

    /// Get list of problems found
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if self.schema_version != connection::SCHEMA_VERSION {
            issues.push(format!(
                "Schema version {} does not match expected {}",
                self.schema_version,
                connection::SCHEMA_VERSION
            ));
        }

        issues
    }
}
