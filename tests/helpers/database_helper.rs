//! Test database helper utilities
//!
//! Every test database is a fresh SQLite file inside its own temporary
//! directory, removed when the helper is dropped.

use std::path::PathBuf;
use std::sync::Once;

use s5_audit::config::DatabaseConfig;
use s5_audit::database::{connection, DatabasePool, DatabaseService};
use s5_audit::Result;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub struct TestDatabase {
    pub pool: DatabasePool,
    pub service: DatabaseService,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated test database
    pub async fn new() -> Result<Self> {
        Self::new_with_migrations(true).await
    }

    pub async fn new_with_migrations(run_migrations: bool) -> Result<Self> {
        init_test_logging();

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("s5_audit_test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            ..DatabaseConfig::default()
        };

        let pool = connection::create_pool(&config).await?;
        if run_migrations {
            connection::run_migrations(&pool).await?;
        }

        Ok(Self {
            service: DatabaseService::new(pool.clone()),
            pool,
            path,
            _dir: dir,
        })
    }

    /// Count rows in a table
    pub async fn count_records(&self, table: &str) -> std::result::Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
