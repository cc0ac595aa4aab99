//! Database connection management and schema versioning

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::DatabaseConfig;
use crate::utils::errors::Result;

pub type DatabasePool = Pool<Sqlite>;

/// Schema version written to `PRAGMA user_version` after migrating
pub const SCHEMA_VERSION: i64 = 2;

/// First schema version with `group_id` on problems and solutions
pub const GROUP_SCOPING_VERSION: i64 = 2;

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1").execute(&pool).await?;

    tracing::info!(url = %config.url, "Database connection pool created successfully");
    Ok(pool)
}

/// Read `PRAGMA user_version`
pub async fn schema_version(pool: &DatabasePool) -> Result<i64> {
    let version: (i64,) = sqlx::query_as("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    Ok(version.0)
}

async fn set_schema_version(pool: &DatabasePool, version: i64) -> Result<()> {
    // PRAGMA arguments cannot be bound.
    sqlx::query(&format!("PRAGMA user_version = {}", version))
        .execute(pool)
        .await?;

    Ok(())
}

/// Bring the schema up to [`SCHEMA_VERSION`]
pub async fn run_migrations(pool: &DatabasePool) -> Result<()> {
    let version = schema_version(pool).await?;
    tracing::info!(from = version, to = SCHEMA_VERSION, "Running database migrations...");

    if version < 1 {
        create_base_schema(pool).await?;
    }

    if version < GROUP_SCOPING_VERSION {
        migrate_group_scoping(pool).await?;
    }

    if version < SCHEMA_VERSION {
        set_schema_version(pool, SCHEMA_VERSION).await?;
    }

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Version 1 tables, before records were scoped to groups
async fn create_base_schema(pool: &DatabasePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            department TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS problems (
            id TEXT PRIMARY KEY,
            auditor_id TEXT NOT NULL,
            auditor_name TEXT NOT NULL,
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            image_path TEXT NOT NULL,
            priority TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            audit_date TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS solutions (
            id TEXT PRIMARY KEY,
            problem_id TEXT NOT NULL REFERENCES problems(id),
            user_id TEXT NOT NULL,
            user_name TEXT NOT NULL,
            description TEXT NOT NULL,
            image_path TEXT,
            created_at TEXT NOT NULL,
            is_verified INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_problems_audit_date ON problems(audit_date)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_solutions_problem ON solutions(problem_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Add `group_id` to problems and solutions.
///
/// Safe to run on an already migrated database: each column is only added
/// when `pragma_table_info` does not list it.
pub async fn migrate_group_scoping(pool: &DatabasePool) -> Result<()> {
    for table in ["problems", "solutions"] {
        if add_column_if_missing(pool, table, "group_id", "TEXT NOT NULL DEFAULT ''").await? {
            tracing::info!(table = table, "Added group_id column");
        } else {
            tracing::debug!(table = table, "group_id column already present");
        }
    }

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_problems_group_date ON problems(group_id, audit_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns whether the column was added
async fn add_column_if_missing(
    pool: &DatabasePool,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<bool> {
    if column_exists(pool, table, column).await? {
        return Ok(false);
    }

    sqlx::query(&format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table, column, definition
    ))
    .execute(pool)
    .await?;

    Ok(true)
}

/// Check whether `table` has a column named `column`
pub async fn column_exists(pool: &DatabasePool, table: &str, column: &str) -> Result<bool> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count.0 > 0)
}

/// Check database health
pub async fn health_check(pool: &DatabasePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}
