//! User repository implementation

use sqlx::SqlitePool;

use crate::models::user::User;
use crate::utils::errors::AuditError;

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user row
    pub async fn create(&self, user: &User) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, department, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.department)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuditError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, department, role, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuditError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, department, role, created_at \
             FROM users WHERE email = ?1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// List all users, oldest first
    pub async fn list_all(&self) -> Result<Vec<User>, AuditError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, department, role, created_at \
             FROM users ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, AuditError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
