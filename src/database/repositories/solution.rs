//! Solution repository implementation

use sqlx::SqlitePool;

use crate::models::solution::Solution;
use crate::utils::errors::AuditError;

#[derive(Clone, Debug)]
pub struct SolutionRepository {
    pool: SqlitePool,
}

impl SolutionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a solution row
    pub async fn create(&self, solution: &Solution) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO solutions (id, group_id, problem_id, user_id, user_name, description,
                                   image_path, created_at, is_verified)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&solution.id)
        .bind(&solution.group_id)
        .bind(&solution.problem_id)
        .bind(&solution.user_id)
        .bind(&solution.user_name)
        .bind(&solution.description)
        .bind(&solution.image_path)
        .bind(solution.created_at)
        .bind(solution.is_verified)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Solutions proposed for a problem, newest first
    pub async fn find_by_problem(&self, problem_id: &str) -> Result<Vec<Solution>, AuditError> {
        let solutions = sqlx::query_as::<_, Solution>(
            r#"
            SELECT id, group_id, problem_id, user_id, user_name, description, image_path,
                   created_at, is_verified
            FROM solutions
            WHERE problem_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(solutions)
    }
}
