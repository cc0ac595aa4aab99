//! Problem repository implementation

use sqlx::SqlitePool;

use crate::models::problem::{Problem, ProblemStatus};
use crate::utils::errors::AuditError;

const PROBLEM_COLUMNS: &str = "id, group_id, description, location, priority, status, \
     auditor_id, auditor_name, image_path, created_at, audit_date";

#[derive(Clone, Debug)]
pub struct ProblemRepository {
    pool: SqlitePool,
}

impl ProblemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a problem row
    pub async fn create(&self, problem: &Problem) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO problems (id, group_id, auditor_id, auditor_name, description, location,
                                  image_path, priority, status, created_at, audit_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&problem.id)
        .bind(&problem.group_id)
        .bind(&problem.auditor_id)
        .bind(&problem.auditor_name)
        .bind(&problem.description)
        .bind(&problem.location)
        .bind(&problem.image_path)
        .bind(problem.priority)
        .bind(problem.status)
        .bind(problem.created_at)
        .bind(&problem.audit_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find problem by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Problem>, AuditError> {
        let problem = sqlx::query_as::<_, Problem>(&format!(
            "SELECT {} FROM problems WHERE id = ?1",
            PROBLEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(problem)
    }

    /// Problems of every group for an audit date, newest first
    pub async fn find_by_date(&self, audit_date: &str) -> Result<Vec<Problem>, AuditError> {
        let problems = sqlx::query_as::<_, Problem>(&format!(
            "SELECT {} FROM problems WHERE audit_date = ?1 ORDER BY created_at DESC",
            PROBLEM_COLUMNS
        ))
        .bind(audit_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(problems)
    }

    /// Problems of one group for an audit date, newest first
    pub async fn find_by_group_and_date(
        &self,
        group_id: &str,
        audit_date: &str,
    ) -> Result<Vec<Problem>, AuditError> {
        let problems = sqlx::query_as::<_, Problem>(&format!(
            "SELECT {} FROM problems \
             WHERE group_id = ?1 AND audit_date = ?2 ORDER BY created_at DESC",
            PROBLEM_COLUMNS
        ))
        .bind(group_id)
        .bind(audit_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(problems)
    }

    /// Set a problem's status. Returns whether a row was updated.
    pub async fn update_status(&self, id: &str, status: ProblemStatus) -> Result<bool, AuditError> {
        let result = sqlx::query("UPDATE problems SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Per-status counts for a date, optionally limited to one group
    pub async fn count_by_status(
        &self,
        audit_date: &str,
        group_id: Option<&str>,
    ) -> Result<Vec<(ProblemStatus, i64)>, AuditError> {
        let counts = sqlx::query_as::<_, (ProblemStatus, i64)>(
            r#"
            SELECT status, COUNT(*) FROM problems
            WHERE audit_date = ?1 AND (?2 IS NULL OR group_id = ?2)
            GROUP BY status
            "#,
        )
        .bind(audit_date)
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Total problems for a date, optionally limited to one group
    pub async fn count(&self, audit_date: &str, group_id: Option<&str>) -> Result<i64, AuditError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM problems WHERE audit_date = ?1 AND (?2 IS NULL OR group_id = ?2)",
        )
        .bind(audit_date)
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Every audit date with at least one problem, newest first
    pub async fn audit_dates(&self) -> Result<Vec<String>, AuditError> {
        let dates: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT audit_date FROM problems ORDER BY audit_date DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(dates.into_iter().map(|(date,)| date).collect())
    }

    /// Audit dates with at least one problem in the group, newest first
    pub async fn audit_dates_for_group(&self, group_id: &str) -> Result<Vec<String>, AuditError> {
        let dates: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT audit_date FROM problems WHERE group_id = ?1 ORDER BY audit_date DESC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dates.into_iter().map(|(date,)| date).collect())
    }
}
