//! Database service layer
//!
//! High-level interface to the local record store. Repositories propagate
//! errors; this layer applies the store's failure policy: writes report
//! success as a `bool`, reads fall back to empty results, and the cause is
//! logged. Nothing is retried.

use std::time::Instant;

use tracing::{error, warn};

use crate::database::{DatabasePool, ProblemRepository, SolutionRepository, UserRepository};
use crate::models::*;
use crate::utils::errors::Result;
use crate::utils::logging::log_database_operation;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub problems: ProblemRepository,
    pub solutions: SolutionRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            problems: ProblemRepository::new(pool.clone()),
            solutions: SolutionRepository::new(pool),
        }
    }

    pub async fn insert_user(&self, user: &User) -> bool {
        let started = Instant::now();
        record_write("insert", "users", self.users.create(user).await, started)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Option<User> {
        or_log("get_user_by_id", self.users.find_by_id(id).await).flatten()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        or_log("get_user_by_email", self.users.find_by_email(email).await).flatten()
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        or_log("get_all_users", self.users.list_all().await).unwrap_or_default()
    }

    pub async fn insert_problem(&self, problem: &Problem) -> bool {
        if problem.group_id.is_empty() {
            warn!(problem_id = %problem.id, "Inserting problem without a group id");
        }
        let started = Instant::now();
        record_write("insert", "problems", self.problems.create(problem).await, started)
    }

    pub async fn get_problem_by_id(&self, id: &str) -> Option<Problem> {
        or_log("get_problem_by_id", self.problems.find_by_id(id).await).flatten()
    }

    /// Problems of every group for the date
    pub async fn get_problems_for_date(&self, audit_date: &str) -> Vec<Problem> {
        or_log("get_problems_for_date", self.problems.find_by_date(audit_date).await)
            .unwrap_or_default()
    }

    pub async fn get_problems_for_group_and_date(
        &self,
        group_id: &str,
        audit_date: &str,
    ) -> Vec<Problem> {
        or_log(
            "get_problems_for_group_and_date",
            self.problems.find_by_group_and_date(group_id, audit_date).await,
        )
        .unwrap_or_default()
    }

    /// Returns false when the update failed or no such problem exists
    pub async fn update_problem_status(&self, id: &str, status: ProblemStatus) -> bool {
        let started = Instant::now();
        match self.problems.update_status(id, status).await {
            Ok(updated) => {
                if !updated {
                    warn!(problem_id = id, "Status update matched no problem");
                }
                log_database_operation("update_status", "problems", elapsed_ms(started), updated);
                updated
            }
            Err(e) => {
                error!(problem_id = id, error = %e, "Failed to update problem status");
                log_database_operation("update_status", "problems", elapsed_ms(started), false);
                false
            }
        }
    }

    pub async fn insert_solution(&self, solution: &Solution) -> bool {
        let started = Instant::now();
        record_write("insert", "solutions", self.solutions.create(solution).await, started)
    }

    /// Newest first
    pub async fn get_solutions_for_problem(&self, problem_id: &str) -> Vec<Solution> {
        or_log(
            "get_solutions_for_problem",
            self.solutions.find_by_problem(problem_id).await,
        )
        .unwrap_or_default()
    }

    /// Statistics over every group for the date
    pub async fn get_stats_for_date(&self, audit_date: &str) -> DailyStats {
        self.stats(audit_date, None).await
    }

    pub async fn get_stats_for_group_and_date(
        &self,
        group_id: &str,
        audit_date: &str,
    ) -> DailyStats {
        self.stats(audit_date, Some(group_id)).await
    }

    async fn stats(&self, audit_date: &str, group_id: Option<&str>) -> DailyStats {
        match self.compute_stats(audit_date, group_id).await {
            Ok(stats) => stats,
            Err(e) => {
                error!(
                    audit_date = audit_date,
                    group_id = ?group_id,
                    error = %e,
                    "Failed to compute stats"
                );
                DailyStats::empty(audit_date, group_id)
            }
        }
    }

    async fn compute_stats(&self, audit_date: &str, group_id: Option<&str>) -> Result<DailyStats> {
        let counts = self.problems.count_by_status(audit_date, group_id).await?;
        let total = self.problems.count(audit_date, group_id).await?;
        Ok(DailyStats::from_counts(audit_date, group_id, counts, total))
    }

    /// Newest first
    pub async fn get_all_audit_dates(&self) -> Vec<String> {
        or_log("get_all_audit_dates", self.problems.audit_dates().await).unwrap_or_default()
    }

    pub async fn get_audit_dates_for_group(&self, group_id: &str) -> Vec<String> {
        or_log(
            "get_audit_dates_for_group",
            self.problems.audit_dates_for_group(group_id).await,
        )
        .unwrap_or_default()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn record_write(operation: &str, table: &str, result: Result<()>, started: Instant) -> bool {
    let success = match result {
        Ok(()) => true,
        Err(e) => {
            error!(operation = operation, table = table, error = %e, "Local store write failed");
            false
        }
    };
    log_database_operation(operation, table, elapsed_ms(started), success);
    success
}

fn or_log<T>(operation: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(operation = operation, error = %e, "Local store query failed");
            None
        }
    }
}
