//! Computed audit statistics

use serde::{Deserialize, Serialize};

use super::problem::{Problem, ProblemStatus};

/// Per-status problem counts for one audit date, optionally scoped to a group.
///
/// Computed on demand, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub group_id: Option<String>,
    pub total_problems: i64,
    pub open_problems: i64,
    pub in_progress_problems: i64,
    pub resolved_problems: i64,
    pub verified_problems: i64,
}

impl DailyStats {
    pub fn empty(date: &str, group_id: Option<&str>) -> Self {
        Self {
            date: date.to_string(),
            group_id: group_id.map(str::to_string),
            ..Default::default()
        }
    }

    /// Build from `(status, count)` pairs and a separately counted total
    pub fn from_counts<I>(date: &str, group_id: Option<&str>, counts: I, total: i64) -> Self
    where
        I: IntoIterator<Item = (ProblemStatus, i64)>,
    {
        let mut stats = Self::empty(date, group_id);
        stats.total_problems = total;
        for (status, count) in counts {
            stats.add(status, count);
        }
        stats
    }

    /// Aggregate an already fetched problem list
    pub fn from_problems(date: &str, group_id: Option<&str>, problems: &[Problem]) -> Self {
        let mut stats = Self::empty(date, group_id);
        for problem in problems {
            stats.add(problem.status, 1);
            stats.total_problems += 1;
        }
        stats
    }

    fn add(&mut self, status: ProblemStatus, count: i64) {
        match status {
            ProblemStatus::Open => self.open_problems += count,
            ProblemStatus::InProgress => self.in_progress_problems += count,
            ProblemStatus::Resolved => self.resolved_problems += count,
            ProblemStatus::Verified => self.verified_problems += count,
        }
    }

    pub fn count_for(&self, status: ProblemStatus) -> i64 {
        match status {
            ProblemStatus::Open => self.open_problems,
            ProblemStatus::InProgress => self.in_progress_problems,
            ProblemStatus::Resolved => self.resolved_problems,
            ProblemStatus::Verified => self.verified_problems,
        }
    }

    pub fn resolved_total(&self) -> i64 {
        self.resolved_problems + self.verified_problems
    }

    /// Percentage of problems resolved or verified, 0 when there are none
    pub fn resolution_rate(&self) -> f64 {
        if self.total_problems == 0 {
            0.0
        } else {
            self.resolved_total() as f64 / self.total_problems as f64 * 100.0
        }
    }
}
