//! Problem model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl ProblemPriority {
    pub fn label(self) -> &'static str {
        match self {
            ProblemPriority::Low => "Low",
            ProblemPriority::Medium => "Medium",
            ProblemPriority::High => "High",
            ProblemPriority::Critical => "Critical",
        }
    }
}

/// Problem status.
///
/// Any status may be set from any other status; there is no enforced order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemStatus {
    Open,
    InProgress,
    Resolved,
    Verified,
}

impl ProblemStatus {
    pub const ALL: [ProblemStatus; 4] = [
        ProblemStatus::Open,
        ProblemStatus::InProgress,
        ProblemStatus::Resolved,
        ProblemStatus::Verified,
    ];

    /// Column value as persisted in the `problems.status` column
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemStatus::Open => "OPEN",
            ProblemStatus::InProgress => "IN_PROGRESS",
            ProblemStatus::Resolved => "RESOLVED",
            ProblemStatus::Verified => "VERIFIED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            ProblemStatus::Open => "Open",
            ProblemStatus::InProgress => "In progress",
            ProblemStatus::Resolved => "Resolved",
            ProblemStatus::Verified => "Verified",
        }
    }

    /// Counts toward the resolution rate
    pub fn is_resolved(self) -> bool {
        match self {
            ProblemStatus::Resolved | ProblemStatus::Verified => true,
            ProblemStatus::Open | ProblemStatus::InProgress => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Problem {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub location: String,
    pub priority: ProblemPriority,
    pub status: ProblemStatus,
    pub auditor_id: String,
    pub auditor_name: String,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    /// `yyyy-MM-dd`, fixed at creation
    pub audit_date: String,
}

/// Input of the add-problem flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProblem {
    pub group_id: String,
    pub description: String,
    pub location: String,
    pub priority: ProblemPriority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_matches_column_values() {
        for status in ProblemStatus::ALL {
            assert_eq!(ProblemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProblemStatus::parse("open"), None);
    }

    #[test]
    fn test_status_serializes_like_the_column() {
        let json = serde_json::to_string(&ProblemStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
