//! Solution model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Minimum description length, counted in characters after trimming
pub const MIN_SOLUTION_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Solution {
    pub id: String,
    pub group_id: String,
    pub problem_id: String,
    pub user_id: String,
    pub user_name: String,
    pub description: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_verified: bool,
}

/// Input of the add-solution flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSolution {
    pub group_id: String,
    pub problem_id: String,
    pub description: String,
}
