//! Group model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of weekday slots in a weekly auditor rotation
pub const WEEK_DAYS: u8 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Six ASCII digits
    pub invite_code: String,
    pub owner_id: String,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    /// Display order in member lists
    pub fn rank(self) -> u8 {
        match self {
            MemberRole::Owner => 0,
            MemberRole::Admin => 1,
            MemberRole::Member => 2,
        }
    }

    pub fn can_manage_members(self) -> bool {
        match self {
            MemberRole::Owner | MemberRole::Admin => true,
            MemberRole::Member => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Auditor responsible for one weekday slot of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAuditor {
    pub id: String,
    pub group_id: String,
    /// 1 = Monday ... 7 = Sunday
    pub week_day: u8,
    pub auditor_id: String,
    pub auditor_name: String,
    pub assigned_at: DateTime<Utc>,
}

impl WeeklyAuditor {
    pub fn day_name(&self) -> &'static str {
        match self.week_day {
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            6 => "Saturday",
            7 => "Sunday",
            _ => "Unknown",
        }
    }
}
