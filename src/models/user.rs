//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of a local user on the factory floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Auditor,
    User,
}

impl UserRole {
    pub fn can_report_problems(self) -> bool {
        match self {
            UserRole::Auditor => true,
            UserRole::User => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: UserRole,
}

impl User {
    pub fn from_request(id: String, request: CreateUserRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: request.name,
            email: request.email,
            department: request.department,
            role: request.role,
            created_at,
        }
    }
}

/// Signed-in account profile, stored in the remote `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
