//! S5 Audit
//!
//! Factory floor 5S audit tracking. Auditors log problems with photos, team
//! members propose solutions, and groups coordinate through weekly auditor
//! rotations and chat. Problems and solutions live in a local SQLite store;
//! groups, memberships and chat live in a remote document store behind a
//! federated sign-in.

pub mod config;
pub mod database;
pub mod directory;
pub mod models;
pub mod report;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AuditError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use directory::DirectoryService;
pub use report::{ReportGenerator, ReportRequest, ReportWindow};
pub use services::{AppContext, AuditService, PhotoStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
