//! Database module
//!
//! This module handles the local SQLite record store

pub mod connection;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, run_migrations, DatabasePool};
pub use repositories::{ProblemRepository, SolutionRepository, UserRepository};
pub use service::DatabaseService;
