//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod problem;
pub mod solution;
pub mod user;

// Re-export repositories
pub use problem::ProblemRepository;
pub use solution::SolutionRepository;
pub use user::UserRepository;
