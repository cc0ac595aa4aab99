//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod chat;
pub mod group;
pub mod problem;
pub mod solution;
pub mod stats;
pub mod user;

// Re-export commonly used models
pub use chat::{ChatMessage, MessageType};
pub use group::{Group, GroupMember, MemberRole, WeeklyAuditor, WEEK_DAYS};
pub use problem::{NewProblem, Problem, ProblemPriority, ProblemStatus};
pub use solution::{NewSolution, Solution, MIN_SOLUTION_DESCRIPTION_CHARS};
pub use stats::DailyStats;
pub use user::{AppUser, CreateUserRequest, User, UserRole};
