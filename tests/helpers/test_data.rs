//! Test data helpers for creating users, problems, solutions and photos

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use printpdf::image_crate::{ImageFormat, Rgb, RgbImage};
use s5_audit::models::*;
use s5_audit::utils::helpers::{audit_date_for, generate_id};

pub const GROUP_ID: &str = "group-assembly";
pub const OTHER_GROUP_ID: &str = "group-paint";

pub fn create_test_user(id: &str, name: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@plant.example", id),
        department: "Assembly".to_string(),
        role,
        created_at: Utc::now(),
    }
}

pub fn auditor() -> User {
    create_test_user("auditor-1", "Ayşe Demir", UserRole::Auditor)
}

pub fn operator() -> User {
    create_test_user("operator-1", "Mehmet Kaya", UserRole::User)
}

pub fn user_request(name: &str, email: &str, role: UserRole) -> CreateUserRequest {
    CreateUserRequest {
        name: name.to_string(),
        email: email.to_string(),
        department: "Maintenance".to_string(),
        role,
    }
}

/// A problem created `minutes_ago` before now, on today's audit date
pub fn create_test_problem(group_id: &str, status: ProblemStatus, minutes_ago: i64) -> Problem {
    let created_at = Utc::now() - Duration::minutes(minutes_ago);
    create_test_problem_at(group_id, status, created_at)
}

pub fn create_test_problem_at(
    group_id: &str,
    status: ProblemStatus,
    created_at: DateTime<Utc>,
) -> Problem {
    let auditor = auditor();
    Problem {
        id: generate_id(),
        group_id: group_id.to_string(),
        description: "Oil leak under press 4".to_string(),
        location: "Press shop".to_string(),
        priority: ProblemPriority::High,
        status,
        auditor_id: auditor.id,
        auditor_name: auditor.name,
        image_path: String::new(),
        created_at,
        audit_date: audit_date_for(created_at),
    }
}

pub fn create_test_solution(problem: &Problem, description: &str, minutes_ago: i64) -> Solution {
    Solution {
        id: generate_id(),
        group_id: problem.group_id.clone(),
        problem_id: problem.id.clone(),
        user_id: "operator-1".to_string(),
        user_name: "Mehmet Kaya".to_string(),
        description: description.to_string(),
        image_path: None,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
        is_verified: false,
    }
}

pub fn new_problem(group_id: &str) -> NewProblem {
    NewProblem {
        group_id: group_id.to_string(),
        description: "Pallets blocking the emergency exit".to_string(),
        location: "Warehouse gate B".to_string(),
        priority: ProblemPriority::Critical,
    }
}

/// Write a small PNG picture and return its path
pub fn write_test_photo(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let image = RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 120]));
    image
        .save_with_format(&path, ImageFormat::Png)
        .expect("Failed to write test photo");
    path
}
