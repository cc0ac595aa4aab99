//! Audit flows
//!
//! Problem and solution workflows on top of the local record store and the
//! photo store. Input is validated before any file or database write, and a
//! saved photo is removed again when the owning record cannot be inserted.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::database::DatabaseService;
use crate::models::*;
use crate::services::photo::PhotoStore;
use crate::utils::errors::{AuditError, Result};
use crate::utils::helpers::{audit_date_for, generate_id, is_valid_email, normalize_whitespace};
use crate::utils::logging::log_problem_event;

#[derive(Debug, Clone)]
pub struct AuditService {
    database: DatabaseService,
    photos: PhotoStore,
}

impl AuditService {
    pub fn new(database: DatabaseService, photos: PhotoStore) -> Self {
        Self { database, photos }
    }

    pub fn database(&self) -> &DatabaseService {
        &self.database
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    /// Create a local user record
    pub async fn register_user(&self, request: CreateUserRequest) -> Result<User> {
        let name = normalize_whitespace(&request.name);
        if name.is_empty() {
            return Err(AuditError::Validation("Name is required".to_string()));
        }
        if !is_valid_email(&request.email) {
            return Err(AuditError::Validation(format!("Invalid email address: {}", request.email)));
        }

        let user = User::from_request(
            generate_id(),
            CreateUserRequest { name, ..request },
            Utc::now(),
        );
        if !self.database.insert_user(&user).await {
            return Err(AuditError::Storage("Could not save the user".to_string()));
        }

        info!(user_id = %user.id, role = ?user.role, "User registered");
        Ok(user)
    }

    /// Return the user with this email, registering them first if needed
    pub async fn ensure_user(&self, request: CreateUserRequest) -> Result<User> {
        if let Some(existing) = self.database.get_user_by_email(&request.email).await {
            debug!(user_id = %existing.id, "User already registered");
            return Ok(existing);
        }
        self.register_user(request).await
    }

    /// Log a new problem with its photo
    pub async fn report_problem(
        &self,
        actor: &User,
        request: NewProblem,
        photo_source: Option<&Path>,
    ) -> Result<Problem> {
        let description = request.description.trim();
        let location = request.location.trim();
        if description.is_empty() {
            return Err(AuditError::Validation("Problem description is required".to_string()));
        }
        if location.is_empty() {
            return Err(AuditError::Validation("Problem location is required".to_string()));
        }
        let photo_source = photo_source
            .ok_or_else(|| AuditError::Validation("A problem photo is required".to_string()))?;
        if !actor.role.can_report_problems() {
            return Err(AuditError::PermissionDenied(
                "Only auditors can report problems".to_string(),
            ));
        }
        if request.group_id.is_empty() {
            warn!(actor_id = %actor.id, "Problem reported outside of any group");
        }

        let photo = self
            .photos
            .save_problem_photo(photo_source, &actor.id)
            .await
            .ok_or_else(|| AuditError::Photo("Could not save the problem photo".to_string()))?;

        let created_at = Utc::now();
        let problem = Problem {
            id: generate_id(),
            group_id: request.group_id,
            description: description.to_string(),
            location: location.to_string(),
            priority: request.priority,
            status: ProblemStatus::Open,
            auditor_id: actor.id.clone(),
            auditor_name: actor.name.clone(),
            image_path: photo.to_string_lossy().into_owned(),
            created_at,
            audit_date: audit_date_for(created_at),
        };

        if !self.database.insert_problem(&problem).await {
            self.discard_photo(&photo).await;
            return Err(AuditError::Storage("Could not save the problem".to_string()));
        }

        log_problem_event(&problem.id, "reported", &actor.id, Some(problem.priority.label()));
        Ok(problem)
    }

    /// Propose a fix for a problem, optionally with a photo
    pub async fn propose_solution(
        &self,
        actor: &User,
        request: NewSolution,
        photo_source: Option<&Path>,
    ) -> Result<Solution> {
        let description = request.description.trim();
        if description.chars().count() < MIN_SOLUTION_DESCRIPTION_CHARS {
            return Err(AuditError::Validation(format!(
                "Solution description must be at least {} characters",
                MIN_SOLUTION_DESCRIPTION_CHARS
            )));
        }

        let photo = match photo_source {
            Some(source) => Some(
                self.photos
                    .save_solution_photo(source, &actor.id)
                    .await
                    .ok_or_else(|| {
                        AuditError::Photo("Could not save the solution photo".to_string())
                    })?,
            ),
            None => None,
        };

        let solution = Solution {
            id: generate_id(),
            group_id: request.group_id,
            problem_id: request.problem_id,
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            description: description.to_string(),
            image_path: photo.as_ref().map(|path| path.to_string_lossy().into_owned()),
            created_at: Utc::now(),
            is_verified: false,
        };

        if !self.database.insert_solution(&solution).await {
            if let Some(photo) = &photo {
                self.discard_photo(photo).await;
            }
            return Err(AuditError::Storage("Could not save the solution".to_string()));
        }

        log_problem_event(&solution.problem_id, "solution_proposed", &actor.id, None);
        Ok(solution)
    }

    /// Set any status, provided `actor_id` is the problem's auditor
    pub async fn change_problem_status(
        &self,
        actor_id: &str,
        problem_id: &str,
        status: ProblemStatus,
    ) -> Result<Problem> {
        let mut problem = self
            .database
            .get_problem_by_id(problem_id)
            .await
            .ok_or_else(|| AuditError::ProblemNotFound {
                problem_id: problem_id.to_string(),
            })?;

        if problem.auditor_id != actor_id {
            return Err(AuditError::PermissionDenied(
                "Only the problem's auditor can change its status".to_string(),
            ));
        }

        if !self.database.update_problem_status(problem_id, status).await {
            return Err(AuditError::Storage("Could not update the problem status".to_string()));
        }

        let previous = problem.status;
        problem.status = status;
        log_problem_event(
            problem_id,
            "status_changed",
            actor_id,
            Some(&format!("{} -> {}", previous.as_str(), status.as_str())),
        );
        Ok(problem)
    }

    pub async fn problems_for_group(&self, group_id: &str, audit_date: &str) -> Vec<Problem> {
        self.database.get_problems_for_group_and_date(group_id, audit_date).await
    }

    pub async fn stats_for_group(&self, group_id: &str, audit_date: &str) -> DailyStats {
        self.database.get_stats_for_group_and_date(group_id, audit_date).await
    }

    pub async fn solutions_for_problem(&self, problem_id: &str) -> Vec<Solution> {
        self.database.get_solutions_for_problem(problem_id).await
    }

    async fn discard_photo(&self, photo: &Path) {
        if !self.photos.delete_photo(photo).await {
            warn!(path = %photo.display(), "Failed to roll back saved photo");
        }
    }
}
