//! Report generation
//!
//! Gathers the window's problems from the local record store, resolves
//! photos, lays the report out and writes the PDF.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{info, warn};

use super::layout::{
    build_layout, ImageSlot, LayoutOptions, ProblemEntry, ReportInput, ReportLayout,
};
use super::pdf::render_pdf;
use super::window::ReportWindow;
use crate::config::ReportConfig;
use crate::database::DatabaseService;
use crate::models::Problem;
use crate::utils::errors::{AuditError, Result};
use crate::utils::helpers::{format_audit_date, sanitize_filename};

pub const REPORT_FILE_PREFIX: &str = "5S_Rapor";

/// Which problems go into a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub window: ReportWindow,
    /// `None` reports across every group
    pub group_id: Option<String>,
    pub group_name: Option<String>,
}

impl ReportRequest {
    pub fn for_group(window: ReportWindow, group_id: &str, group_name: &str) -> Self {
        Self {
            window,
            group_id: Some(group_id.to_string()),
            group_name: Some(group_name.to_string()),
        }
    }

    pub fn all_groups(window: ReportWindow) -> Self {
        Self {
            window,
            group_id: None,
            group_name: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    database: DatabaseService,
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(database: DatabaseService, config: ReportConfig) -> Self {
        Self { database, config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Fetch, resolve photos and lay out without rendering
    pub async fn prepare(&self, request: &ReportRequest) -> Result<ReportLayout> {
        let problems = self.fetch_problems(request).await?;

        let mut entries = Vec::with_capacity(problems.len());
        for problem in problems {
            entries.push(self.entry_for(problem).await);
        }

        let input = ReportInput {
            window: request.window,
            group_id: request.group_id.clone(),
            group_name: request.group_name.clone(),
            generated_at: Utc::now(),
            entries,
        };
        Ok(build_layout(&input, LayoutOptions::from(&self.config)))
    }

    /// Generate the report and return the path of the written file
    pub async fn generate(&self, request: &ReportRequest) -> Result<PathBuf> {
        let layout = self.prepare(request).await?;

        fs::create_dir_all(&self.config.output_dir).await?;
        let path = self.config.output_dir.join(report_file_name(&request.window)?);

        let target = path.clone();
        tokio::task::spawn_blocking(move || render_pdf(&layout, &target))
            .await
            .map_err(|e| AuditError::Report(format!("Report rendering task failed: {}", e)))??;

        info!(
            path = %path.display(),
            window = %request.window.label(),
            group_id = request.group_id.as_deref(),
            "Report generated"
        );
        Ok(path)
    }

    /// Problems of every day in the window, concatenated oldest day first
    async fn fetch_problems(&self, request: &ReportRequest) -> Result<Vec<Problem>> {
        let mut problems = Vec::new();
        for date in request.window.dates()? {
            let audit_date = format_audit_date(date);
            let day = match &request.group_id {
                Some(group_id) => {
                    self.database
                        .get_problems_for_group_and_date(group_id, &audit_date)
                        .await
                }
                None => self.database.get_problems_for_date(&audit_date).await,
            };
            problems.extend(day);
        }
        Ok(problems)
    }

    async fn entry_for(&self, problem: Problem) -> ProblemEntry {
        let solutions = self.database.get_solutions_for_problem(&problem.id).await;
        let problem_photo = resolve_photo(Some(&problem.image_path)).await;
        let latest_photo = solutions.first().and_then(|latest| latest.image_path.as_deref());
        let solution_photo = match latest_photo {
            Some(path) => Some(resolve_photo(Some(path)).await),
            None => None,
        };

        ProblemEntry {
            problem,
            solutions,
            problem_photo,
            solution_photo,
        }
    }
}

/// `5S_Rapor_{date}_{timestampMillis}.pdf`
pub fn report_file_name(window: &ReportWindow) -> Result<String> {
    let date = format_audit_date(window.anchor_date()?);
    Ok(format!(
        "{}_{}_{}.pdf",
        REPORT_FILE_PREFIX,
        sanitize_filename(&date),
        Utc::now().timestamp_millis()
    ))
}

async fn resolve_photo(path: Option<&str>) -> ImageSlot {
    let Some(path) = path.filter(|path| !path.is_empty()) else {
        return ImageSlot::placeholder("No photo");
    };

    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => ImageSlot::Image(PathBuf::from(path)),
        Ok(_) | Err(_) => {
            warn!(path = path, "Report photo is missing");
            ImageSlot::placeholder("Photo unavailable")
        }
    }
}
