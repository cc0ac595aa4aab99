//! Report generation against a populated local store

mod helpers;

use chrono::{Duration, Local, NaiveDate};
use helpers::*;
use s5_audit::config::ReportConfig;
use s5_audit::models::*;
use s5_audit::report::layout::{ProblemBlock, MARGIN_MM, PAGE_HEIGHT_MM};
use s5_audit::report::{
    Block, ImageSlot, ReportGenerator, ReportLayout, ReportRequest, ReportWindow,
    REPORT_FILE_PREFIX,
};
use tempfile::TempDir;

struct ReportFixture {
    db: TestDatabase,
    generator: ReportGenerator,
    dir: TempDir,
}

impl ReportFixture {
    async fn new() -> Self {
        let db = TestDatabase::new().await.expect("Failed to create test database");
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            output_dir: dir.path().join("reports"),
            ..ReportConfig::default()
        };
        let generator = ReportGenerator::new(db.service.clone(), config);
        Self { db, generator, dir }
    }

    async fn insert(&self, problem: &Problem) {
        assert!(self.db.service.insert_problem(problem).await);
    }
}

fn on_date(mut problem: Problem, date: NaiveDate) -> Problem {
    problem.audit_date = date.format("%Y-%m-%d").to_string();
    problem
}

fn problem_blocks(layout: &ReportLayout) -> Vec<ProblemBlock> {
    layout
        .blocks()
        .filter_map(|block| match block {
            Block::Problem(problem) => Some(problem.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_generate_writes_pdf_and_returns_path() {
    let fx = ReportFixture::new().await;
    let today = Local::now().date_naive();

    let mut problem = on_date(create_test_problem(GROUP_ID, ProblemStatus::Open, 0), today);
    let problem_photo = write_test_photo(fx.dir.path(), "problem.png");
    problem.image_path = problem_photo.to_string_lossy().into_owned();
    fx.insert(&problem).await;

    let mut solution = create_test_solution(&problem, "Fix the hydraulic hose clamp", 0);
    let solution_photo = write_test_photo(fx.dir.path(), "solution.png");
    solution.image_path = Some(solution_photo.to_string_lossy().into_owned());
    assert!(fx.db.service.insert_solution(&solution).await);

    let request = ReportRequest::for_group(ReportWindow::Day(today), GROUP_ID, "Assembly");
    let path = fx.generator.generate(&request).await.expect("Report generation failed");

    assert!(path.starts_with(fx.generator.output_dir()));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(&format!("{}_{}_", REPORT_FILE_PREFIX, today.format("%Y-%m-%d"))));
    assert!(name.ends_with(".pdf"));

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_missing_photos_become_placeholders() {
    let fx = ReportFixture::new().await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let mut problem = on_date(create_test_problem(GROUP_ID, ProblemStatus::Open, 0), date);
    problem.image_path = fx.dir.path().join("deleted.jpg").to_string_lossy().into_owned();
    fx.insert(&problem).await;

    let request = ReportRequest::for_group(ReportWindow::Day(date), GROUP_ID, "Assembly");
    let layout = fx.generator.prepare(&request).await.unwrap();
    let blocks = problem_blocks(&layout);
    assert_eq!(blocks.len(), 1);
    assert!(matches!(blocks[0].problem_photo, ImageSlot::Placeholder(_)));
    assert!(blocks[0].solution_photo.is_none());

    // Still renders
    let path = fx.generator.generate(&request).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_undecodable_photo_still_renders() {
    let fx = ReportFixture::new().await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let garbage = fx.dir.path().join("garbage.jpg");
    std::fs::write(&garbage, b"definitely not an image").unwrap();
    let mut problem = on_date(create_test_problem(GROUP_ID, ProblemStatus::Open, 0), date);
    problem.image_path = garbage.to_string_lossy().into_owned();
    fx.insert(&problem).await;

    let request = ReportRequest::for_group(ReportWindow::Day(date), GROUP_ID, "Assembly");
    let path = fx.generator.generate(&request).await.unwrap();
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_week_window_collects_seven_days_for_the_group() {
    let fx = ReportFixture::new().await;
    let end = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();

    for days_back in [0, 3, 6, 7] {
        let problem = on_date(
            create_test_problem(GROUP_ID, ProblemStatus::Resolved, 0),
            end - Duration::days(days_back),
        );
        fx.insert(&problem).await;
    }
    fx.insert(&on_date(create_test_problem(OTHER_GROUP_ID, ProblemStatus::Open, 0), end))
        .await;

    let scoped = fx
        .generator
        .prepare(&ReportRequest::for_group(ReportWindow::Week(end), GROUP_ID, "Assembly"))
        .await
        .unwrap();
    assert_eq!(scoped.stats.total_problems, 3);
    assert_eq!(scoped.stats.resolution_rate(), 100.0);

    let everyone = fx
        .generator
        .prepare(&ReportRequest::all_groups(ReportWindow::Week(end)))
        .await
        .unwrap();
    assert_eq!(everyone.stats.total_problems, 4);
    assert_eq!(everyone.stats.open_problems, 1);
}

#[tokio::test]
async fn test_month_window_and_solution_overflow() {
    let fx = ReportFixture::new().await;
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let problem = on_date(create_test_problem(GROUP_ID, ProblemStatus::InProgress, 0), date);
    fx.insert(&problem).await;

    for (minutes_ago, text) in [
        (30, "Sweep the area at every shift change"),
        (20, "Mark walkways with yellow floor tape"),
        (10, "Install a shadow board for the hand tools"),
    ] {
        assert!(fx
            .db
            .service
            .insert_solution(&create_test_solution(&problem, text, minutes_ago))
            .await);
    }

    let layout = fx
        .generator
        .prepare(&ReportRequest::for_group(
            ReportWindow::Month { year: 2024, month: 2 },
            GROUP_ID,
            "Assembly",
        ))
        .await
        .unwrap();

    let blocks = problem_blocks(&layout);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].solutions.len(), 2);
    assert!(blocks[0].solutions[0].contains("shadow board"));
    assert_eq!(blocks[0].more_label().as_deref(), Some("+ 1 more"));
}

#[tokio::test]
async fn test_empty_window_produces_single_page_report() {
    let fx = ReportFixture::new().await;
    let day = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let request = ReportRequest::all_groups(ReportWindow::Day(day));

    let layout = fx.generator.prepare(&request).await.unwrap();
    assert_eq!(layout.page_count(), 1);
    assert_eq!(layout.stats.total_problems, 0);

    let first = fx.generator.generate(&request).await.unwrap();
    // Distinct names even when generated back to back
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let second = fx.generator.generate(&request).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_long_description_stays_within_the_page() {
    let fx = ReportFixture::new().await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut problem = on_date(create_test_problem(GROUP_ID, ProblemStatus::Open, 0), date);
    problem.description = "word ".repeat(1200);
    fx.insert(&problem).await;

    let request = ReportRequest::for_group(ReportWindow::Day(date), GROUP_ID, "Assembly");
    let layout = fx.generator.prepare(&request).await.unwrap();
    for page in &layout.pages {
        for placed in &page.blocks {
            assert!(placed.top_mm + placed.block.height() <= PAGE_HEIGHT_MM - MARGIN_MM);
        }
    }
    let blocks = problem_blocks(&layout);
    assert!(blocks[0].lines.last().unwrap().ends_with("..."));

    let path = fx.generator.generate(&request).await.unwrap();
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
}
