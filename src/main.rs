//! S5 Audit maintenance
//!
//! Runs migrations, sweeps expired photos and logs today's statistics.
//! `s5_audit report <day|week|month> [yyyy-MM-dd]` additionally writes a
//! cross-group report.

use anyhow::{bail, Context};
use chrono::{Datelike, Local};
use tracing::{info, warn};

use s5_audit::{
    config::Settings,
    report::{ReportRequest, ReportWindow},
    services::AppContext,
    utils::{
        helpers::{format_audit_date, format_bytes, parse_audit_date},
        logging,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate()?;
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", s5_audit::info());
    let context = AppContext::initialize(settings).await?;

    let health = context.health_check().await;
    for issue in health.get_issues() {
        warn!(issue = %issue, "Health check issue");
    }

    let deleted = context.photos.clean_old_photos().await;
    let photo_count = context.photos.get_total_photo_count().await;
    let photo_size = context.photos.get_total_photo_size().await;
    info!(
        deleted = deleted,
        remaining = photo_count,
        size = %format_bytes((photo_size * 1024.0 * 1024.0) as u64),
        "Photo storage checked"
    );

    let today = format_audit_date(Local::now().date_naive());
    let stats = context.database.get_stats_for_date(&today).await;
    info!(
        date = %stats.date,
        total = stats.total_problems,
        open = stats.open_problems,
        in_progress = stats.in_progress_problems,
        resolved = stats.resolved_problems,
        verified = stats.verified_problems,
        resolution_rate = stats.resolution_rate(),
        "Today's audit statistics"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(command) = args.first() {
        match command.as_str() {
            "report" => {
                let window = parse_window(
                    args.get(1).map(String::as_str),
                    args.get(2).map(String::as_str),
                )?;
                let path = context.reports.generate(&ReportRequest::all_groups(window)).await?;
                info!(path = %path.display(), "Report written");
            }
            other => bail!("Unknown command: {}", other),
        }
    }

    info!("Maintenance finished");
    Ok(())
}

fn parse_window(kind: Option<&str>, date: Option<&str>) -> anyhow::Result<ReportWindow> {
    let date = match date {
        Some(value) => parse_audit_date(value).with_context(|| format!("Invalid date: {}", value))?,
        None => Local::now().date_naive(),
    };

    Ok(match kind.unwrap_or("day") {
        "day" => ReportWindow::Day(date),
        "week" => ReportWindow::Week(date),
        "month" => ReportWindow::Month {
            year: date.year(),
            month: date.month(),
        },
        other => bail!("Unknown report window: {}", other),
    })
}
