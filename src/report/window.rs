//! Report time windows

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::errors::{AuditError, Result};
use crate::utils::helpers::format_audit_date;

const WEEK_LENGTH_DAYS: i64 = 7;

/// Which audit dates a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportWindow {
    Day(NaiveDate),
    /// Seven days ending on and including the given date
    Week(NaiveDate),
    Month { year: i32, month: u32 },
}

impl ReportWindow {
    /// Every date in the window, oldest first
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        match *self {
            ReportWindow::Day(date) => Ok(vec![date]),
            ReportWindow::Week(end) => Ok((0..WEEK_LENGTH_DAYS)
                .rev()
                .map(|offset| end - Duration::days(offset))
                .collect()),
            ReportWindow::Month { year, month } => {
                let first = first_of_month(year, month)?;
                Ok(first
                    .iter_days()
                    .take_while(|date| date.month() == month)
                    .collect())
            }
        }
    }

    /// Date used in the report file name
    pub fn anchor_date(&self) -> Result<NaiveDate> {
        match *self {
            ReportWindow::Day(date) | ReportWindow::Week(date) => Ok(date),
            ReportWindow::Month { year, month } => first_of_month(year, month),
        }
    }

    pub fn label(&self) -> String {
        match *self {
            ReportWindow::Day(date) => format!("Daily report {}", format_audit_date(date)),
            ReportWindow::Week(end) => format!(
                "Weekly report {} to {}",
                format_audit_date(end - Duration::days(WEEK_LENGTH_DAYS - 1)),
                format_audit_date(end)
            ),
            ReportWindow::Month { year, month } => {
                format!("Monthly report {:04}-{:02}", year, month)
            }
        }
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        AuditError::Validation(format!("Invalid report month {:04}-{:02}", year, month))
    })
}
