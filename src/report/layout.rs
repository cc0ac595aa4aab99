//! Report layout
//!
//! Turns fetched problems into positioned blocks on A4 pages. Nothing here
//! touches the PDF library, so pagination can be checked without rendering.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::window::ReportWindow;
use crate::config::ReportConfig;
use crate::models::{DailyStats, Problem, Solution};
use crate::utils::helpers::{format_timestamp, truncate_text};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 15.0;
pub const LINE_HEIGHT_MM: f32 = 5.5;
pub const IMAGE_HEIGHT_MM: f32 = 55.0;
pub const IMAGE_WIDTH_MM: f32 = 80.0;

const HEADER_HEIGHT_MM: f32 = 32.0;
const STATS_HEIGHT_MM: f32 = 30.0;
const SECTION_GAP_MM: f32 = 8.0;
const EMPTY_NOTICE_HEIGHT_MM: f32 = 12.0;

/// Characters per wrapped body line at the body font size
const WRAP_WIDTH_CHARS: usize = 95;

/// Heading, three metadata lines and the "Solutions" title
const PROBLEM_FIXED_LINES: usize = 5;

pub const REPORT_TITLE: &str = "5S Audit Report";

/// A photo to embed, or the text printed in its place
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSlot {
    Image(PathBuf),
    Placeholder(String),
}

impl ImageSlot {
    pub fn placeholder(reason: &str) -> Self {
        ImageSlot::Placeholder(format!("[{}]", reason))
    }
}

/// One problem and what the report shows alongside it
#[derive(Debug, Clone)]
pub struct ProblemEntry {
    pub problem: Problem,
    /// Newest first
    pub solutions: Vec<Solution>,
    pub problem_photo: ImageSlot,
    /// Photo of the most recent solution, when that solution has one
    pub solution_photo: Option<ImageSlot>,
}

#[derive(Debug, Clone)]
pub struct ReportInput {
    pub window: ReportWindow,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ProblemEntry>,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub solution_char_budget: usize,
    pub solutions_per_problem: usize,
}

impl From<&ReportConfig> for LayoutOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            solution_char_budget: config.solution_char_budget,
            solutions_per_problem: config.solutions_per_problem,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub title: String,
    pub window_label: String,
    pub group_name: Option<String>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsBlock {
    pub total: i64,
    pub open: i64,
    pub resolved: i64,
    pub success_rate: f64,
}

impl StatsBlock {
    pub fn rows(&self) -> [(&'static str, String); 4] {
        [
            ("Total problems", self.total.to_string()),
            ("Open", self.open.to_string()),
            ("Resolved", self.resolved.to_string()),
            ("Success rate", format!("{:.1}%", self.success_rate)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemBlock {
    pub heading: String,
    /// Metadata and wrapped description, one entry per printed line
    pub lines: Vec<String>,
    pub problem_photo: ImageSlot,
    pub solution_photo: Option<ImageSlot>,
    /// Truncated solution descriptions, newest first
    pub solutions: Vec<String>,
    /// Solutions left out of `solutions`
    pub more_solutions: usize,
}

impl ProblemBlock {
    pub fn more_label(&self) -> Option<String> {
        (self.more_solutions > 0).then(|| format!("+ {} more", self.more_solutions))
    }

    fn height(&self) -> f32 {
        let text_lines = 1
            + self.lines.len()
            + 1
            + self.solutions.len().max(1)
            + usize::from(self.more_solutions > 0);
        text_lines as f32 * LINE_HEIGHT_MM + IMAGE_HEIGHT_MM + SECTION_GAP_MM
    }
}

/// Text lines a problem block may use and still fit on one page
pub fn max_problem_text_lines() -> usize {
    let usable = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM - IMAGE_HEIGHT_MM - SECTION_GAP_MM;
    (usable / LINE_HEIGHT_MM).floor() as usize
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Header(HeaderBlock),
    Stats(StatsBlock),
    Problem(ProblemBlock),
    Notice(String),
}

impl Block {
    pub fn height(&self) -> f32 {
        match self {
            Block::Header(_) => HEADER_HEIGHT_MM,
            Block::Stats(_) => STATS_HEIGHT_MM,
            Block::Problem(problem) => problem.height(),
            Block::Notice(_) => EMPTY_NOTICE_HEIGHT_MM,
        }
    }
}

/// A block and its distance from the top edge of the page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub top_mm: f32,
    pub block: Block,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPage {
    pub blocks: Vec<PlacedBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub stats: DailyStats,
    pub pages: Vec<LayoutPage>,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.pages.iter().flat_map(|page| page.blocks.iter().map(|placed| &placed.block))
    }
}

/// Lay out the whole report
pub fn build_layout(input: &ReportInput, options: LayoutOptions) -> ReportLayout {
    let problems: Vec<Problem> =
        input.entries.iter().map(|entry| entry.problem.clone()).collect();
    let stats =
        DailyStats::from_problems(&input.window.label(), input.group_id.as_deref(), &problems);

    let mut blocks = vec![
        Block::Header(HeaderBlock {
            title: REPORT_TITLE.to_string(),
            window_label: input.window.label(),
            group_name: input.group_name.clone(),
            generated_at: format_timestamp(input.generated_at),
        }),
        Block::Stats(StatsBlock {
            total: stats.total_problems,
            open: stats.open_problems,
            resolved: stats.resolved_total(),
            success_rate: stats.resolution_rate(),
        }),
    ];

    if input.entries.is_empty() {
        blocks.push(Block::Notice("No problems were recorded in this period.".to_string()));
    }
    blocks.extend(
        input
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Block::Problem(problem_block(index + 1, entry, options))),
    );

    ReportLayout {
        title: REPORT_TITLE.to_string(),
        stats,
        pages: paginate(blocks),
    }
}

fn problem_block(number: usize, entry: &ProblemEntry, options: LayoutOptions) -> ProblemBlock {
    let problem = &entry.problem;

    let budget = max_problem_text_lines();
    // Keep room for one description line and the "+ N more" line.
    let shown = entry
        .solutions
        .len()
        .min(options.solutions_per_problem)
        .min(budget.saturating_sub(PROBLEM_FIXED_LINES + 2).max(1));
    let more_solutions = entry.solutions.len() - shown;
    let description_budget = budget
        .saturating_sub(PROBLEM_FIXED_LINES + shown.max(1) + usize::from(more_solutions > 0))
        .max(1);

    let mut lines = vec![
        format!("Location: {}", problem.location),
        format!(
            "Priority: {}    Status: {}",
            problem.priority.label(),
            problem.status.label()
        ),
        format!(
            "Auditor: {}    Reported: {}",
            problem.auditor_name,
            format_timestamp(problem.created_at)
        ),
    ];
    lines.extend(capped_lines(
        wrap_text(&problem.description, WRAP_WIDTH_CHARS),
        description_budget,
    ));

    let solutions = entry.solutions[..shown]
        .iter()
        .map(|solution| {
            format!(
                "{}: {}",
                solution.user_name,
                truncate_text(&solution.description, options.solution_char_budget)
            )
        })
        .collect();

    ProblemBlock {
        heading: format!("{}. {}", number, truncate_text(&problem.description, 60)),
        lines,
        problem_photo: entry.problem_photo.clone(),
        solution_photo: entry.solution_photo.clone(),
        solutions,
        more_solutions,
    }
}

/// Keep at most `max` lines; a cut text ends with an ellipsis
fn capped_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() <= max {
        return lines;
    }
    lines.truncate(max);
    if let Some(last) = lines.last_mut() {
        let kept = truncate_text(last, WRAP_WIDTH_CHARS - 3);
        *last = format!("{}...", kept.trim_end_matches("..."));
    }
    lines
}

/// Flow blocks top-down; a block that does not fit starts a new page.
/// A block taller than a page gets a page to itself.
pub fn paginate(blocks: Vec<Block>) -> Vec<LayoutPage> {
    let usable_bottom = PAGE_HEIGHT_MM - MARGIN_MM;
    let mut pages = vec![LayoutPage::default()];
    let mut cursor = MARGIN_MM;

    for block in blocks {
        let height = block.height();
        let page_has_content = pages.last().is_some_and(|page| !page.blocks.is_empty());
        if cursor + height > usable_bottom && page_has_content {
            pages.push(LayoutPage::default());
            cursor = MARGIN_MM;
        }

        if let Some(page) = pages.last_mut() {
            page.blocks.push(PlacedBlock { top_mm: cursor, block });
        }
        cursor += height;
    }

    pages
}

/// Greedy word wrap on character count
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
