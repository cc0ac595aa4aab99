//! PDF audit reports
//!
//! A report covers one day, the trailing week or a calendar month and is
//! written to the configured output directory.

pub mod generator;
pub mod layout;
pub mod pdf;
pub mod window;

pub use generator::{report_file_name, ReportGenerator, ReportRequest, REPORT_FILE_PREFIX};
pub use layout::{build_layout, Block, ImageSlot, LayoutOptions, ReportLayout};
pub use pdf::render_pdf;
pub use window::ReportWindow;
