//! PDF rendering of a [`ReportLayout`]

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use tracing::{debug, warn};

use super::layout::*;
use crate::utils::errors::{AuditError, Result};

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;
const IMAGE_GAP_MM: f32 = 10.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Write `layout` as a PDF at `path`
pub fn render_pdf(layout: &ReportLayout, path: &Path) -> Result<()> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(&layout.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Page 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Page {}", index + 1));
            doc.get_page(page_index).get_layer(layer_index)
        };

        for placed in &page.blocks {
            draw_block(&layer, &fonts, placed);
        }
        draw_page_number(&layer, &fonts, index + 1, layout.page_count());
    }

    save(doc, path)?;
    debug!(path = %path.display(), pages = layout.page_count(), "Report rendered");
    Ok(())
}

fn save(doc: PdfDocumentReference, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    doc.save(&mut writer).map_err(pdf_error)
}

fn pdf_error(error: printpdf::Error) -> AuditError {
    AuditError::Report(error.to_string())
}

/// Convert a distance from the top edge into printpdf's bottom-up y axis
fn y_from_top(top_mm: f32) -> Mm {
    Mm(PAGE_HEIGHT_MM - top_mm)
}

/// Print one line of text whose baseline sits `top_mm` below the top edge
fn write_line(
    layer: &PdfLayerReference,
    text: impl Into<String>,
    size: f32,
    font: &IndirectFontRef,
    left_mm: f32,
    top_mm: f32,
) {
    layer.use_text(text, size, Mm(left_mm), y_from_top(top_mm), font);
}

fn draw_block(layer: &PdfLayerReference, fonts: &Fonts, placed: &PlacedBlock) {
    let mut cursor = placed.top_mm + LINE_HEIGHT_MM;

    match &placed.block {
        Block::Header(header) => {
            write_line(layer, &header.title, TITLE_SIZE, &fonts.bold, MARGIN_MM, cursor + 2.0);
            cursor += LINE_HEIGHT_MM * 2.0;
            let label = header.window_label.as_str();
            write_line(layer, label, HEADING_SIZE, &fonts.regular, MARGIN_MM, cursor);
            cursor += LINE_HEIGHT_MM;
            if let Some(group_name) = &header.group_name {
                let group = format!("Group: {}", group_name);
                write_line(layer, group, BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
                cursor += LINE_HEIGHT_MM;
            }
            let generated = format!("Generated: {}", header.generated_at);
            write_line(layer, generated, BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
        }
        Block::Stats(stats) => {
            write_line(layer, "Summary", HEADING_SIZE, &fonts.bold, MARGIN_MM, cursor);
            for (label, value) in stats.rows() {
                cursor += LINE_HEIGHT_MM;
                write_line(layer, label, BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
                write_line(layer, value, BODY_SIZE, &fonts.bold, MARGIN_MM + 60.0, cursor);
            }
        }
        Block::Notice(text) => {
            write_line(layer, text.as_str(), BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
        }
        Block::Problem(problem) => draw_problem(layer, fonts, problem, cursor),
    }
}

fn draw_problem(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    problem: &ProblemBlock,
    mut cursor: f32,
) {
    write_line(layer, problem.heading.as_str(), HEADING_SIZE, &fonts.bold, MARGIN_MM, cursor);
    for line in &problem.lines {
        cursor += LINE_HEIGHT_MM;
        write_line(layer, line.as_str(), BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
    }

    let image_top = cursor + LINE_HEIGHT_MM;
    draw_image_slot(layer, fonts, &problem.problem_photo, MARGIN_MM, image_top);
    if let Some(solution_photo) = &problem.solution_photo {
        let left_mm = MARGIN_MM + IMAGE_WIDTH_MM + IMAGE_GAP_MM;
        draw_image_slot(layer, fonts, solution_photo, left_mm, image_top);
    }
    cursor = image_top + IMAGE_HEIGHT_MM;

    cursor += LINE_HEIGHT_MM;
    write_line(layer, "Solutions", BODY_SIZE, &fonts.bold, MARGIN_MM, cursor);
    if problem.solutions.is_empty() {
        cursor += LINE_HEIGHT_MM;
        let empty = "No solutions proposed yet";
        write_line(layer, empty, BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
    }
    for solution in &problem.solutions {
        cursor += LINE_HEIGHT_MM;
        write_line(layer, solution.as_str(), BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
    }
    if let Some(more) = problem.more_label() {
        cursor += LINE_HEIGHT_MM;
        write_line(layer, more, BODY_SIZE, &fonts.regular, MARGIN_MM, cursor);
    }
}

/// Embed the photo scaled into the image box, or print the placeholder text.
/// A photo that fails to decode is printed as a placeholder.
fn draw_image_slot(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    slot: &ImageSlot,
    left_mm: f32,
    top_mm: f32,
) {
    let placeholder = match slot {
        ImageSlot::Image(path) => match load_image(path) {
            Ok(image) => {
                embed_image(layer, &image, left_mm, top_mm);
                return;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Photo could not be embedded");
                "[Photo could not be loaded]".to_string()
            }
        },
        ImageSlot::Placeholder(text) => text.clone(),
    };

    let middle_mm = top_mm + IMAGE_HEIGHT_MM / 2.0;
    write_line(layer, placeholder, BODY_SIZE, &fonts.regular, left_mm, middle_mm);
}

/// Decode and downscale so the pixel size matches the box at [`IMAGE_DPI`]
fn load_image(path: &Path) -> Result<DynamicImage> {
    let image = image_crate::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| AuditError::Photo(e.to_string()))?;

    let max_width = (IMAGE_WIDTH_MM / MM_PER_INCH * IMAGE_DPI) as u32;
    let max_height = (IMAGE_HEIGHT_MM / MM_PER_INCH * IMAGE_DPI) as u32;
    Ok(DynamicImage::ImageRgb8(image.thumbnail(max_width, max_height).to_rgb8()))
}

fn embed_image(layer: &PdfLayerReference, image: &DynamicImage, left_mm: f32, top_mm: f32) {
    let (width_px, height_px) = image.dimensions();
    let natural_width = width_px as f32 / IMAGE_DPI * MM_PER_INCH;
    let natural_height = height_px as f32 / IMAGE_DPI * MM_PER_INCH;
    // Small photos are scaled up to fill the box, keeping the aspect ratio
    let scale = (IMAGE_WIDTH_MM / natural_width).min(IMAGE_HEIGHT_MM / natural_height);

    Image::from_dynamic_image(image).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(left_mm)),
            translate_y: Some(y_from_top(top_mm + natural_height * scale)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

fn draw_page_number(layer: &PdfLayerReference, fonts: &Fonts, page: usize, total: usize) {
    layer.use_text(
        format!("{} / {}", page, total),
        BODY_SIZE - 2.0,
        Mm(PAGE_WIDTH_MM - MARGIN_MM - 10.0),
        Mm(MARGIN_MM / 2.0),
        &fonts.regular,
    );
}
