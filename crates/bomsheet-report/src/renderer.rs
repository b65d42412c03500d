//! xlsx rendering of a [`CostTable`].
//!
//! Layout of the "EST" sheet, zero-based rows:
//!
//! | row       | content                                      |
//! |-----------|----------------------------------------------|
//! | 0         | header, bold on yellow                       |
//! | 1..=n     | service rows, wrapped text, height 70        |
//! | n + 1     | "Total" merged A:B, totals in C and D        |
//! | n + 2     | "Calculator" merged A:B, link merged C:D     |
//! | n + 4     | optional image, anchored in column A         |
//!
//! A second sheet, "Questions and Answers", carries a fixed set of sample rows.

use std::borrow::Cow;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Image, Url, Workbook, Worksheet, XlsxError,
};

use crate::cost_table::CostTable;

pub const COST_SHEET_NAME: &str = "EST";
pub const QA_SHEET_NAME: &str = "Questions and Answers";

const HEADER_ROW_HEIGHT: f64 = 20.0;
const DATA_ROW_HEIGHT: f64 = 70.0;
const TRAILER_ROW_HEIGHT: f64 = 20.0;
const COLUMN_WIDTHS: [f64; 5] = [20.0, 25.0, 15.0, 20.0, 90.0];
/// Blank rows left between the trailers and the image.
const IMAGE_ROW_GAP: u32 = 1;
/// Longest string a worksheet cell can hold.
const MAX_CELL_CHARS: usize = 32_767;

const QA_COLUMN_WIDTH: f64 = 90.0;
const QA_ROW_HEIGHT: f64 = 30.0;
const QA_HEADERS: [&str; 2] = ["Questions", "Sample Answers"];
const QA_SAMPLES: [(&str, &str); 3] = [
    ("What is AWS?", "AWS is Amazon Web Services."),
    (
        "How does Lambda work?",
        "Lambda runs code without provisioning servers.",
    ),
    ("What is S3?", "S3 is scalable object storage."),
];

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("workbook error: {0}")]
    Workbook(#[from] XlsxError),
}

impl From<RenderError> for bomsheet_core::AppError {
    fn from(err: RenderError) -> Self {
        bomsheet_core::AppError::Render(err.to_string())
    }
}

/// Rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub embed_image: bool,
    pub include_calculator_row: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            embed_image: true,
            include_calculator_row: true,
        }
    }
}

impl From<bomsheet_core::PipelineOptions> for RenderOptions {
    fn from(options: bomsheet_core::PipelineOptions) -> Self {
        Self {
            embed_image: options.embed_image,
            include_calculator_row: options.include_calculator_row,
        }
    }
}

/// Workbook bytes plus any non-fatal problems hit while rendering.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub warnings: Vec<String>,
}

struct Formats {
    header: Format,
    cell: Format,
    qa_header: Format,
}

impl Formats {
    fn new() -> Self {
        let base = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_font_name("Arial")
            .set_font_size(11);

        Self {
            header: base
                .clone()
                .set_background_color(Color::RGB(0xFFFF00))
                .set_bold(),
            cell: base.set_text_wrap(),
            qa_header: Format::new()
                .set_background_color(Color::RGB(0xFFFF00))
                .set_bold()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
        }
    }
}

/// Render the workbook. An image that cannot be embedded is skipped and reported in
/// `warnings`; any other failure aborts rendering.
#[tracing::instrument(skip_all, fields(rows = table.rows.len(), has_image = image.is_some()))]
pub fn render_report(
    table: &CostTable,
    image: Option<&[u8]>,
    options: RenderOptions,
) -> Result<RenderedReport, RenderError> {
    let formats = Formats::new();
    let mut warnings = Vec::new();
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(COST_SHEET_NAME)?;
    let next_free_row = write_cost_sheet(sheet, table, &formats, options, &mut warnings)?;

    if let Some(image_bytes) = image.filter(|_| options.embed_image) {
        let image_row = next_free_row + IMAGE_ROW_GAP;
        if let Err(e) = insert_image(sheet, image_row, image_bytes) {
            tracing::warn!(error = %e, size_bytes = image_bytes.len(), "Skipping report image");
            warnings.push(format!("image could not be embedded: {}", e));
        }
    }

    let qa_sheet = workbook.add_worksheet();
    qa_sheet.set_name(QA_SHEET_NAME)?;
    write_qa_sheet(qa_sheet, &formats)?;

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(size_bytes = bytes.len(), warnings = warnings.len(), "Report rendered");

    Ok(RenderedReport { bytes, warnings })
}

/// Writes the cost sheet and returns the first row after the trailers.
fn write_cost_sheet(
    sheet: &mut Worksheet,
    table: &CostTable,
    formats: &Formats,
    options: RenderOptions,
    warnings: &mut Vec<String>,
) -> Result<u32, XlsxError> {
    for (col, header) in CostTable::HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
    }
    sheet.set_row_height(0, HEADER_ROW_HEIGHT)?;

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    let mut row: u32 = 1;
    for cost_row in &table.rows {
        let cells = [
            &cost_row.region,
            &cost_row.service_name,
            &cost_row.monthly_cost_display,
            &cost_row.yearly_cost_display,
            &cost_row.properties_summary,
        ];
        for (col, value) in cells.iter().enumerate() {
            let text = fit_cell(value, row, CostTable::HEADERS[col], warnings);
            sheet.write_string_with_format(row, col as u16, text.as_ref(), &formats.cell)?;
        }
        sheet.set_row_height(row, DATA_ROW_HEIGHT)?;
        row += 1;
    }

    sheet.merge_range(row, 0, row, 1, "Total", &formats.header)?;
    sheet.write_string_with_format(row, 2, &table.total_monthly_display, &formats.cell)?;
    sheet.write_string_with_format(row, 3, &table.total_yearly_display, &formats.cell)?;
    sheet.set_row_height(row, TRAILER_ROW_HEIGHT)?;
    row += 1;

    if options.include_calculator_row {
        let raw_link = table.calculator_link.as_deref().unwrap_or("");
        let link = fit_cell(raw_link, row, "Calculator", warnings);
        sheet.merge_range(row, 0, row, 1, "Calculator", &formats.header)?;
        sheet.merge_range(row, 2, row, 3, link.as_ref(), &formats.cell)?;
        if is_web_link(raw_link) && matches!(link, Cow::Borrowed(_)) {
            if let Err(e) =
                sheet.write_url_with_format(row, 2, Url::new(raw_link), &formats.cell)
            {
                tracing::warn!(error = %e, "Calculator link kept as plain text");
                warnings.push(format!("calculator link is not a valid hyperlink: {}", e));
            }
        }
        sheet.set_row_height(row, TRAILER_ROW_HEIGHT)?;
        row += 1;
    }

    Ok(row)
}

/// Cuts text to what a cell can hold, recording a warning when anything is dropped.
fn fit_cell<'a>(
    text: &'a str,
    row: u32,
    column: &str,
    warnings: &mut Vec<String>,
) -> Cow<'a, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => {
            let total = text.chars().count();
            tracing::warn!(row, column, chars = total, "Cell text truncated");
            warnings.push(format!(
                "{} in row {} truncated from {} to {} characters",
                column,
                row + 1,
                total,
                MAX_CELL_CHARS
            ));
            Cow::Owned(text[..cut].to_string())
        }
    }
}

fn insert_image(sheet: &mut Worksheet, row: u32, bytes: &[u8]) -> Result<(), XlsxError> {
    let image = Image::new_from_buffer(bytes)?;
    sheet.insert_image(row, 0, &image)?;
    Ok(())
}

fn write_qa_sheet(sheet: &mut Worksheet, formats: &Formats) -> Result<(), XlsxError> {
    for (col, header) in QA_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &formats.qa_header)?;
        sheet.set_column_width(col as u16, QA_COLUMN_WIDTH)?;
    }
    sheet.set_row_height(0, QA_ROW_HEIGHT)?;

    for (i, (question, answer)) in QA_SAMPLES.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *question)?;
        sheet.write_string(row, 1, *answer)?;
        sheet.set_row_height(row, QA_ROW_HEIGHT)?;
    }

    Ok(())
}

fn is_web_link(link: &str) -> bool {
    link.starts_with("https://") || link.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomsheet_core::models::BomDocument;
    use serde_json::json;
    use std::io::{Cursor, Read};

    /// 1x1 transparent PNG.
    const PNG_1X1: [u8; 67] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn sample_table(link: Option<&str>) -> CostTable {
        let doc = BomDocument::from_value(&json!({
            "Groups": {"Services": [
                {
                    "Region": "US East (N. Virginia)",
                    "Service Name": "Amazon EC2",
                    "Service Cost": {"monthly": 100.0},
                    "Properties": {"Instance type": "t3.micro"}
                },
                {
                    "Service Name": "Amazon S3",
                    "Service Cost": {"monthly": "25.5"}
                }
            ]}
        }))
        .unwrap();
        CostTable::build(&doc, link).unwrap()
    }

    fn read_part(bytes: &[u8], name: &str) -> Option<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        Some(text)
    }

    fn has_media(bytes: &[u8]) -> bool {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let found = archive.file_names().any(|n| n.starts_with("xl/media/"));
        found
    }

    #[test]
    fn test_renders_both_sheets() {
        let report = render_report(&sample_table(None), None, RenderOptions::default()).unwrap();
        assert!(report.warnings.is_empty());

        let workbook = read_part(&report.bytes, "xl/workbook.xml").unwrap();
        assert!(workbook.contains(r#"name="EST""#));
        assert!(workbook.contains(r#"name="Questions and Answers""#));

        let strings = read_part(&report.bytes, "xl/sharedStrings.xml").unwrap();
        for expected in [
            "Region",
            "Config Summary",
            "Amazon EC2",
            "$100.00",
            "$1,200.00",
            "$125.50",
            "$1,506.00",
            "Instance type: t3.micro",
            "N/A",
            "Total",
            "Calculator",
            "What is S3?",
            "Lambda runs code without provisioning servers.",
        ] {
            assert!(strings.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn test_trailer_rows_are_merged() {
        let report = render_report(&sample_table(None), None, RenderOptions::default()).unwrap();
        let sheet = read_part(&report.bytes, "xl/worksheets/sheet1.xml").unwrap();

        // Two service rows: header is row 1, trailers are rows 4 and 5.
        assert!(sheet.contains(r#"<mergeCell ref="A4:B4"/>"#));
        assert!(sheet.contains(r#"<mergeCell ref="A5:B5"/>"#));
        assert!(sheet.contains(r#"<mergeCell ref="C5:D5"/>"#));
        assert!(sheet.contains(r#"ht="70""#));
    }

    #[test]
    fn test_calculator_row_can_be_omitted() {
        let options = RenderOptions {
            include_calculator_row: false,
            ..RenderOptions::default()
        };
        let report = render_report(&sample_table(Some("https://calculator.aws/")), None, options)
            .unwrap();
        let strings = read_part(&report.bytes, "xl/sharedStrings.xml").unwrap();
        assert!(!strings.contains("Calculator"));
    }

    #[test]
    fn test_calculator_link_becomes_hyperlink() {
        let link = "https://calculator.aws/#/estimate?id=abc";
        let report =
            render_report(&sample_table(Some(link)), None, RenderOptions::default()).unwrap();
        let rels = read_part(&report.bytes, "xl/worksheets/_rels/sheet1.xml.rels").unwrap();
        assert!(rels.contains("calculator.aws"));
    }

    #[test]
    fn test_image_is_embedded() {
        let report = render_report(
            &sample_table(None),
            Some(&PNG_1X1),
            RenderOptions::default(),
        )
        .unwrap();
        assert!(report.warnings.is_empty());
        assert!(has_media(&report.bytes));
    }

    #[test]
    fn test_bad_image_is_a_warning() {
        let report = render_report(
            &sample_table(None),
            Some(b"definitely not an image"),
            RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("image could not be embedded"));
        assert!(!has_media(&report.bytes));
        assert!(read_part(&report.bytes, "xl/sharedStrings.xml")
            .unwrap()
            .contains("Amazon EC2"));
    }

    #[test]
    fn test_image_skipped_when_disabled() {
        let options = RenderOptions {
            embed_image: false,
            ..RenderOptions::default()
        };
        let report = render_report(&sample_table(None), Some(&PNG_1X1), options).unwrap();
        assert!(!has_media(&report.bytes));
    }

    #[test]
    fn test_empty_table_renders() {
        let table = CostTable::build(&BomDocument::default(), None).unwrap();
        let report = render_report(&table, None, RenderOptions::default()).unwrap();
        let strings = read_part(&report.bytes, "xl/sharedStrings.xml").unwrap();
        assert!(strings.contains("$0.00"));
        let sheet = read_part(&report.bytes, "xl/worksheets/sheet1.xml").unwrap();
        assert!(sheet.contains(r#"<mergeCell ref="A2:B2"/>"#));
    }

    #[test]
    fn test_oversized_cell_is_truncated_with_warning() {
        let doc = BomDocument::from_value(&json!({
            "Groups": {"Services": [{
                "Region": "us-east-1",
                "Service Name": "Amazon EC2",
                "Service Cost": {"monthly": 10},
                "Properties": {"notes": "n".repeat(40_000)}
            }]}
        }))
        .unwrap();
        let table = CostTable::build(&doc, None).unwrap();

        let report = render_report(&table, None, RenderOptions::default()).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Config Summary in row 2"));
        let strings = read_part(&report.bytes, "xl/sharedStrings.xml").unwrap();
        assert!(strings.contains("Amazon EC2"));
        assert!(strings.contains(&"n".repeat(100)));
    }

    #[test]
    fn test_oversized_calculator_link_stays_plain_text() {
        let link = format!("https://calculator.aws/estimate?id={}", "a".repeat(40_000));

        let report =
            render_report(&sample_table(Some(&link)), None, RenderOptions::default()).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Calculator"));
        assert!(read_part(&report.bytes, "xl/worksheets/_rels/sheet1.xml.rels").is_none());
    }

    #[test]
    fn test_fit_cell_counts_characters_not_bytes() {
        let mut warnings = Vec::new();
        let wide = "é".repeat(MAX_CELL_CHARS);
        assert!(matches!(fit_cell(&wide, 1, "Region", &mut warnings), Cow::Borrowed(_)));
        assert!(warnings.is_empty());

        let longer = format!("{}é", wide);
        let fitted = fit_cell(&longer, 1, "Region", &mut warnings);
        assert_eq!(fitted.chars().count(), MAX_CELL_CHARS);
        assert_eq!(warnings.len(), 1);
    }
}
