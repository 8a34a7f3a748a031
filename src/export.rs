//! Export of a query result as a letter-size PDF, a printable HTML document,
//! CSV or JSON.
//!
//! All writers take any `Write` so the UI can target a file and tests a
//! buffer. Layout is fixed: title block, query context, the display columns,
//! disclaimer.

use std::io::Write;

use chrono::NaiveDate;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::Serialize;

use crate::color::{hex, type_tint};
use crate::config::{APP_TITLE, DISCLAIMER, DISPLAY_COLUMNS, VERSION};
use crate::data::model::{ConstraintRow, Query, ResultSet};
use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Html,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Pdf,
        ExportFormat::Html,
        ExportFormat::Csv,
        ExportFormat::Json,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Html => "Printable document (HTML)",
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
        }
    }

    /// Write `result` in this format. Returns the number of rows written.
    pub fn write<W: Write>(
        self,
        result: &ResultSet,
        writer: W,
        generated_on: NaiveDate,
    ) -> Result<usize, ExportError> {
        match self {
            ExportFormat::Pdf => export_pdf(result, writer, generated_on),
            ExportFormat::Html => export_html(result, writer, generated_on),
            ExportFormat::Csv => export_csv(result, writer),
            ExportFormat::Json => export_json(result, writer, generated_on),
        }
    }
}

/// Default file name for a saved export, e.g. `Timmerman_3fx_Spinal_Cord.pdf`.
pub fn suggested_file_name(query: &Query, extension: &str) -> String {
    format!(
        "Timmerman_{}fx_{}.{extension}",
        query.fraction,
        query.organ.replace(' ', "_")
    )
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

// US letter, half-inch margins. All positions in millimetres from the
// bottom-left corner.
const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 12.7;
const CELL_PADDING: f32 = 1.4;

/// Column widths in the order of [`DISPLAY_COLUMNS`]; they span the text area.
const PDF_COLUMN_WIDTHS: [f32; 6] = [18.0, 44.0, 22.0, 30.0, 34.0, 42.5];

const TITLE_SIZE: f32 = 16.0;
const META_SIZE: f32 = 10.0;
const HEADER_SIZE: f32 = 9.0;
const BODY_SIZE: f32 = 8.0;

/// Rough Helvetica advance per character, in mm per point of font size.
const CHAR_WIDTH_PER_PT: f32 = 0.19;

/// One positioned string on a PDF page.
#[derive(Debug, Clone, PartialEq)]
struct PdfText {
    text: String,
    x: f32,
    y: f32,
    size: f32,
    bold: bool,
}

/// Top-down text cursor that starts a new page when the bottom margin is hit.
struct PdfLayout {
    pages: Vec<Vec<PdfText>>,
    y: f32,
}

impl PdfLayout {
    fn new() -> Self {
        PdfLayout {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Start a new page unless `height` still fits. Returns true on a break.
    fn reserve(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
            true
        } else {
            false
        }
    }

    fn put(&mut self, text: &str, x: f32, y: f32, size: f32, bold: bool) {
        if let Some(page) = self.pages.last_mut() {
            page.push(PdfText {
                text: text.to_string(),
                x,
                y,
                size,
                bold,
            });
        }
    }

    /// A full-width paragraph, wrapped to the text area.
    fn paragraph(&mut self, text: &str, size: f32, bold: bool) {
        let width = PAGE_WIDTH - 2.0 * MARGIN;
        for line in wrap_text(text, chars_that_fit(width, size)) {
            let height = line_height(size);
            self.reserve(height);
            self.y -= height;
            self.put(&line, MARGIN, self.y, size, bold);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn table_header(&mut self) {
        let height = line_height(HEADER_SIZE) + CELL_PADDING;
        self.y -= height;
        let mut x = MARGIN;
        for (title, width) in DISPLAY_COLUMNS.iter().zip(PDF_COLUMN_WIDTHS) {
            self.put(title, x + CELL_PADDING, self.y, HEADER_SIZE, true);
            x += width;
        }
    }

    /// One table row; the header is repeated at the top of every new page.
    fn table_row(&mut self, row: &ConstraintRow) {
        let cells: Vec<Vec<String>> = row
            .display_cells()
            .iter()
            .zip(PDF_COLUMN_WIDTHS)
            .map(|(cell, width)| {
                wrap_text(cell, chars_that_fit(width - 2.0 * CELL_PADDING, BODY_SIZE))
            })
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        let height = lines as f32 * line_height(BODY_SIZE) + CELL_PADDING;

        if self.reserve(height) {
            self.table_header();
        }

        let top = self.y;
        let mut x = MARGIN;
        for (cell_lines, width) in cells.iter().zip(PDF_COLUMN_WIDTHS) {
            let mut y = top;
            for line in cell_lines {
                y -= line_height(BODY_SIZE);
                self.put(line, x + CELL_PADDING, y, BODY_SIZE, false);
            }
            x += width;
        }
        self.y = top - height;
    }
}

fn line_height(size_pt: f32) -> f32 {
    // 1 pt = 0.3528 mm, 1.25 leading.
    size_pt * 0.3528 * 1.25
}

fn chars_that_fit(width: f32, size_pt: f32) -> usize {
    ((width / (size_pt * CHAR_WIDTH_PER_PT)).floor() as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split. Never empty.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Position every string of the document, page by page.
fn layout_pdf(result: &ResultSet, generated_on: NaiveDate) -> Vec<Vec<PdfText>> {
    let mut layout = PdfLayout::new();

    layout.paragraph(APP_TITLE, TITLE_SIZE, true);
    layout.paragraph(
        &format!(
            "Version: {VERSION}    Date: {}",
            generated_on.format("%Y-%m-%d")
        ),
        META_SIZE,
        false,
    );
    layout.gap(3.5);
    layout.paragraph(
        &format!("Fractions: {}", result.query.fraction),
        META_SIZE,
        false,
    );
    layout.paragraph(
        &format!("OAR / Structure: {}", result.query.organ),
        META_SIZE,
        false,
    );
    layout.gap(4.2);

    if result.is_empty() {
        layout.paragraph("No constraints for this combination.", META_SIZE, false);
    } else {
        layout.reserve(line_height(HEADER_SIZE) + line_height(BODY_SIZE) + 2.0 * CELL_PADDING);
        layout.table_header();
        for row in &result.rows {
            layout.table_row(row);
        }
    }

    layout.gap(4.2);
    layout.paragraph(DISCLAIMER, BODY_SIZE, false);
    layout.pages
}

/// Letter-size PDF with the same content as [`export_html`].
pub fn export_pdf<W: Write>(
    result: &ResultSet,
    mut writer: W,
    generated_on: NaiveDate,
) -> Result<usize, ExportError> {
    let pages = layout_pdf(result, generated_on);

    let doc_title = format!(
        "{APP_TITLE} - {}fx - {}",
        result.query.fraction, result.query.organ
    );
    let (doc, first_page, first_layer) =
        PdfDocument::new(doc_title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1".to_string());
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (index, items) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        for item in items {
            let font = if item.bold { &bold } else { &regular };
            layer.use_text(item.text.clone(), item.size, Mm(item.x), Mm(item.y), font);
        }
    }

    let bytes = doc.save_to_bytes().map_err(pdf_error)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(result.rows.len())
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> ExportError {
    ExportError::Pdf(format!("{e:?}"))
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

const HTML_STYLE: &str = "\
body { font-family: Helvetica, Arial, sans-serif; margin: 36px; color: #222; }
h1 { font-size: 20px; margin-bottom: 4px; }
p.meta { margin: 2px 0; font-size: 12px; }
table { border-collapse: collapse; margin-top: 12px; }
th { background: #305496; color: #fff; font-size: 10pt; text-align: left; }
td { font-size: 9pt; vertical-align: top; }
th, td { border: 0.5px solid #d3d3d3; padding: 3px 4px; }
p.empty { font-style: italic; }
p.disclaimer { margin-top: 12px; font-size: 9pt; }
@media print { body { margin: 0.5in; } }
";

/// Standalone printable HTML document for one result set.
pub fn export_html<W: Write>(
    result: &ResultSet,
    mut writer: W,
    generated_on: NaiveDate,
) -> Result<usize, ExportError> {
    let title = escape_html(APP_TITLE);
    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">")?;
    writeln!(
        writer,
        "<title>{title} - {}fx - {}</title>",
        result.query.fraction,
        escape_html(&result.query.organ)
    )?;
    writeln!(writer, "<style>\n{HTML_STYLE}</style>\n</head>\n<body>")?;
    writeln!(writer, "<h1>{title}</h1>")?;
    writeln!(
        writer,
        "<p class=\"meta\">Version: {} &nbsp;&nbsp; Date: {}</p>",
        escape_html(VERSION),
        generated_on.format("%Y-%m-%d")
    )?;
    writeln!(
        writer,
        "<p class=\"meta\"><b>Fractions:</b> {}</p>",
        result.query.fraction
    )?;
    writeln!(
        writer,
        "<p class=\"meta\"><b>OAR / Structure:</b> {}</p>",
        escape_html(&result.query.organ)
    )?;

    if result.is_empty() {
        writeln!(
            writer,
            "<p class=\"empty\">No constraints for this combination.</p>"
        )?;
    } else {
        writeln!(writer, "<table>\n<thead><tr>")?;
        for col in DISPLAY_COLUMNS {
            writeln!(writer, "<th>{}</th>", escape_html(col))?;
        }
        writeln!(writer, "</tr></thead>\n<tbody>")?;
        for row in &result.rows {
            write_html_row(&mut writer, row)?;
        }
        writeln!(writer, "</tbody>\n</table>")?;
    }

    writeln!(
        writer,
        "<p class=\"disclaimer\">{}</p>\n</body>\n</html>",
        escape_html(DISCLAIMER)
    )?;
    writer.flush()?;
    Ok(result.rows.len())
}

fn write_html_row<W: Write>(writer: &mut W, row: &ConstraintRow) -> Result<(), ExportError> {
    match type_tint(row.kind(), false) {
        Some(rgb) => write!(writer, "<tr style=\"background-color: {}\">", hex(rgb))?,
        None => write!(writer, "<tr>")?,
    }
    for cell in row.display_cells() {
        write!(writer, "<td>{}</td>", escape_html(cell))?;
    }
    writeln!(writer, "</tr>")?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Display columns only, one record per row, in result order.
pub fn export_csv<W: Write>(result: &ResultSet, writer: W) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(DISPLAY_COLUMNS)?;
    for row in &result.rows {
        csv_writer.write_record(row.display_cells())?;
    }
    csv_writer.flush()?;
    Ok(result.rows.len())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonDocument<'a> {
    title: &'static str,
    version: &'static str,
    generated_on: String,
    query: &'a Query,
    rows: &'a [ConstraintRow],
}

pub fn export_json<W: Write>(
    result: &ResultSet,
    mut writer: W,
    generated_on: NaiveDate,
) -> Result<usize, ExportError> {
    let doc = JsonDocument {
        title: APP_TITLE,
        version: VERSION,
        generated_on: generated_on.format("%Y-%m-%d").to_string(),
        query: &result.query,
        rows: &result.rows,
    };
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writer.flush()?;
    Ok(result.rows.len())
}
