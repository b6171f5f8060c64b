//! Adapters turning OCR backend output into a [`CellMatrix`].
//!
//! Two backends are supported: a layout-analysis service that reports table
//! cells with row/column indices, and a document-parse service that returns
//! tables as HTML. Both end in the same matrix shape.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use thiserror::Error;

use crate::matrix::CellMatrix;

/// HTML caps on span attributes; larger values are clamped, not rejected.
const MAX_ROWSPAN: usize = 65534;
const MAX_COLSPAN: usize = 1000;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("ParseFailed: {0}")]
    Parse(String),
    #[error("NoTable")]
    NoTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Serialized [`CellMatrix`].
    Cells,
    /// Layout-analysis JSON with indexed table cells.
    Layout,
    /// Document-parse JSON with HTML tables, or a bare HTML fragment.
    Html,
}

/// Dispatch on the input format.
pub fn ingest(raw: &str, format: InputFormat) -> Result<CellMatrix, IngestError> {
    match format {
        InputFormat::Cells => serde_json::from_str(raw).map_err(|e| IngestError::Parse(e.to_string())),
        InputFormat::Layout => matrix_from_layout(raw),
        InputFormat::Html => {
            if raw.trim_start().starts_with('{') {
                matrix_from_document_parse(raw)
            } else {
                matrix_from_html(raw)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutEnvelope {
    #[serde(default)]
    analyze_result: Option<LayoutResult>,
    #[serde(default)]
    tables: Vec<LayoutTable>,
}

#[derive(Debug, Deserialize)]
struct LayoutResult {
    #[serde(default)]
    tables: Vec<LayoutTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTable {
    pub row_count: usize,
    pub column_count: usize,
    #[serde(default)]
    pub cells: Vec<LayoutCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutCell {
    pub row_index: usize,
    pub column_index: usize,
    #[serde(default)]
    pub content: String,
}

/// Layout-analysis result → matrix of its largest table (rows × columns;
/// the earliest table wins a tie).
pub fn matrix_from_layout(json: &str) -> Result<CellMatrix, IngestError> {
    let envelope: LayoutEnvelope = serde_json::from_str(json).map_err(|e| IngestError::Parse(e.to_string()))?;
    let tables = match envelope.analyze_result {
        Some(r) if !r.tables.is_empty() => r.tables,
        _ => envelope.tables,
    };
    tracing::debug!(tables = tables.len(), "layout tables detected");

    let table = tables
        .iter()
        .reduce(|best, t| if area(t) > area(best) { t } else { best })
        .ok_or(IngestError::NoTable)?;
    tracing::info!(rows = table.row_count, cols = table.column_count, "layout table selected");

    let mut matrix = CellMatrix::new();
    for cell in &table.cells {
        matrix.insert(cell.row_index, cell.column_index, &cell.content);
    }
    Ok(matrix)
}

fn area(t: &LayoutTable) -> usize {
    t.row_count.saturating_mul(t.column_count)
}

#[derive(Debug, Deserialize)]
struct DocumentParse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(default)]
    content: Option<ElementContent>,
}

#[derive(Debug, Deserialize)]
struct ElementContent {
    #[serde(default)]
    html: Option<String>,
}

/// Document-parse result → matrix of the first HTML table among its elements.
pub fn matrix_from_document_parse(json: &str) -> Result<CellMatrix, IngestError> {
    let doc: DocumentParse = serde_json::from_str(json).map_err(|e| IngestError::Parse(e.to_string()))?;
    let html: Vec<String> = doc
        .elements
        .into_iter()
        .filter_map(|e| e.content.and_then(|c| c.html))
        .filter(|h| !h.is_empty())
        .collect();
    if html.is_empty() {
        return Err(IngestError::NoTable);
    }
    matrix_from_html(&html.join("\n"))
}

/// First `<table>` of an HTML fragment → matrix. Spanned cells keep their text
/// at the origin slot only; the slots they cover stay empty so later cells in
/// the row land in their true columns. A rowspan never reaches past the
/// last row of the table.
pub fn matrix_from_html(html: &str) -> Result<CellMatrix, IngestError> {
    let doc = Html::parse_fragment(html);
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td, th").unwrap();

    let table = doc.select(&table_sel).next().ok_or(IngestError::NoTable)?;

    let mut matrix = CellMatrix::new();
    let mut occupied: HashSet<(usize, usize)> = HashSet::new();
    let rows: Vec<ElementRef<'_>> = table.select(&row_sel).collect();
    for (r, tr) in rows.iter().enumerate() {
        let mut c = 0;
        for cell in tr.select(&cell_sel) {
            while occupied.contains(&(r, c)) {
                c += 1;
            }
            let rowspan = span(&cell, "rowspan", MAX_ROWSPAN).min(rows.len() - r);
            let colspan = span(&cell, "colspan", MAX_COLSPAN);
            let text = cell_text(&cell);
            if !text.is_empty() {
                matrix.insert(r, c, &text);
            }
            for dr in 0..rowspan {
                for dc in 0..colspan {
                    occupied.insert((r + dr, c + dc));
                }
            }
            c += colspan;
        }
    }
    Ok(matrix)
}

fn span(cell: &ElementRef<'_>, attr: &str, max: usize) -> usize {
    cell.value().attr(attr).and_then(|v| v.trim().parse().ok()).unwrap_or(1).clamp(1, max)
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
