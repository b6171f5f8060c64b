//! Header detection and semantic column mapping.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matrix::CellMatrix;
use crate::strain::Strain;
use crate::value::DayColumn;

const HEADER_KEYWORDS: &[&str] = &["CHALLENGED ORGANISM", "BULK NAME", "SPECIFICATION"];

/// Column titles naming the organism column; any recognized strain spelling counts too.
const STRAIN_LABELS: &[&str] = &["균주", "STRAIN"];

static CFU_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.?\d*\s*[×xX]\s*10\^?\d+").unwrap());
static LONG_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4,}$").unwrap());
static SPEC_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(≤[0-9]+[°cC]?|[0-9]{1,2}[°cC]?|SI)$").unwrap());

/// Where the table header sits, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "row")]
pub enum HeaderLocation {
    Row(usize),
    /// The first strain-bearing row already holds data; there is no header.
    /// Records still start at row 0; `first_data_row` is where the strain
    /// column is read from.
    NoHeader { first_data_row: usize },
    /// No header and no strain row: the page has no recognizable table.
    NotFound,
}

impl HeaderLocation {
    /// First row that may hold records.
    pub fn data_start(self) -> Option<usize> {
        match self {
            HeaderLocation::Row(r) => Some(r + 1),
            HeaderLocation::NoHeader { .. } => Some(0),
            HeaderLocation::NotFound => None,
        }
    }
}

/// Row bounds for the structural scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub header_keyword_rows: usize,
    pub strain_candidate_rows: usize,
    pub spec_sample_rows: usize,
    pub spec_min_hits: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self { header_keyword_rows: 5, strain_candidate_rows: 15, spec_sample_rows: 5, spec_min_hits: 3 }
    }
}

/// Semantic role → column index for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub bulk_name: usize,
    pub strain: Option<usize>,
    pub specification: Option<usize>,
    pub cfu_day0: Option<usize>,
    pub cfu_day7: Option<usize>,
    pub cfu_day14: Option<usize>,
    pub cfu_day28: Option<usize>,
    pub judgment: Option<usize>,
    pub final_judgment: Option<usize>,
}

impl ColumnMap {
    pub fn cfu(&self, day: DayColumn) -> Option<usize> {
        match day {
            DayColumn::Day0 => self.cfu_day0,
            DayColumn::Day7 => self.cfu_day7,
            DayColumn::Day14 => self.cfu_day14,
            DayColumn::Day28 => self.cfu_day28,
        }
    }

    fn cfu_slot(&mut self, day: DayColumn) -> &mut Option<usize> {
        match day {
            DayColumn::Day0 => &mut self.cfu_day0,
            DayColumn::Day7 => &mut self.cfu_day7,
            DayColumn::Day14 => &mut self.cfu_day14,
            DayColumn::Day28 => &mut self.cfu_day28,
        }
    }
}

pub fn resolve_header(matrix: &CellMatrix) -> HeaderLocation {
    resolve_header_with(matrix, &ScanLimits::default())
}

/// Locate the header row.
/// 1. a structural keyword within the first `header_keyword_rows` rows;
/// 2. otherwise the first row with a strain cell within `strain_candidate_rows`,
///    which is a header unless it already carries CFU-shaped values;
/// 3. otherwise nothing.
pub fn resolve_header_with(matrix: &CellMatrix, limits: &ScanLimits) -> HeaderLocation {
    let end = matrix.row_end();

    for row in (0..limits.header_keyword_rows.min(end)).filter(|r| matrix.row(*r).is_some()) {
        let text = matrix.row_text(row).to_uppercase();
        if HEADER_KEYWORDS.iter().any(|k| text.contains(k)) {
            tracing::debug!(row, "header found by structural keyword");
            return HeaderLocation::Row(row);
        }
    }

    let candidate = (0..limits.strain_candidate_rows.min(end))
        .find(|r| matrix.row_cells(*r).any(|(_, v)| is_strain_cell(v)));

    match candidate {
        Some(row) if row_has_cfu_values(matrix, row) => {
            tracing::debug!(row, "strain row carries CFU values, table has no header");
            HeaderLocation::NoHeader { first_data_row: row }
        }
        Some(row) => {
            tracing::debug!(row, "header found by strain keyword");
            HeaderLocation::Row(row)
        }
        None => {
            tracing::warn!("no header row and no strain row found");
            HeaderLocation::NotFound
        }
    }
}

/// A cell that names a strain, or titles the strain column.
fn is_strain_cell(value: &str) -> bool {
    let upper = value.to_uppercase();
    STRAIN_LABELS.iter().any(|k| upper.contains(k)) || Strain::from_text(value).is_some()
}

fn row_has_cfu_values(matrix: &CellMatrix, row: usize) -> bool {
    matrix.row_cells(row).any(|(_, v)| CFU_SHAPE.is_match(v) || LONG_NUMBER.is_match(v))
}

pub fn map_columns(matrix: &CellMatrix, header: HeaderLocation) -> ColumnMap {
    map_columns_with(matrix, header, &ScanLimits::default())
}

/// Build the column map from the header row's keywords, then fill every role
/// still missing positionally from the strain column. Without a header the
/// first strain row is data, so only the strain column is taken from it and
/// the specification column is inferred from value shapes. The bulk name is
/// always column 0.
pub fn map_columns_with(matrix: &CellMatrix, header: HeaderLocation, limits: &ScanLimits) -> ColumnMap {
    let mut map = ColumnMap::default();
    let (keyword_row, has_header) = match header {
        HeaderLocation::Row(r) => (r, true),
        HeaderLocation::NoHeader { first_data_row } => (first_data_row, false),
        HeaderLocation::NotFound => return map,
    };

    for (col, value) in matrix.row_cells(keyword_row) {
        let upper = value.to_uppercase();

        if is_strain_cell(value) || upper.contains("ORGANISM") {
            map.strain = Some(col);
        }
        if !has_header {
            continue;
        }
        if upper.contains("SPEC") {
            map.specification = Some(col);
            continue;
        }
        if let Some(day) = day_from_header(value) {
            *map.cfu_slot(day) = Some(col);
        }
        if upper.contains("판정") || upper.contains("JUDGMENT") {
            if upper.contains("최종") || upper.contains("FINAL") {
                map.final_judgment = Some(col);
            } else if map.judgment.is_none() {
                map.judgment = Some(col);
            }
        }
    }

    let Some(strain_col) = map.strain else {
        tracing::warn!(?header, "strain column not identified");
        return map;
    };

    if !has_header && map.specification.is_none() {
        map.specification = infer_specification_column(matrix, strain_col + 1, limits);
    }

    let cfu_start = match map.specification {
        Some(spec) if spec > strain_col => spec + 1,
        _ => strain_col + 1,
    };
    for (offset, day) in DayColumn::ALL.into_iter().enumerate() {
        map.cfu_slot(day).get_or_insert(cfu_start + offset);
    }
    map.judgment.get_or_insert(cfu_start + 4);
    map.final_judgment.get_or_insert(cfu_start + 5);

    tracing::debug!(?map, "columns mapped");
    map
}

fn day_from_header(value: &str) -> Option<DayColumn> {
    let upper = value.to_uppercase();
    let marked = upper.contains('일') || upper.contains("DAY") || upper.contains("CFU");
    if value.contains('0') && (marked || value.contains("접종")) {
        Some(DayColumn::Day0)
    } else if !marked {
        None
    } else if value.contains('7') {
        Some(DayColumn::Day7)
    } else if value.contains("14") {
        Some(DayColumn::Day14)
    } else if value.contains("28") {
        Some(DayColumn::Day28)
    } else {
        None
    }
}

/// Treat `col` as a specification column when enough sampled cells look like limits.
fn infer_specification_column(matrix: &CellMatrix, col: usize, limits: &ScanLimits) -> Option<usize> {
    let sampled: Vec<&str> = matrix
        .row_indices()
        .filter_map(|r| matrix.get(r, col))
        .take(limits.spec_sample_rows)
        .collect();
    let hits = sampled.iter().filter(|v| SPEC_SHAPE.is_match(v)).count();
    if hits >= limits.spec_min_hits {
        tracing::info!(col, hits, "specification column inferred from values");
        Some(col)
    } else {
        None
    }
}
