//! Sampling-schedule dates (day 0/7/14/28) from the leading table rows.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matrix::CellMatrix;

pub const DEFAULT_REFERENCE_YEAR: i32 = 2024;
pub const DEFAULT_DATE_ROWS: usize = 5;

static DECIMAL_AS_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d)\.(\d)\s+(\d{1,2})$").unwrap());
static SEPARATED_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})[/\-.](\d{1,2})$").unwrap());
static SPACED_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})\s+(\d{1,2})$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// Four dates read from one row.
    Explicit,
    /// One start date read; the rest computed by day offsets.
    Derived,
    #[default]
    None,
}

/// "MM/DD" per sampling day; all empty when no date was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBlock {
    pub day0: String,
    pub day7: String,
    pub day14: String,
    pub day28: String,
    pub source: DateSource,
}

impl DateBlock {
    pub fn is_empty(&self) -> bool {
        self.source == DateSource::None
    }

    fn explicit(dates: &[(String, String)]) -> Self {
        let fmt = |(m, d): &(String, String)| format!("{:0>2}/{:0>2}", m, d);
        DateBlock {
            day0: fmt(&dates[0]),
            day7: fmt(&dates[1]),
            day14: fmt(&dates[2]),
            day28: fmt(&dates[3]),
            source: DateSource::Explicit,
        }
    }

    fn derived(start: NaiveDate) -> Self {
        let at = |days: i64| (start + Duration::days(days)).format("%m/%d").to_string();
        DateBlock { day0: at(0), day7: at(7), day14: at(14), day28: at(28), source: DateSource::Derived }
    }
}

/// Repair a decimal point read in place of a digit gap: "0.5 15" → "05 15".
pub fn correct_decimal_misread(value: &str) -> String {
    DECIMAL_AS_SPACE.replace(value, "$1$2 $3").into_owned()
}

/// Month/day pair from one cell shaped "MM/DD", "MM-DD", "MM.DD" or "MM DD".
pub fn parse_date_cell(value: &str) -> Option<(String, String)> {
    let value = correct_decimal_misread(value.trim());
    SEPARATED_DATE
        .captures(&value)
        .or_else(|| SPACED_DATE.captures(&value))
        .map(|c| (c[1].to_string(), c[2].to_string()))
}

/// Four dates packed into one cell as eight two-digit tokens.
pub fn parse_consecutive_dates(value: &str) -> Option<Vec<(String, String)>> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() < 8 || !parts.iter().all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    Some(parts.chunks(2).take(4).map(|p| (p[0].to_string(), p[1].to_string())).collect())
}

pub fn extract_dates(matrix: &CellMatrix) -> DateBlock {
    extract_dates_with(matrix, DEFAULT_DATE_ROWS, DEFAULT_REFERENCE_YEAR)
}

/// First pass: a row of `rows` leading rows with four date cells wins outright.
/// Second pass: the first single date anywhere in those rows becomes day 0 and
/// the rest are computed in `reference_year`. Otherwise the block is empty.
pub fn extract_dates_with(matrix: &CellMatrix, rows: usize, reference_year: i32) -> DateBlock {
    for row in 0..rows {
        let mut dates = Vec::new();
        for (_, value) in matrix.row_cells(row) {
            if let Some(run) = parse_consecutive_dates(value) {
                dates.extend(run);
            } else if let Some(d) = parse_date_cell(value) {
                dates.push(d);
            }
        }
        if dates.len() >= 4 {
            let block = DateBlock::explicit(&dates[..4]);
            tracing::info!(row, ?block, "sampling dates read");
            return block;
        }
    }

    for row in 0..rows {
        for (col, value) in matrix.row_cells(row) {
            let Some((m, d)) = parse_date_cell(value) else { continue };
            let start = m
                .parse::<u32>()
                .ok()
                .zip(d.parse::<u32>().ok())
                .and_then(|(m, d)| NaiveDate::from_ymd_opt(reference_year, m, d));
            if let Some(start) = start {
                let block = DateBlock::derived(start);
                tracing::info!(row, col, ?block, "sampling dates derived from start date");
                return block;
            }
        }
    }

    tracing::warn!("no sampling dates found");
    DateBlock::default()
}
