use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assemble::{assemble_with, TestRecord};
use crate::config::ExtractionConfig;
use crate::dates::{extract_dates_with, DateBlock};
use crate::matrix::CellMatrix;
use crate::structure::{map_columns_with, resolve_header_with, ColumnMap, HeaderLocation};
use crate::value::ValueNormalizer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    /// Neither a header nor a strain row was found; distinct from a table with zero records.
    #[error("TableNotDetected")]
    TableNotDetected,
}

/// Everything recovered from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExtraction {
    pub header: HeaderLocation,
    pub columns: ColumnMap,
    pub records: Vec<TestRecord>,
    pub dates: DateBlock,
}

impl PageExtraction {
    /// Distinct non-empty test numbers in encounter order.
    pub fn test_numbers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for r in &self.records {
            if !r.test_number.is_empty() && !seen.contains(&r.test_number.as_str()) {
                seen.push(&r.test_number);
            }
        }
        seen
    }
}

/// Page pipeline: header → columns → records, plus the date block.
/// Holds configuration only, so one extractor can serve pages on any thread.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn extract_page(&self, matrix: &CellMatrix) -> Result<PageExtraction, PageError> {
        let limits = self.config.scan_limits();
        let header = resolve_header_with(matrix, &limits);
        let start_row = header.data_start().ok_or(PageError::TableNotDetected)?;
        let columns = map_columns_with(matrix, header, &limits);

        let normalizer = ValueNormalizer::new(self.config.day7_policy);
        let records = assemble_with(matrix, &columns, start_row, &normalizer);
        let dates = extract_dates_with(matrix, self.config.date_rows, self.config.reference_year);

        tracing::info!(?header, records = records.len(), dated = !dates.is_empty(), "page extracted");
        Ok(PageExtraction { header, columns, records, dates })
    }
}

/// Run the page pipeline with default settings.
pub fn extract_page(matrix: &CellMatrix) -> Result<PageExtraction, PageError> {
    Extractor::default().extract_page(matrix)
}
