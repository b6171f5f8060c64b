//! Row-by-row record assembly with identifier context propagation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identifier::{extract_identifiers, Identifiers};
use crate::matrix::CellMatrix;
use crate::strain::Strain;
use crate::structure::ColumnMap;
use crate::value::{DayColumn, ValueNormalizer};

/// Characters (and the Korean "unfit" word) that mark a failed judgment.
const FAIL_MARKERS: &[&str] = &["X", "×", "V", "부적합"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Pass,
    Fail,
}

impl Judgment {
    /// Fail when any fail marker is present; anything else, including blank, passes.
    pub fn from_cell(text: &str) -> Judgment {
        let upper = text.trim().to_uppercase();
        if FAIL_MARKERS.iter().any(|m| upper.contains(m)) {
            Judgment::Fail
        } else {
            Judgment::Pass
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Judgment::Pass => "pass",
            Judgment::Fail => "fail",
        }
    }
}

/// One normalized strain row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub test_number: String,
    pub prescription_number: String,
    pub strain: Strain,
    pub cfu_day0: String,
    pub cfu_day7: String,
    pub cfu_day14: String,
    pub cfu_day28: String,
    pub judgment: Judgment,
    /// Serialized as "" when the page has no final judgment.
    #[serde(with = "blank_judgment")]
    pub final_judgment: Option<Judgment>,
}

impl TestRecord {
    pub fn cfu(&self, day: DayColumn) -> &str {
        match day {
            DayColumn::Day0 => &self.cfu_day0,
            DayColumn::Day7 => &self.cfu_day7,
            DayColumn::Day14 => &self.cfu_day14,
            DayColumn::Day28 => &self.cfu_day28,
        }
    }
}

mod blank_judgment {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Option<Judgment>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(v.map(Judgment::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Judgment>, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.as_str() {
            "" => Ok(None),
            "pass" => Ok(Some(Judgment::Pass)),
            "fail" => Ok(Some(Judgment::Fail)),
            other => Err(serde::de::Error::unknown_variant(other, &["", "pass", "fail"])),
        }
    }
}

/// Identifier pair in effect while scanning rows top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierContext {
    pub test_number: String,
    pub prescription_number: String,
}

impl IdentifierContext {
    /// Context after a row whose bulk-name cell reads `bulk_name`. Each field is
    /// replaced only by a non-empty extraction; blank text changes nothing.
    pub fn advance(self, bulk_name: &str) -> IdentifierContext {
        if bulk_name.trim().is_empty() {
            return self;
        }
        let Identifiers { test_number, prescription_number } = extract_identifiers(bulk_name);
        IdentifierContext {
            test_number: if test_number.is_empty() { self.test_number } else { test_number },
            prescription_number: if prescription_number.is_empty() {
                self.prescription_number
            } else {
                prescription_number
            },
        }
    }
}

pub fn assemble(matrix: &CellMatrix, columns: &ColumnMap, start_row: usize) -> Vec<TestRecord> {
    assemble_with(matrix, columns, start_row, &ValueNormalizer::default())
}

/// Walk rows from `start_row` down, emitting one record per strain row, then
/// order each run of same-test-number records by canonical strain order.
pub fn assemble_with(
    matrix: &CellMatrix,
    columns: &ColumnMap,
    start_row: usize,
    normalizer: &ValueNormalizer,
) -> Vec<TestRecord> {
    let (_, mut records) = (start_row..matrix.row_end()).filter(|r| matrix.row(*r).is_some()).fold(
        (IdentifierContext::default(), Vec::new()),
        |(ctx, mut records), row| {
            let ctx = advance_logged(ctx, matrix.text(row, columns.bulk_name), row);
            if let Some(record) = record_for_row(matrix, columns, row, &ctx, normalizer) {
                records.push(record);
            }
            (ctx, records)
        },
    );
    order_by_strain_within_tests(&mut records);
    records
}

fn advance_logged(ctx: IdentifierContext, bulk_name: &str, row: usize) -> IdentifierContext {
    let next = ctx.clone().advance(bulk_name);
    if next != ctx {
        tracing::info!(row, test_number = %next.test_number, prescription = %next.prescription_number, "identifier context changed");
    }
    next
}

fn record_for_row(
    matrix: &CellMatrix,
    columns: &ColumnMap,
    row: usize,
    ctx: &IdentifierContext,
    normalizer: &ValueNormalizer,
) -> Option<TestRecord> {
    let strain_text = matrix.get(row, columns.strain?)?;
    let strain = Strain::from_text(strain_text)?;

    let cfu = |day: DayColumn| {
        let raw = columns.cfu(day).map(|c| matrix.text(row, c)).unwrap_or("");
        normalizer.normalize(raw, strain, day)
    };
    let judgment = Judgment::from_cell(columns.judgment.map(|c| matrix.text(row, c)).unwrap_or(""));
    let final_judgment = columns
        .final_judgment
        .map(|c| matrix.text(row, c))
        .filter(|t| !t.is_empty())
        .map(Judgment::from_cell);

    Some(TestRecord {
        test_number: ctx.test_number.clone(),
        prescription_number: ctx.prescription_number.clone(),
        strain,
        cfu_day0: cfu(DayColumn::Day0),
        cfu_day7: cfu(DayColumn::Day7),
        cfu_day14: cfu(DayColumn::Day14),
        cfu_day28: cfu(DayColumn::Day28),
        judgment,
        final_judgment,
    })
}

/// Stable-sort each maximal run of equal test numbers by strain; runs keep their order.
pub fn order_by_strain_within_tests(records: &mut [TestRecord]) {
    for group in records.chunk_by_mut(|a, b| a.test_number == b.test_number) {
        group.sort_by_key(|r| r.strain);
    }
}
