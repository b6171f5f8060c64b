use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One recognized table cell as delivered by an OCR backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// Sparse row/column grid of trimmed cell text.
///
/// Rows and columns are kept in ascending index order so every scan over the
/// matrix is deterministic regardless of the order cells were recognized in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CellList", into = "CellList")]
pub struct CellMatrix {
    rows: BTreeMap<usize, BTreeMap<usize, String>>,
}

#[derive(Serialize, Deserialize)]
struct CellList {
    cells: Vec<Cell>,
}

impl From<CellList> for CellMatrix {
    fn from(list: CellList) -> Self {
        let mut m = CellMatrix::new();
        for c in list.cells {
            m.insert(c.row, c.col, &c.text);
        }
        m
    }
}

impl From<CellMatrix> for CellList {
    fn from(m: CellMatrix) -> Self {
        CellList { cells: m.cells().collect() }
    }
}

impl CellMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dense matrix from rows of text; empty strings become absent cells.
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut m = CellMatrix::new();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, text) in row.into_iter().enumerate() {
                if !text.as_ref().trim().is_empty() {
                    m.insert(r, c, text.as_ref());
                }
            }
        }
        m
    }

    /// Insert a cell; text is trimmed. A later insert at the same slot replaces the earlier one.
    pub fn insert(&mut self, row: usize, col: usize, text: &str) {
        self.rows.entry(row).or_default().insert(col, text.trim().to_string());
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(&row).and_then(|r| r.get(&col)).map(|s| s.as_str())
    }

    /// Cell text or "" when the slot is absent.
    pub fn text(&self, row: usize, col: usize) -> &str {
        self.get(row, col).unwrap_or("")
    }

    pub fn row(&self, row: usize) -> Option<&BTreeMap<usize, String>> {
        self.rows.get(&row)
    }

    /// Cells of one row in column order.
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = (usize, &str)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|r| r.iter().map(|(c, t)| (*c, t.as_str())))
    }

    /// All cell texts of one row joined with a single space.
    pub fn row_text(&self, row: usize) -> String {
        self.row_cells(row).map(|(_, t)| t).collect::<Vec<_>>().join(" ")
    }

    /// One past the highest populated row index (0 for an empty matrix).
    pub fn row_end(&self) -> usize {
        self.rows.keys().next_back().map(|r| r + 1).unwrap_or(0)
    }

    pub fn row_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|r| r.is_empty())
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.rows.iter().flat_map(|(r, cols)| {
            cols.iter().map(move |(c, t)| Cell { row: *r, col: *c, text: t.clone() })
        })
    }
}
