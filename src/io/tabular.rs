//! Tabular source abstraction
//!
//! Parsers never see files. A [`TabularReader`] turns a source into a
//! [`Table`]: the first row as header, every following row as text cells.
//! Each row keeps its data row number, counted from the header, so lines the
//! source drops still count.

use crate::types::DecodeError;
use std::path::Path;

/// Header plus data rows of the first sheet of a source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-indexed data row number of each entry of `rows`
    pub row_numbers: Vec<usize>,
}

impl Table {
    /// Table whose rows are numbered consecutively from 1
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_numbers = (1..=rows.len()).collect();
        Table {
            header,
            rows,
            row_numbers,
        }
    }

    pub fn with_row_numbers(
        header: Vec<String>,
        rows: Vec<Vec<String>>,
        row_numbers: Vec<usize>,
    ) -> Self {
        Table {
            header,
            rows,
            row_numbers,
        }
    }

    /// Data row number of `rows[index]`
    pub fn row_number(&self, index: usize) -> usize {
        self.row_numbers.get(index).copied().unwrap_or(index + 1)
    }

    /// Number of rows with at least one non-blank cell
    pub fn data_row_count(&self) -> usize {
        self.rows.iter().filter(|row| !is_blank(row)).count()
    }
}


/// `true` when every cell of `row` is empty or whitespace
pub fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Decoder of a spreadsheet-like source
pub trait TabularReader: Send + Sync {
    /// Decode the first sheet of `path`
    ///
    /// # Errors
    ///
    /// - `DecodeError::NotFound` when the path does not exist
    /// - `DecodeError::InvalidWorkbook` / `InvalidSheet` / `BadFormat` when the
    ///   content cannot be decoded
    /// - `DecodeError::Empty` when there is no header or no data row
    fn decode(&self, path: &Path) -> Result<Table, DecodeError>;
}
