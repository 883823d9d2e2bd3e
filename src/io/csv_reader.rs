//! CSV implementation of [`TabularReader`]
//!
//! A CSV file is treated as a single-sheet workbook: the first record is the
//! header, every following record a data row. Cells are trimmed. Completely
//! empty lines are skipped by the CSV reader itself, so each row is numbered
//! from its file line rather than its position among the records.
//!
//! # Error Handling
//!
//! - Missing file: `DecodeError::NotFound`
//! - Unreadable file or non UTF-8 content: `DecodeError::InvalidWorkbook`
//! - Blank or duplicate header names: `DecodeError::InvalidSheet`
//! - Record with a different number of fields than the header:
//!   `DecodeError::BadFormat` with the 1-indexed file line
//! - No header, or no non-blank data row: `DecodeError::Empty`

use crate::io::tabular::{is_blank, Table, TabularReader};
use crate::types::DecodeError;
use csv::{ErrorKind, ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// CSV decoder
#[derive(Debug, Clone, Copy)]
pub struct CsvTabularReader {
    delimiter: u8,
}

impl Default for CsvTabularReader {
    fn default() -> Self {
        CsvTabularReader { delimiter: b',' }
    }
}

impl CsvTabularReader {
    pub fn new(delimiter: u8) -> Self {
        CsvTabularReader { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl TabularReader for CsvTabularReader {
    fn decode(&self, path: &Path) -> Result<Table, DecodeError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(DecodeError::NotFound { path: display });
        }

        let file = File::open(path).map_err(|e| DecodeError::InvalidWorkbook {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(false)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        let mut records = reader.records();

        let (header, header_line) = match records.next() {
            None => return Err(DecodeError::Empty { path: display }),
            Some(record) => {
                let record = record.map_err(|e| decode_error(&display, e))?;
                (header_cells(&record)?, line_of(&record))
            }
        };

        let mut rows = Vec::new();
        let mut row_numbers = Vec::new();
        for record in records {
            let record = record.map_err(|e| decode_error(&display, e))?;
            let number = line_of(&record).saturating_sub(header_line);
            row_numbers.push(usize::try_from(number).unwrap_or(usize::MAX));
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.iter().all(|row| is_blank(row)) {
            return Err(DecodeError::Empty { path: display });
        }

        Ok(Table::with_row_numbers(header, rows, row_numbers))
    }
}

/// 1-indexed file line a record starts on
fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|pos| pos.line()).unwrap_or(0)
}

/// Validate and normalize the header record
fn header_cells(record: &StringRecord) -> Result<Vec<String>, DecodeError> {
    let header: Vec<String> = record
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if i == 0 {
                cell.trim_start_matches(BYTE_ORDER_MARK).trim().to_string()
            } else {
                cell.to_string()
            }
        })
        .collect();

    if is_blank(&header) {
        return Err(DecodeError::InvalidSheet {
            reason: "header row is blank".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for name in header.iter().filter(|name| !name.is_empty()) {
        if !seen.insert(name.as_str()) {
            return Err(DecodeError::InvalidSheet {
                reason: format!("duplicate column '{}'", name),
            });
        }
    }

    Ok(header)
}

fn decode_error(path: &str, error: csv::Error) -> DecodeError {
    let line = error.position().map(|pos| pos.line()).unwrap_or(0);
    match error.kind() {
        ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => DecodeError::BadFormat {
            line,
            reason: format!("expected {} fields, found {}", expected_len, len),
        },
        ErrorKind::Io(_) | ErrorKind::Utf8 { .. } => DecodeError::InvalidWorkbook {
            path: path.to_string(),
            reason: error.to_string(),
        },
        _ => DecodeError::BadFormat {
            line,
            reason: error.to_string(),
        },
    }
}
