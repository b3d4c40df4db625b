//! Spreadsheet row extraction using calamine and csv.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::{debug, trace};

use super::Result;
use crate::error::DocumentError;
use crate::models::config::SpreadsheetConfig;
use crate::models::invoice::FileType;

/// Reads every row of one worksheet, header rows included.
#[derive(Debug, Clone)]
pub struct SpreadsheetReader {
    sheet: Option<String>,
    csv_delimiter: u8,
}

impl SpreadsheetReader {
    /// Create a reader for the first sheet with comma-separated CSV.
    pub fn new() -> Self {
        Self {
            sheet: None,
            csv_delimiter: b',',
        }
    }

    pub fn from_config(config: &SpreadsheetConfig) -> Self {
        let csv_delimiter = if config.csv_delimiter.is_ascii() {
            config.csv_delimiter as u8
        } else {
            b','
        };
        Self {
            sheet: config.sheet.clone(),
            csv_delimiter,
        }
    }

    /// Read a named worksheet instead of the first one.
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Reader name reported for a path.
    pub fn name(&self, path: &Path) -> &'static str {
        if is_csv(path) { "csv" } else { "calamine" }
    }

    /// Read all rows. Row and column indices are absolute sheet positions.
    pub fn read(&self, path: &Path) -> Result<Vec<Vec<String>>> {
        let rows = if is_csv(path) {
            self.read_csv(path)?
        } else {
            self.read_workbook(path)?
        };

        if rows.is_empty() {
            return Err(DocumentError::NoRows);
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    fn read_workbook(&self, path: &Path) -> Result<Vec<Vec<String>>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !FileType::WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            return Err(DocumentError::UnsupportedFormat(extension));
        }

        let mut workbook =
            open_workbook_auto(path).map_err(|e| DocumentError::Spreadsheet(e.to_string()))?;

        let range = match &self.sheet {
            Some(name) => workbook
                .worksheet_range(name)
                .map_err(|e| DocumentError::Spreadsheet(format!("sheet {}: {}", name, e)))?,
            None => workbook
                .worksheet_range_at(0)
                .ok_or(DocumentError::NoRows)?
                .map_err(|e| DocumentError::Spreadsheet(e.to_string()))?,
        };

        Ok(range_rows(&range))
    }

    fn read_csv(&self, path: &Path) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.csv_delimiter)
            .from_path(path)
            .map_err(|e| DocumentError::Spreadsheet(e.to_string()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DocumentError::Spreadsheet(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if let Some(first) = rows.first_mut().and_then(|row| row.first_mut()) {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }

        Ok(rows)
    }
}

impl Default for SpreadsheetReader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Flatten a used range into rows addressed from A1.
///
/// calamine trims leading empty rows and columns from the used range, so they
/// are padded back to keep template indices absolute.
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    trace!("Used range starts at row {}, column {}", start_row, start_col);

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    rows
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}
