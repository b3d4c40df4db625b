//! Document reading: raw rows from spreadsheets, linearized text from PDFs.

mod pdf;
mod raw;
mod spreadsheet;

pub use pdf::{EmbeddedText, ExternalTool, PdfReader, PdfTextExtractor};
pub use raw::{scan_bytes, RawStreamScan};
pub use spreadsheet::SpreadsheetReader;

use std::path::Path;

use tracing::debug;

use crate::error::DocumentError;
use crate::models::config::SinvConfig;
use crate::models::invoice::FileType;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Raw content recovered from a document, before any template is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    /// Sheet rows in order, each an ordered list of cell strings.
    Rows(Vec<Vec<String>>),
    /// Full extracted text.
    Text(String),
}

/// A document read from disk.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Recovered content.
    pub content: RawContent,
    /// Name of the reader or extractor that produced it.
    pub extractor: &'static str,
}

/// Reads invoice documents according to their declared file type.
pub struct DocumentReader {
    spreadsheet: SpreadsheetReader,
    pdf: PdfReader,
}

impl DocumentReader {
    /// Build a reader from configuration, probing for the external PDF tool.
    pub fn new(config: &SinvConfig) -> Self {
        Self {
            spreadsheet: SpreadsheetReader::from_config(&config.spreadsheet),
            pdf: PdfReader::from_config(&config.pdf),
        }
    }

    /// Build a reader from explicit parts.
    pub fn with_parts(spreadsheet: SpreadsheetReader, pdf: PdfReader) -> Self {
        Self { spreadsheet, pdf }
    }

    /// Read a document.
    pub fn read(&self, path: &Path, file_type: FileType) -> Result<ExtractedDocument> {
        if !path.is_file() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        debug!("Reading {} document {}", file_type, path.display());

        match file_type {
            FileType::Excel => {
                let rows = self.spreadsheet.read(path)?;
                Ok(ExtractedDocument {
                    content: RawContent::Rows(rows),
                    extractor: self.spreadsheet.name(path),
                })
            }
            FileType::Pdf => {
                let (text, extractor) = self.pdf.read(path)?;
                Ok(ExtractedDocument {
                    content: RawContent::Text(text),
                    extractor,
                })
            }
        }
    }
}

impl Default for DocumentReader {
    fn default() -> Self {
        Self::new(&SinvConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_unreadable() {
        let reader = DocumentReader::with_parts(
            SpreadsheetReader::default(),
            PdfReader::with_extractors(vec![Box::new(RawStreamScan)], 1),
        );

        let err = reader
            .read(Path::new("/nonexistent/invoice.xlsx"), FileType::Excel)
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[test]
    fn test_reads_csv_as_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.csv");
        std::fs::write(&path, "code,qty\nA1,2\n").unwrap();

        let reader = DocumentReader::with_parts(
            SpreadsheetReader::default(),
            PdfReader::with_extractors(vec![Box::new(RawStreamScan)], 1),
        );
        let doc = reader.read(&path, FileType::Excel).unwrap();

        assert_eq!(doc.extractor, "csv");
        assert_eq!(
            doc.content,
            RawContent::Rows(vec![
                vec!["code".to_string(), "qty".to_string()],
                vec!["A1".to_string(), "2".to_string()],
            ])
        );
    }
}
