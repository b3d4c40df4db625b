//! Error types for the sinv-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::invoice::FileType;

/// Main error type for invoice ingestion.
#[derive(Error, Debug)]
pub enum SinvError {
    /// The source document is missing, corrupt, or has no extractable content.
    #[error("document unreadable: {0}")]
    DocumentUnreadable(#[from] DocumentError),

    /// No active template is configured for the supplier and file type.
    #[error("no active {file_type} template for supplier {supplier_id}")]
    TemplateMissing { supplier_id: i64, file_type: FileType },

    /// Mapping or persistence failed; nothing was committed.
    #[error("processing invoice {invoice_id} failed: {source}")]
    ProcessingFailed {
        invoice_id: i64,
        #[source]
        source: ProcessingError,
    },
}

/// Errors raised while reading a source document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file extension is not a supported spreadsheet container.
    #[error("unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),

    /// Failed to open or parse a spreadsheet.
    #[error("failed to parse spreadsheet: {0}")]
    Spreadsheet(String),

    /// The spreadsheet has no rows.
    #[error("spreadsheet has no rows")]
    NoRows,

    /// Failed to extract text from a PDF.
    #[error("failed to extract PDF text: {0}")]
    Pdf(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// None of the text extractors recovered any text.
    #[error("no text could be extracted")]
    NoText,

    /// I/O error while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Causes wrapped by [`SinvError::ProcessingFailed`].
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// A template pattern is not a valid regular expression.
    #[error("invalid pattern for {field}: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// The active template does not describe the invoice's file type.
    #[error("template is for {found} files but invoice is {expected}")]
    TemplateMismatch { expected: FileType, found: FileType },

    /// Persistence failed and the transaction was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors reported by an [`InvoiceStore`](crate::store::InvoiceStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The invoice row does not exist.
    #[error("invoice {0} not found")]
    InvoiceNotFound(i64),

    /// A stored value could not be decoded.
    #[error("failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    /// Backend failure (connection, query, transaction).
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap a backend-specific error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Result type for the sinv library.
pub type Result<T> = std::result::Result<T, SinvError>;
