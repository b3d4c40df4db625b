//! Core library for supplier invoice ingestion.
//!
//! This crate provides:
//! - Document reading (spreadsheet rows, PDF text with a fallback chain)
//! - Template-driven field mapping for spreadsheets and PDF text
//! - Line item normalization and validation
//! - The invoice processor and the store seam it loads through

pub mod document;
pub mod error;
pub mod mapping;
pub mod models;
pub mod processor;
pub mod store;

pub use document::{DocumentReader, ExtractedDocument, PdfReader, PdfTextExtractor, RawContent};
pub use error::{DocumentError, ProcessingError, Result, SinvError, StoreError};
pub use mapping::{extract_items, FieldMap};
pub use models::config::SinvConfig;
pub use models::invoice::{FileType, Invoice, InvoiceStatus, InvoiceTotals, LineItem, ProcessingSummary};
pub use models::template::{Field, PdfTemplate, SpreadsheetTemplate, Template};
pub use processor::InvoiceProcessor;
pub use store::InvoiceStore;
