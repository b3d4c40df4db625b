//! Data models for invoices, templates, and configuration.

pub mod config;
pub mod invoice;
pub mod template;

pub use config::SinvConfig;
pub use invoice::{FileType, Invoice, InvoiceStatus, InvoiceTotals, LineItem, ProcessingSummary};
pub use template::{Field, PdfTemplate, SpreadsheetTemplate, Template};
