//! Persistence seam consumed by the invoice processor.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::invoice::{FileType, Invoice, LineItem};
use crate::models::template::Template;

/// Template lookup and transactional item loading.
///
/// Implementations back this with a relational store holding `invoices`,
/// `invoice_items` and template rows.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Fetch an invoice record.
    async fn invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, StoreError>;

    /// The active template for a supplier and file type, if one is configured.
    async fn active_template(
        &self,
        supplier_id: i64,
        file_type: FileType,
    ) -> Result<Option<Template>, StoreError>;

    /// Atomically replace the invoice's line items and mark it processed.
    ///
    /// Existing items are deleted, `items` inserted, and the invoice's status
    /// and processing timestamp updated in one transaction. The stored total
    /// is the sum of the inserted items' `total_price`. On error nothing is
    /// visible: prior items and invoice state are intact.
    async fn replace_items(&self, invoice_id: i64, items: &[LineItem]) -> Result<(), StoreError>;
}
