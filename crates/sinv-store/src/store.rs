//! [`InvoiceStore`] backed by the SQLite repositories.

use async_trait::async_trait;
use sinv_core::{FileType, Invoice, InvoiceStore, LineItem, StoreError, Template};
use sqlx::SqlitePool;

use crate::loader::load_items;
use crate::repositories::{InvoiceRepo, TemplateRepo};

/// SQL-backed store handed to the invoice processor.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl InvoiceStore for SqlStore {
    async fn invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, StoreError> {
        Ok(InvoiceRepo::find_by_id(&self.pool, invoice_id).await?)
    }

    async fn active_template(
        &self,
        supplier_id: i64,
        file_type: FileType,
    ) -> Result<Option<Template>, StoreError> {
        let record = TemplateRepo::find_active(&self.pool, supplier_id, file_type).await?;
        Ok(record.map(|r| r.template))
    }

    async fn replace_items(&self, invoice_id: i64, items: &[LineItem]) -> Result<(), StoreError> {
        Ok(load_items(&self.pool, invoice_id, items).await?)
    }
}
