//! Transactional replacement of an invoice's line items.

use chrono::Utc;
use sinv_core::{InvoiceTotals, LineItem};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbError;
use crate::repositories::{InvoiceRepo, ItemRepo};
use crate::Result;

/// Replace the items of `invoice_id` and mark it processed, all or nothing.
///
/// Within one transaction: existing items are deleted, `items` inserted in
/// order, and the invoice's status and `processed_at` updated. The invoice
/// total is always the sum of the inserted items' `total_price`. Any error
/// drops the transaction uncommitted, which rolls it back.
pub async fn load_items(pool: &SqlitePool, invoice_id: i64, items: &[LineItem]) -> Result<()> {
    let totals = InvoiceTotals::from_items(items);
    let mut tx = pool.begin().await?;

    if !InvoiceRepo::exists(&mut *tx, invoice_id).await? {
        return Err(DbError::InvoiceNotFound(invoice_id));
    }

    let removed = ItemRepo::delete_for_invoice(&mut *tx, invoice_id).await?;
    debug!("Removed {} previous items of invoice {}", removed, invoice_id);

    ItemRepo::insert_all(&mut *tx, invoice_id, items).await?;

    let updated = InvoiceRepo::mark_processed(&mut *tx, invoice_id, totals.total_amount, Utc::now()).await?;
    if updated == 0 {
        return Err(DbError::InvoiceNotFound(invoice_id));
    }

    tx.commit().await?;

    info!(
        "Loaded {} items into invoice {} (total {})",
        items.len(),
        invoice_id,
        totals.total_amount
    );
    Ok(())
}
