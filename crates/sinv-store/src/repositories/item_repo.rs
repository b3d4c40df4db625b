//! Repository for the `invoice_items` table.

use sinv_core::LineItem;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{decode_decimal, decode_optional_decimal};
use crate::Result;

/// Rows per multi-row INSERT; ten binds per row stays under SQLite's
/// bound parameter limit.
const INSERT_CHUNK: usize = 500;

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    invoice_id: i64,
    product_code: String,
    description: String,
    quantity: i64,
    unit: String,
    unit_price: String,
    total_price: String,
    fob_price: Option<String>,
    cbm: Option<String>,
}

impl TryFrom<ItemRow> for LineItem {
    type Error = crate::error::DbError;

    fn try_from(row: ItemRow) -> Result<Self> {
        Ok(LineItem {
            invoice_id: row.invoice_id,
            product_code: row.product_code,
            description: row.description,
            quantity: row.quantity,
            unit: row.unit,
            unit_price: decode_decimal("invoice_items.unit_price", &row.unit_price)?,
            total_price: decode_decimal("invoice_items.total_price", &row.total_price)?,
            fob_price: decode_optional_decimal("invoice_items.fob_price", row.fob_price.as_deref())?,
            cbm: decode_optional_decimal("invoice_items.cbm", row.cbm.as_deref())?,
        })
    }
}

/// Provides access to invoice line items.
pub struct ItemRepo;

impl ItemRepo {
    /// Delete every item of an invoice. Returns the number removed.
    pub async fn delete_for_invoice(conn: &mut SqliteConnection, invoice_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?")
            .bind(invoice_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert items under `invoice_id`, numbering them in slice order.
    pub async fn insert_all(
        conn: &mut SqliteConnection,
        invoice_id: i64,
        items: &[LineItem],
    ) -> Result<u64> {
        let mut inserted = 0;

        for (chunk_no, chunk) in items.chunks(INSERT_CHUNK).enumerate() {
            let offset = chunk_no * INSERT_CHUNK;
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO invoice_items (invoice_id, line_no, product_code, description, \
                 quantity, unit, unit_price, total_price, fob_price, cbm) ",
            );

            builder.push_values(chunk.iter().enumerate(), |mut b, (i, item)| {
                b.push_bind(invoice_id)
                    .push_bind((offset + i) as i64)
                    .push_bind(item.product_code.clone())
                    .push_bind(item.description.clone())
                    .push_bind(item.quantity)
                    .push_bind(item.unit.clone())
                    .push_bind(item.unit_price.to_string())
                    .push_bind(item.total_price.to_string())
                    .push_bind(item.fob_price.map(|d| d.to_string()))
                    .push_bind(item.cbm.map(|d| d.to_string()));
            });

            let result = builder.build().execute(&mut *conn).await?;
            inserted += result.rows_affected();
        }

        debug!("Inserted {} items for invoice {}", inserted, invoice_id);
        Ok(inserted)
    }

    /// Items of an invoice in source order.
    pub async fn list_for_invoice(pool: &SqlitePool, invoice_id: i64) -> Result<Vec<LineItem>> {
        sqlx::query_as::<_, ItemRow>(
            "SELECT invoice_id, product_code, description, quantity, unit, unit_price, \
             total_price, fob_price, cbm \
             FROM invoice_items WHERE invoice_id = ? ORDER BY line_no",
        )
        .bind(invoice_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(LineItem::try_from)
        .collect()
    }

    /// Number of items stored for an invoice.
    pub async fn count_for_invoice(pool: &SqlitePool, invoice_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items WHERE invoice_id = ?")
            .bind(invoice_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
