//! Repository for the `invoices` table.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sinv_core::{FileType, Invoice, InvoiceStatus};
use sqlx::{SqliteConnection, SqlitePool};

use super::decode_decimal;
use crate::error::DbError;
use crate::Result;

/// Column list for the `invoices` table.
const COLUMNS: &str = "id, supplier_id, file_path, file_type, status, total_amount, processed_at";

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: i64,
    supplier_id: i64,
    file_path: String,
    file_type: String,
    status: String,
    total_amount: String,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> Result<Self> {
        let file_type = FileType::parse(&row.file_type)
            .ok_or_else(|| DbError::decode("invoices.file_type", format!("unknown value {:?}", row.file_type)))?;
        let status = InvoiceStatus::parse(&row.status)
            .ok_or_else(|| DbError::decode("invoices.status", format!("unknown value {:?}", row.status)))?;

        Ok(Invoice {
            id: row.id,
            supplier_id: row.supplier_id,
            file_path: PathBuf::from(row.file_path),
            file_type,
            status,
            total_amount: decode_decimal("invoices.total_amount", &row.total_amount)?,
            processed_at: row.processed_at,
        })
    }
}

/// Provides access to invoice records.
pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Register an uploaded document as a pending invoice.
    pub async fn create(
        pool: &SqlitePool,
        supplier_id: i64,
        file_path: &Path,
        file_type: FileType,
    ) -> Result<Invoice> {
        let query = format!(
            "INSERT INTO invoices (supplier_id, file_path, file_type, status, total_amount) \
             VALUES (?, ?, ?, 'pending', '0') \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(supplier_id)
            .bind(file_path.to_string_lossy().into_owned())
            .bind(file_type.as_str())
            .fetch_one(pool)
            .await?;

        row.try_into()
    }

    /// Find an invoice by id.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Invoice>> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = ?");
        sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(Invoice::try_from)
            .transpose()
    }

    /// List invoices in a given status, oldest first.
    pub async fn list_by_status(
        pool: &SqlitePool,
        status: InvoiceStatus,
        limit: i64,
    ) -> Result<Vec<Invoice>> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE status = ? ORDER BY id LIMIT ?");
        sqlx::query_as::<_, InvoiceRow>(&query)
            .bind(status.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Invoice::try_from)
            .collect()
    }

    /// Whether an invoice row exists, checked on the given connection.
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(found.is_some())
    }

    /// Record a successful run. Returns the number of rows updated.
    pub async fn mark_processed(
        conn: &mut SqliteConnection,
        id: i64,
        total_amount: Decimal,
        processed_at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE invoices SET total_amount = ?, status = 'processed', processed_at = ? WHERE id = ?",
        )
        .bind(total_amount.to_string())
        .bind(processed_at)
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Set the status to `failed`. Items and totals are left as they are.
    ///
    /// Returns `true` if the invoice exists.
    pub async fn mark_failed(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE invoices SET status = 'failed' WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an invoice. Its line items go with it.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
