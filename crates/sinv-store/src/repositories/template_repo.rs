//! Repository for the `invoice_templates` table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sinv_core::{FileType, Template};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::Result;

const COLUMNS: &str = "id, supplier_id, file_type, name, mapping, is_active, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: i64,
    supplier_id: i64,
    file_type: String,
    name: String,
    mapping: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

/// A stored template with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateRecord {
    pub id: i64,
    pub supplier_id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub template: Template,
}

impl TryFrom<TemplateRow> for TemplateRecord {
    type Error = DbError;

    fn try_from(row: TemplateRow) -> Result<Self> {
        let file_type = FileType::parse(&row.file_type).ok_or_else(|| {
            DbError::decode("invoice_templates.file_type", format!("unknown value {:?}", row.file_type))
        })?;
        let template = Template::from_mapping(file_type, &row.mapping)
            .map_err(|e| DbError::decode(format!("template {} mapping", row.id), e))?;

        Ok(TemplateRecord {
            id: row.id,
            supplier_id: row.supplier_id,
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
            template,
        })
    }
}

/// Provides access to per-supplier mapping templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// The active template for a supplier and file type.
    pub async fn find_active(
        pool: &SqlitePool,
        supplier_id: i64,
        file_type: FileType,
    ) -> Result<Option<TemplateRecord>> {
        let query = format!(
            "SELECT {COLUMNS} FROM invoice_templates \
             WHERE supplier_id = ? AND file_type = ? AND is_active = 1"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(supplier_id)
            .bind(file_type.as_str())
            .fetch_optional(pool)
            .await?
            .map(TemplateRecord::try_from)
            .transpose()
    }

    /// All templates of a supplier, newest first.
    pub async fn list_for_supplier(pool: &SqlitePool, supplier_id: i64) -> Result<Vec<TemplateRecord>> {
        let query = format!(
            "SELECT {COLUMNS} FROM invoice_templates WHERE supplier_id = ? ORDER BY id DESC"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(supplier_id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(TemplateRecord::try_from)
            .collect()
    }

    /// Store a template and make it the active one for its supplier and file
    /// type. The previously active template is kept but deactivated.
    pub async fn activate(
        pool: &SqlitePool,
        supplier_id: i64,
        name: &str,
        template: &Template,
    ) -> Result<TemplateRecord> {
        let file_type = template.file_type();
        let mapping = template.to_mapping()?;

        let mut tx = pool.begin().await?;

        let replaced = sqlx::query(
            "UPDATE invoice_templates SET is_active = 0 \
             WHERE supplier_id = ? AND file_type = ? AND is_active = 1",
        )
        .bind(supplier_id)
        .bind(file_type.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let query = format!(
            "INSERT INTO invoice_templates (supplier_id, file_type, name, mapping, is_active) \
             VALUES (?, ?, ?, ?, 1) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TemplateRow>(&query)
            .bind(supplier_id)
            .bind(file_type.as_str())
            .bind(name)
            .bind(&mapping)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "Activated {} template {:?} for supplier {} ({} replaced)",
            file_type, name, supplier_id, replaced
        );
        row.try_into()
    }

    /// Deactivate the supplier's template for a file type.
    ///
    /// Returns `true` if an active template existed.
    pub async fn deactivate(pool: &SqlitePool, supplier_id: i64, file_type: FileType) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE invoice_templates SET is_active = 0 \
             WHERE supplier_id = ? AND file_type = ? AND is_active = 1",
        )
        .bind(supplier_id)
        .bind(file_type.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
