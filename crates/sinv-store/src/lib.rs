//! SQLite persistence for supplier invoice ingestion.
//!
//! This crate provides:
//! - Pool construction with embedded migrations
//! - Repositories for invoices, line items and mapping templates
//! - The transactional line item loader
//! - [`SqlStore`], the [`sinv_core::InvoiceStore`] implementation

pub mod error;
pub mod loader;
pub mod pool;
pub mod repositories;
pub mod store;

pub use error::DbError;
pub use loader::load_items;
pub use pool::{create_pool, memory_pool, MIGRATOR};
pub use repositories::{InvoiceRepo, ItemRepo, TemplateRecord, TemplateRepo};
pub use sqlx::SqlitePool;
pub use store::SqlStore;

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
