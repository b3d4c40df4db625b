//! Table-level repositories.
//!
//! Each repository is a zero-sized struct with associated async functions.
//! Reads take the pool; writes that must join a transaction take a connection
//! so callers can pass `&mut *tx`.

mod invoice_repo;
mod item_repo;
mod template_repo;

pub use invoice_repo::InvoiceRepo;
pub use item_repo::ItemRepo;
pub use template_repo::{TemplateRecord, TemplateRepo};

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::DbError;
use crate::Result;

/// Decode a money column stored as a decimal string.
pub(crate) fn decode_decimal(what: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| DbError::decode(what, e))
}

fn decode_optional_decimal(what: &str, raw: Option<&str>) -> Result<Option<Decimal>> {
    raw.map(|s| decode_decimal(what, s)).transpose()
}
