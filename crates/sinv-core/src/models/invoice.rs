//! Supplier invoice and line item models.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A supplier-submitted bill awaiting or after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice identifier.
    pub id: i64,

    /// Supplier that submitted the file.
    pub supplier_id: i64,

    /// Location of the uploaded document.
    pub file_path: PathBuf,

    /// Declared document type.
    pub file_type: FileType,

    /// Processing status.
    pub status: InvoiceStatus,

    /// Sum of line item totals after the last successful run.
    pub total_amount: Decimal,

    /// When the last successful run committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// A freshly uploaded invoice that has not been processed yet.
    pub fn pending(id: i64, supplier_id: i64, file_path: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            id,
            supplier_id,
            file_path: file_path.into(),
            file_type,
            status: InvoiceStatus::Pending,
            total_amount: Decimal::ZERO,
            processed_at: None,
        }
    }
}

/// Type of the uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Spreadsheet (xlsx, xls, ods, csv).
    Excel,
    /// PDF document.
    Pdf,
}

impl FileType {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Excel => "excel",
            FileType::Pdf => "pdf",
        }
    }

    /// Parse the stored representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "excel" | "spreadsheet" => Some(FileType::Excel),
            "pdf" => Some(FileType::Pdf),
            _ => None,
        }
    }

    /// Workbook extensions opened through calamine. CSV is handled separately.
    pub const WORKBOOK_EXTENSIONS: &'static [&'static str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

    /// Infer the file type from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(FileType::Excel),
            "pdf" => Some(FileType::Pdf),
            ext if Self::WORKBOOK_EXTENSIONS.contains(&ext) => Some(FileType::Excel),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice processing status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Uploaded, not yet ingested.
    #[default]
    Pending,
    /// Line items loaded successfully.
    Processed,
    /// Marked failed by the caller after an unsuccessful run.
    Failed,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Processed => "processed",
            InvoiceStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "processed" => Some(InvoiceStatus::Processed),
            "failed" => Some(InvoiceStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized product line extracted from an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Owning invoice.
    pub invoice_id: i64,

    /// Supplier product code (never empty).
    pub product_code: String,

    /// Product description.
    pub description: String,

    /// Quantity (never zero).
    pub quantity: i64,

    /// Unit of measure.
    pub unit: String,

    /// Price per unit (always positive).
    pub unit_price: Decimal,

    /// `quantity * unit_price`.
    pub total_price: Decimal,

    /// Free-on-board price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fob_price: Option<Decimal>,

    /// Cubic measurement for freight volume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cbm: Option<Decimal>,
}

/// Running totals over accepted line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Number of accepted items.
    pub item_count: usize,

    /// Sum of `total_price`.
    pub total_amount: Decimal,

    /// Sum of `cbm` over items that carry one.
    pub total_cbm: Decimal,
}

impl InvoiceTotals {
    /// Fold one accepted item into the totals.
    pub fn add(&mut self, item: &LineItem) {
        self.item_count += 1;
        self.total_amount += item.total_price;
        if let Some(cbm) = item.cbm {
            self.total_cbm += cbm;
        }
    }

    /// Compute totals for a slice of items.
    pub fn from_items(items: &[LineItem]) -> Self {
        let mut totals = Self::default();
        for item in items {
            totals.add(item);
        }
        totals
    }
}

/// Outcome of a successful ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Processed invoice.
    pub invoice_id: i64,

    /// Number of line items written.
    pub item_count: usize,

    /// New invoice total.
    pub total_amount: Decimal,

    /// Informational freight volume.
    pub total_cbm: Decimal,

    /// Reader or PDF extractor that produced the document content.
    pub extractor: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(quantity: i64, unit_price: &str, cbm: Option<&str>) -> LineItem {
        let unit_price = Decimal::from_str(unit_price).unwrap();
        LineItem {
            invoice_id: 1,
            product_code: "SKU".to_string(),
            description: String::new(),
            quantity,
            unit: String::new(),
            unit_price,
            total_price: Decimal::from(quantity) * unit_price,
            fob_price: None,
            cbm: cbm.map(|c| Decimal::from_str(c).unwrap()),
        }
    }

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path(Path::new("a/b.XLSX")), Some(FileType::Excel));
        assert_eq!(FileType::from_path(Path::new("stock.csv")), Some(FileType::Excel));
        assert_eq!(FileType::from_path(Path::new("bill.pdf")), Some(FileType::Pdf));
        assert_eq!(FileType::from_path(Path::new("notes.txt")), None);
        assert_eq!(FileType::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_file_type_parse() {
        assert_eq!(FileType::parse("excel"), Some(FileType::Excel));
        assert_eq!(FileType::parse(" PDF "), Some(FileType::Pdf));
        assert_eq!(FileType::parse("docx"), None);
        assert_eq!(FileType::Pdf.to_string(), "pdf");
    }

    #[test]
    fn test_status_round_trip() {
        for status in [InvoiceStatus::Pending, InvoiceStatus::Processed, InvoiceStatus::Failed] {
            assert_eq!(InvoiceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(InvoiceStatus::parse("archived"), None);
    }

    #[test]
    fn test_totals_accumulate() {
        let items = vec![item(2, "10.50", Some("0.25")), item(3, "5", None)];
        let totals = InvoiceTotals::from_items(&items);

        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_amount, Decimal::from_str("36.00").unwrap());
        assert_eq!(totals.total_cbm, Decimal::from_str("0.25").unwrap());
    }
}
