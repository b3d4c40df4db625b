//! End-to-end ingestion of one invoice.

use tracing::{debug, info};

use crate::document::DocumentReader;
use crate::error::{ProcessingError, Result, SinvError};
use crate::mapping;
use crate::models::invoice::{Invoice, InvoiceTotals, ProcessingSummary};
use crate::store::InvoiceStore;

/// Reads an invoice document, maps it through the supplier's active template,
/// and loads the accepted line items.
///
/// Runs for different invoices may overlap. Runs for the same invoice id must
/// be serialized by the caller: the delete-then-insert load is not guarded
/// against a concurrent run on the same invoice.
pub struct InvoiceProcessor<S> {
    store: S,
    reader: DocumentReader,
}

impl<S: InvoiceStore> InvoiceProcessor<S> {
    pub fn new(store: S, reader: DocumentReader) -> Self {
        Self { store, reader }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingest one invoice, all or nothing.
    ///
    /// The template is looked up before anything is written, so a missing
    /// template leaves the invoice and its items untouched. The invoice status
    /// is never set to failed here; recording failures is up to the caller.
    pub async fn process_invoice(&self, invoice: &Invoice) -> Result<ProcessingSummary> {
        info!(
            "Processing invoice {} ({} from supplier {})",
            invoice.id, invoice.file_type, invoice.supplier_id
        );

        let template = self
            .store
            .active_template(invoice.supplier_id, invoice.file_type)
            .await
            .map_err(|e| failed(invoice.id, e.into()))?
            .ok_or(SinvError::TemplateMissing {
                supplier_id: invoice.supplier_id,
                file_type: invoice.file_type,
            })?;

        let document = self.reader.read(&invoice.file_path, invoice.file_type)?;
        debug!("Read {} with {}", invoice.file_path.display(), document.extractor);

        let items = mapping::extract_items(invoice.id, &document.content, &template)
            .map_err(|e| failed(invoice.id, e))?;
        let totals = InvoiceTotals::from_items(&items);

        self.store
            .replace_items(invoice.id, &items)
            .await
            .map_err(|e| failed(invoice.id, e.into()))?;

        info!(
            "Invoice {} processed: {} items, total {}",
            invoice.id, totals.item_count, totals.total_amount
        );

        Ok(ProcessingSummary {
            invoice_id: invoice.id,
            item_count: totals.item_count,
            total_amount: totals.total_amount,
            total_cbm: totals.total_cbm,
            extractor: document.extractor.to_string(),
        })
    }

    /// Fetch an invoice by id and ingest it.
    pub async fn process_by_id(&self, invoice_id: i64) -> Result<ProcessingSummary> {
        let invoice = self
            .store
            .invoice(invoice_id)
            .await
            .map_err(|e| failed(invoice_id, e.into()))?
            .ok_or_else(|| {
                failed(invoice_id, crate::error::StoreError::InvoiceNotFound(invoice_id).into())
            })?;

        self.process_invoice(&invoice).await
    }
}

fn failed(invoice_id: i64, source: ProcessingError) -> SinvError {
    SinvError::ProcessingFailed { invoice_id, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PdfReader, RawStreamScan, SpreadsheetReader};
    use crate::error::{DocumentError, StoreError};
    use crate::models::invoice::{FileType, InvoiceStatus, LineItem};
    use crate::models::template::{Field, SpreadsheetTemplate, Template};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::{BTreeMap, HashMap};
    use std::path::PathBuf;
    use std::str::FromStr;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        invoices: Mutex<HashMap<i64, Invoice>>,
        templates: HashMap<(i64, FileType), Template>,
        items: Mutex<HashMap<i64, Vec<LineItem>>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl InvoiceStore for MemoryStore {
        async fn invoice(&self, invoice_id: i64) -> std::result::Result<Option<Invoice>, StoreError> {
            Ok(self.invoices.lock().unwrap().get(&invoice_id).cloned())
        }

        async fn active_template(
            &self,
            supplier_id: i64,
            file_type: FileType,
        ) -> std::result::Result<Option<Template>, StoreError> {
            Ok(self.templates.get(&(supplier_id, file_type)).cloned())
        }

        async fn replace_items(
            &self,
            invoice_id: i64,
            items: &[LineItem],
        ) -> std::result::Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::backend(std::io::Error::other("disk full")));
            }
            let mut invoices = self.invoices.lock().unwrap();
            let invoice = invoices
                .get_mut(&invoice_id)
                .ok_or(StoreError::InvoiceNotFound(invoice_id))?;
            invoice.total_amount = InvoiceTotals::from_items(items).total_amount;
            invoice.status = InvoiceStatus::Processed;
            self.items.lock().unwrap().insert(invoice_id, items.to_vec());
            Ok(())
        }
    }

    fn reader() -> DocumentReader {
        DocumentReader::with_parts(
            SpreadsheetReader::new(),
            PdfReader::with_extractors(vec![Box::new(RawStreamScan)], 1),
        )
    }

    fn fixture(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("invoice.csv");
        std::fs::write(
            &path,
            "Code,Description,Qty,Price\nA-100,Widget,2,25.00\nB-200,Gadget,0,40.00\nC-300,Thing,4,25.00\n",
        )
        .unwrap();
        path
    }

    fn store_with(invoice: &Invoice, with_template: bool) -> MemoryStore {
        let mut store = MemoryStore::default();
        store.invoices.lock().unwrap().insert(invoice.id, invoice.clone());
        if with_template {
            store.templates.insert(
                (invoice.supplier_id, FileType::Excel),
                Template::Spreadsheet(SpreadsheetTemplate {
                    start_row: 1,
                    columns: BTreeMap::from([
                        (Field::ProductCode, 0),
                        (Field::Description, 1),
                        (Field::Quantity, 2),
                        (Field::UnitPrice, 3),
                    ]),
                }),
            );
        }
        store
    }

    #[tokio::test]
    async fn test_process_and_reprocess_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let invoice = Invoice::pending(1, 10, fixture(&dir), FileType::Excel);
        let processor = InvoiceProcessor::new(store_with(&invoice, true), reader());

        let first = processor.process_invoice(&invoice).await.unwrap();
        let first_items = processor.store().items.lock().unwrap()[&1].clone();
        let second = processor.process_by_id(1).await.unwrap();
        let second_items = processor.store().items.lock().unwrap()[&1].clone();

        assert_eq!(first, second);
        assert_eq!(first.item_count, 2);
        assert_eq!(first.total_amount, Decimal::from_str("150.00").unwrap());
        assert_eq!(first.extractor, "csv");
        assert_eq!(first_items, second_items);

        let stored = processor.store().invoices.lock().unwrap()[&1].clone();
        assert_eq!(stored.status, InvoiceStatus::Processed);
        assert_eq!(stored.total_amount, first.total_amount);
    }

    #[tokio::test]
    async fn test_missing_template_leaves_invoice_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let invoice = Invoice::pending(2, 10, fixture(&dir), FileType::Excel);
        let processor = InvoiceProcessor::new(store_with(&invoice, false), reader());

        let err = processor.process_invoice(&invoice).await.unwrap_err();
        assert!(matches!(
            err,
            SinvError::TemplateMissing { supplier_id: 10, file_type: FileType::Excel }
        ));
        assert!(processor.store().items.lock().unwrap().is_empty());
        assert_eq!(
            processor.store().invoices.lock().unwrap()[&2].status,
            InvoiceStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_unreadable_document() {
        let invoice = Invoice::pending(3, 10, "/nonexistent/invoice.csv", FileType::Excel);
        let processor = InvoiceProcessor::new(store_with(&invoice, true), reader());

        let err = processor.process_invoice(&invoice).await.unwrap_err();
        assert!(matches!(err, SinvError::DocumentUnreadable(DocumentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_processing_failed() {
        let dir = tempfile::tempdir().unwrap();
        let invoice = Invoice::pending(4, 10, fixture(&dir), FileType::Excel);
        let mut store = store_with(&invoice, true);
        store.fail_writes = true;
        let processor = InvoiceProcessor::new(store, reader());

        let err = processor.process_invoice(&invoice).await.unwrap_err();
        assert!(matches!(
            err,
            SinvError::ProcessingFailed { invoice_id: 4, source: ProcessingError::Store(_) }
        ));
        assert_eq!(
            processor.store().invoices.lock().unwrap()[&4].status,
            InvoiceStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_unknown_invoice_id() {
        let processor = InvoiceProcessor::new(MemoryStore::default(), reader());

        let err = processor.process_by_id(99).await.unwrap_err();
        assert!(matches!(
            err,
            SinvError::ProcessingFailed {
                invoice_id: 99,
                source: ProcessingError::Store(StoreError::InvoiceNotFound(99))
            }
        ));
    }
}
