//! Template-driven field mapping and line item normalization.

mod lines;
mod normalize;
pub mod numbers;
mod rows;

pub use lines::{map_lines, CompiledPdfTemplate, LineMapper};
pub use normalize::normalize;
pub use numbers::{parse_amount, parse_quantity};
pub use rows::map_rows;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::document::RawContent;
use crate::error::ProcessingError;
use crate::models::invoice::{FileType, LineItem};
use crate::models::template::{Field, Template};

/// Untyped field values lifted from one row or line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMap(BTreeMap<Field, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of a field, if the template mapped and found it.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

impl<const N: usize> From<[(Field, &str); N]> for FieldMap {
    fn from(pairs: [(Field, &str); N]) -> Self {
        Self(pairs.into_iter().map(|(f, v)| (f, v.to_string())).collect())
    }
}

/// Candidate field maps for a document, in source order.
pub fn candidates<'a>(
    content: &'a RawContent,
    template: &'a Template,
) -> Result<Box<dyn Iterator<Item = FieldMap> + 'a>, ProcessingError> {
    match (content, template) {
        (RawContent::Rows(rows), Template::Spreadsheet(t)) => Ok(Box::new(map_rows(rows, t))),
        (RawContent::Text(text), Template::Pdf(t)) => {
            let compiled = CompiledPdfTemplate::compile(t)?;
            Ok(Box::new(LineMapper::new(text, compiled)))
        }
        (RawContent::Rows(_), _) => Err(ProcessingError::TemplateMismatch {
            expected: FileType::Excel,
            found: template.file_type(),
        }),
        (RawContent::Text(_), _) => Err(ProcessingError::TemplateMismatch {
            expected: FileType::Pdf,
            found: template.file_type(),
        }),
    }
}

/// Map and normalize a document into accepted line items.
///
/// Candidates that fail validation are dropped without trace.
pub fn extract_items(
    invoice_id: i64,
    content: &RawContent,
    template: &Template,
) -> Result<Vec<LineItem>, ProcessingError> {
    Ok(candidates(content, template)?
        .filter_map(|fields| normalize(invoice_id, &fields))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::InvoiceTotals;
    use crate::models::template::{PdfTemplate, SpreadsheetTemplate};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn rows(data: &[&[&str]]) -> RawContent {
        RawContent::Rows(
            data.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_spreadsheet_header_and_zero_quantity_row() {
        let content = rows(&[
            &["Code", "Description", "Qty", "Price"],
            &["A-100", "Widget", "2", "25.00"],
            &["B-200", "Gadget", "0", "40.00"],
            &["C-300", "Doohickey", "4", "25.00"],
        ]);
        let template = Template::Spreadsheet(SpreadsheetTemplate {
            start_row: 1,
            columns: BTreeMap::from([
                (Field::ProductCode, 0),
                (Field::Quantity, 2),
                (Field::UnitPrice, 3),
            ]),
        });

        let items = extract_items(7, &content, &template).unwrap();
        let codes: Vec<&str> = items.iter().map(|i| i.product_code.as_str()).collect();
        assert_eq!(codes, vec!["A-100", "C-300"]);

        let totals = InvoiceTotals::from_items(&items);
        assert_eq!(totals.total_amount, dec("150.00"));
        assert!(items.iter().all(|i| i.invoice_id == 7));
        assert!(items
            .iter()
            .all(|i| i.total_price == Decimal::from(i.quantity) * i.unit_price));
    }

    #[test]
    fn test_pdf_trailing_notes_never_parsed() {
        let content = RawContent::Text(
            "ACME Supply Co.\nInvoice 42\nX-1 1 $1.00\nITEMS START\n\
             AB-1 Widget 2 $10.00\nCD-2 Gadget 1 $5.50\nEF-3 Sprocket 3 $2.00\n\
             ITEMS END\nNotes: ZZ-9 Spare 9 $99.00\n"
                .to_string(),
        );
        let template = Template::Pdf(PdfTemplate {
            items_start_marker: "ITEMS START".to_string(),
            items_end_marker: "ITEMS END".to_string(),
            patterns: BTreeMap::from([
                (Field::ProductCode, r"([A-Z]{1,2}-\d+)".to_string()),
                (Field::Quantity, r"\s(\d+)\s+\$".to_string()),
                (Field::UnitPrice, r"\$([\d.,]+)".to_string()),
            ]),
        });

        let items = extract_items(1, &content, &template).unwrap();
        let codes: Vec<&str> = items.iter().map(|i| i.product_code.as_str()).collect();
        assert_eq!(codes, vec!["AB-1", "CD-2", "EF-3"]);
        assert_eq!(InvoiceTotals::from_items(&items).total_amount, dec("31.50"));
    }

    #[test]
    fn test_template_kind_must_match_content() {
        let template = Template::Pdf(PdfTemplate::default());
        let err = extract_items(1, &rows(&[&["a"]]), &template).unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::TemplateMismatch {
                expected: FileType::Excel,
                found: FileType::Pdf
            }
        ));
    }

    #[test]
    fn test_invalid_pattern_fails() {
        let template = Template::Pdf(PdfTemplate {
            items_start_marker: "START".to_string(),
            items_end_marker: "END".to_string(),
            patterns: BTreeMap::from([(Field::ProductCode, "([A-Z".to_string())]),
        });
        let content = RawContent::Text("START\nA 1 1\nEND".to_string());

        let err = extract_items(1, &content, &template).unwrap_err();
        assert!(matches!(err, ProcessingError::Pattern { field, .. } if field == "product_code"));
    }
}
