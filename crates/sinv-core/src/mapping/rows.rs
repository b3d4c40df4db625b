//! Spreadsheet row mapping.

use super::FieldMap;
use crate::models::template::SpreadsheetTemplate;

/// Map sheet rows from `start_row` onward into candidate field maps.
///
/// Rows whose cells are all blank are skipped. A column index beyond the end of
/// a row leaves that field unset.
pub fn map_rows<'a>(
    rows: &'a [Vec<String>],
    template: &'a SpreadsheetTemplate,
) -> impl Iterator<Item = FieldMap> + 'a {
    rows.iter()
        .skip(template.start_row)
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(move |row| {
            let mut fields = FieldMap::new();
            for (&field, &index) in &template.columns {
                if let Some(cell) = row.get(index) {
                    fields.insert(field, cell.as_str());
                }
            }
            fields
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::Field;
    use std::collections::BTreeMap;

    fn sheet(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn template(start_row: usize) -> SpreadsheetTemplate {
        SpreadsheetTemplate {
            start_row,
            columns: BTreeMap::from([
                (Field::ProductCode, 0),
                (Field::Quantity, 1),
                (Field::Cbm, 5),
            ]),
        }
    }

    #[test]
    fn test_skips_rows_before_start() {
        let rows = sheet(&[&["Supplier: ACME"], &["Code", "Qty"], &["A1", "3"]]);
        let mapped: Vec<FieldMap> = map_rows(&rows, &template(2)).collect();

        assert_eq!(mapped, vec![FieldMap::from([(Field::ProductCode, "A1"), (Field::Quantity, "3")])]);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let rows = sheet(&[&["A1", "1"], &["", "  "], &[], &["B2", "2"]]);
        let mapped: Vec<FieldMap> = map_rows(&rows, &template(0)).collect();

        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[1].get(Field::ProductCode), Some("B2"));
    }

    #[test]
    fn test_missing_column_is_absent() {
        let rows = sheet(&[&["A1", "1", "x"]]);
        let mapped: Vec<FieldMap> = map_rows(&rows, &template(0)).collect();

        assert_eq!(mapped[0].get(Field::Cbm), None);
        assert_eq!(mapped[0].get(Field::Quantity), Some("1"));
    }

    #[test]
    fn test_start_row_past_end() {
        let rows = sheet(&[&["A1", "1"]]);
        assert_eq!(map_rows(&rows, &template(5)).count(), 0);
    }
}
