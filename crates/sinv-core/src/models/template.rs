//! Per-supplier mapping templates.
//!
//! A template tells the field mapper where each logical field lives inside a
//! raw document: a column index for spreadsheets, a single-capture-group
//! pattern for PDF text lines.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::invoice::FileType;

/// Logical line item fields a template can map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProductCode,
    Description,
    Quantity,
    Unit,
    UnitPrice,
    FobPrice,
    Cbm,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::ProductCode,
        Field::Description,
        Field::Quantity,
        Field::Unit,
        Field::UnitPrice,
        Field::FobPrice,
        Field::Cbm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ProductCode => "product_code",
            Field::Description => "description",
            Field::Quantity => "quantity",
            Field::Unit => "unit",
            Field::UnitPrice => "unit_price",
            Field::FobPrice => "fob_price",
            Field::Cbm => "cbm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping descriptor for one supplier and file type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "file_type", rename_all = "snake_case")]
pub enum Template {
    /// Column layout of a spreadsheet.
    #[serde(rename = "excel")]
    Spreadsheet(SpreadsheetTemplate),
    /// Section markers and line patterns of PDF text.
    Pdf(PdfTemplate),
}

/// Spreadsheet column mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetTemplate {
    /// 0-based index of the first data row.
    #[serde(default)]
    pub start_row: usize,

    /// Field to 0-based column index. Letters ("C") are accepted on input.
    #[serde(deserialize_with = "deserialize_columns")]
    pub columns: BTreeMap<Field, usize>,
}

/// PDF line pattern mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfTemplate {
    /// Literal substring of the line that opens the items section.
    pub items_start_marker: String,

    /// Literal substring of the line that closes the items section.
    pub items_end_marker: String,

    /// Field to regex; capture group 1 is the field value.
    #[serde(deserialize_with = "deserialize_patterns")]
    pub patterns: BTreeMap<Field, String>,
}

impl Template {
    /// File type this template applies to.
    pub fn file_type(&self) -> FileType {
        match self {
            Template::Spreadsheet(_) => FileType::Excel,
            Template::Pdf(_) => FileType::Pdf,
        }
    }

    /// Parse a stored mapping body for the given file type.
    ///
    /// The body carries no `file_type` tag; the column it was stored under decides
    /// which variant is expected. A tagged document is accepted as well.
    pub fn from_mapping(file_type: FileType, json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("file_type").is_some() {
            let template: Template = serde_json::from_value(value)?;
            if template.file_type() != file_type {
                return Err(serde_json::Error::custom(format!(
                    "mapping is tagged {} but stored as {}",
                    template.file_type(),
                    file_type
                )));
            }
            return Ok(template);
        }

        match file_type {
            FileType::Excel => serde_json::from_value(value).map(Template::Spreadsheet),
            FileType::Pdf => serde_json::from_value(value).map(Template::Pdf),
        }
    }

    /// Serialize the untagged mapping body for storage.
    pub fn to_mapping(&self) -> Result<String, serde_json::Error> {
        match self {
            Template::Spreadsheet(t) => serde_json::to_string(t),
            Template::Pdf(t) => serde_json::to_string(t),
        }
    }
}

/// Convert a spreadsheet column reference to a 0-based index.
///
/// Accepts plain indices ("3") and column letters ("A", "ab").
pub fn column_index(reference: &str) -> Option<usize> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Ok(index) = reference.parse::<usize>() {
        return Some(index);
    }
    if !reference.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut index = 0usize;
    for c in reference.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

fn deserialize_columns<'de, D>(deserializer: D) -> Result<BTreeMap<Field, usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    let mut columns = BTreeMap::new();

    for (key, value) in raw {
        // Unknown keys are tolerated so older templates keep loading.
        let Some(field) = Field::parse(&key) else {
            continue;
        };
        let index = match &value {
            serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
            serde_json::Value::String(s) => column_index(s),
            _ => None,
        }
        .ok_or_else(|| D::Error::custom(format!("invalid column for {}: {}", key, value)))?;
        columns.insert(field, index);
    }

    Ok(columns)
}

fn deserialize_patterns<'de, D>(deserializer: D) -> Result<BTreeMap<Field, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, pattern)| Field::parse(&key).map(|field| (field, pattern)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("0"), Some(0));
        assert_eq!(column_index("12"), Some(12));
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("c"), Some(2));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("B2"), None);
    }

    #[test]
    fn test_spreadsheet_mapping() {
        let json = r#"{
            "start_row": 1,
            "columns": {"product_code": 0, "quantity": "C", "unit_price": "3", "colour": 9}
        }"#;

        let template = Template::from_mapping(FileType::Excel, json).unwrap();
        let expected = Template::Spreadsheet(SpreadsheetTemplate {
            start_row: 1,
            columns: BTreeMap::from([
                (Field::ProductCode, 0),
                (Field::Quantity, 2),
                (Field::UnitPrice, 3),
            ]),
        });
        assert_eq!(template, expected);
    }

    #[test]
    fn test_pdf_mapping() {
        let json = r#"{
            "items_start_marker": "ITEMS START",
            "items_end_marker": "ITEMS END",
            "patterns": {"product_code": "^(\\S+)", "unit_price": "\\$([\\d.]+)"}
        }"#;

        let template = Template::from_mapping(FileType::Pdf, json).unwrap();
        let Template::Pdf(pdf) = &template else {
            panic!("expected PDF template");
        };
        assert_eq!(pdf.items_start_marker, "ITEMS START");
        assert_eq!(pdf.patterns.len(), 2);
        assert_eq!(pdf.patterns[&Field::UnitPrice], r"\$([\d.]+)");
    }

    #[test]
    fn test_tagged_mapping_must_match_file_type() {
        let json = r#"{"file_type": "excel", "start_row": 0, "columns": {}}"#;
        assert!(Template::from_mapping(FileType::Excel, json).is_ok());
        assert!(Template::from_mapping(FileType::Pdf, json).is_err());
    }

    #[test]
    fn test_invalid_column_rejected() {
        let json = r#"{"columns": {"quantity": true}}"#;
        assert!(Template::from_mapping(FileType::Excel, json).is_err());
    }

    #[test]
    fn test_mapping_round_trip_is_untagged() {
        let template = Template::Spreadsheet(SpreadsheetTemplate {
            start_row: 2,
            columns: BTreeMap::from([(Field::ProductCode, 1)]),
        });
        let body = template.to_mapping().unwrap();
        assert!(!body.contains("file_type"));
        assert_eq!(Template::from_mapping(FileType::Excel, &body).unwrap(), template);
    }
}
