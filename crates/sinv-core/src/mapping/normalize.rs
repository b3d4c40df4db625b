//! Line item coercion and validation.

use rust_decimal::Decimal;

use super::numbers::{parse_amount, parse_quantity};
use super::FieldMap;
use crate::models::invoice::LineItem;
use crate::models::template::Field;

/// Turn a candidate field map into a line item, or reject it.
///
/// A candidate is accepted only with a non-empty product code, a non-zero
/// quantity and a positive unit price. Rejected candidates are junk rows and
/// are not reported.
pub fn normalize(invoice_id: i64, fields: &FieldMap) -> Option<LineItem> {
    let product_code = text(fields, Field::ProductCode);
    if product_code.is_empty() {
        return None;
    }

    let quantity = fields.get(Field::Quantity).map(parse_quantity).unwrap_or(0);
    if quantity == 0 {
        return None;
    }

    let unit_price = fields
        .get(Field::UnitPrice)
        .and_then(parse_amount)
        .unwrap_or(Decimal::ZERO);
    if unit_price <= Decimal::ZERO {
        return None;
    }

    let total_price = Decimal::from(quantity).checked_mul(unit_price)?;

    Some(LineItem {
        invoice_id,
        product_code,
        description: text(fields, Field::Description),
        quantity,
        unit: text(fields, Field::Unit),
        unit_price,
        total_price,
        fob_price: fields.get(Field::FobPrice).and_then(parse_amount),
        cbm: fields.get(Field::Cbm).and_then(parse_amount),
    })
}

fn text(fields: &FieldMap, field: Field) -> String {
    fields.get(field).map(str::trim).unwrap_or_default().to_string()
}
