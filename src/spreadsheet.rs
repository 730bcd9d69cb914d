// src/spreadsheet.rs
//
// Two-sheet workbook layout: sheet 1 holds the order header as a title
// row plus exactly one data row, sheet 2 holds the item rows under a
// title row. Both sheets are mapped by fixed column position.

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::model::{ExtractedOrder, OrderHeader, OrderLineItem, Priority, SourceClassification};
use crate::normalize;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::path::Path;
use tracing::{debug, info};

// Header sheet, data row (row index 1).
const COL_ORDER_NUMBER: u32 = 0;
const COL_ISSUE_DATE: u32 = 1;
const COL_CUSTOMER_NAME: u32 = 2;
const COL_CUSTOMER_TAX_ID: u32 = 3;
const COL_DELIVERY_ADDRESS: u32 = 4;
const COL_MUNICIPALITY: u32 = 5;
const COL_CARRIER: u32 = 6;
const COL_FREIGHT_TYPE: u32 = 7;
const COL_FREIGHT_VALUE: u32 = 8;
const COL_DELIVERY_DATE: u32 = 9;
const COL_NOTES: u32 = 10;
const COL_PRIORITY: u32 = 11;

// Items sheet, data rows (row index ≥ 1).
const COL_ITEM_NUMBER: u32 = 0;
const COL_ITEM_CODE: u32 = 1;
const COL_ITEM_DESCRIPTION: u32 = 2;
const COL_ITEM_QUANTITY: u32 = 3;
const COL_ITEM_UNIT: u32 = 4;
const COL_ITEM_WAREHOUSE: u32 = 5;
const COL_ITEM_UNIT_PRICE: u32 = 6;
const COL_ITEM_TOTAL: u32 = 7;
const COL_ITEM_NCM: u32 = 8;
const COL_ITEM_MATERIAL_TYPE: u32 = 9;

/// Open a workbook file and extract the canonical order from its first
/// two sheets.
pub fn extract_path(path: impl AsRef<Path>, config: &ExtractorConfig) -> Result<ExtractedOrder> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_owned();

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in &sheet_names {
        sheets.push(workbook.worksheet_range(name)?);
    }
    from_sheets(&sheets, config)
}

/// Extract from already-loaded sheet ranges. Fewer than two sheets is a
/// structural failure: there is no header/items split to read.
pub fn from_sheets(sheets: &[Range<Data>], config: &ExtractorConfig) -> Result<ExtractedOrder> {
    if sheets.len() < 2 {
        return Err(ExtractError::Structure(
            "expected header and items sheets".to_string(),
        ));
    }

    let mut header = read_header(&sheets[0]);
    let mut items = read_items(&sheets[1]);

    if header.delivery_date.is_none() {
        header.delivery_date = header
            .issue_date
            .map(|d| normalize::add_business_days(d, config.delivery_business_days));
    }
    for item in &mut items {
        if item.delivery_date.is_none() {
            item.delivery_date = header.delivery_date;
        }
    }

    info!(
        order = ?header.order_number,
        items = items.len(),
        "workbook extraction complete"
    );

    Ok(ExtractedOrder {
        header,
        items,
        quality: None,
    })
}

fn read_header(sheet: &Range<Data>) -> OrderHeader {
    // Row 0 is the title row; row 1 carries the single data row.
    let row = 1;
    OrderHeader {
        order_number: cell_str(sheet, row, COL_ORDER_NUMBER),
        issue_date: cell_str(sheet, row, COL_ISSUE_DATE)
            .and_then(|s| normalize::parse_date(&s)),
        customer_name: cell_str(sheet, row, COL_CUSTOMER_NAME),
        customer_tax_id: cell_str(sheet, row, COL_CUSTOMER_TAX_ID),
        delivery_address: cell_str(sheet, row, COL_DELIVERY_ADDRESS),
        municipality: cell_str(sheet, row, COL_MUNICIPALITY),
        carrier: cell_str(sheet, row, COL_CARRIER),
        freight_type: cell_str(sheet, row, COL_FREIGHT_TYPE),
        freight_value: cell_num(sheet, row, COL_FREIGHT_VALUE),
        delivery_date: cell_str(sheet, row, COL_DELIVERY_DATE)
            .and_then(|s| normalize::parse_date(&s)),
        notes: cell_str(sheet, row, COL_NOTES),
        priority: match cell_str(sheet, row, COL_PRIORITY).as_deref() {
            Some(s) if s.eq_ignore_ascii_case("urgent") => Priority::Urgent,
            _ => Priority::Normal,
        },
        ..Default::default()
    }
}

fn read_items(sheet: &Range<Data>) -> Vec<OrderLineItem> {
    let mut items = Vec::new();

    for row in 1..sheet.height() as u32 {
        let Some(code) = cell_str(sheet, row, COL_ITEM_CODE) else {
            debug!(row, "skipping row without item code");
            continue;
        };
        let quantity = cell_num(sheet, row, COL_ITEM_QUANTITY).unwrap_or(0.0);
        if quantity <= 0.0 {
            debug!(row, code = %code, quantity, "skipping non-positive quantity");
            continue;
        }

        let item_number = cell_num(sheet, row, COL_ITEM_NUMBER)
            .map(|n| n as u32)
            .unwrap_or(items.len() as u32 + 1);
        let material_type = cell_str(sheet, row, COL_ITEM_MATERIAL_TYPE);

        items.push(OrderLineItem {
            item_number,
            item_code: code,
            description: cell_str(sheet, row, COL_ITEM_DESCRIPTION)
                .map(|d| normalize::strip_regulatory_text(&d))
                .unwrap_or_default(),
            quantity,
            unit: cell_str(sheet, row, COL_ITEM_UNIT),
            warehouse: cell_str(sheet, row, COL_ITEM_WAREHOUSE),
            unit_price: cell_num(sheet, row, COL_ITEM_UNIT_PRICE),
            total_value: cell_num(sheet, row, COL_ITEM_TOTAL),
            ncm_code: cell_str(sheet, row, COL_ITEM_NCM),
            source: material_type
                .as_deref()
                .map(SourceClassification::from_code)
                .unwrap_or_default(),
            material_type,
            ..Default::default()
        });
    }

    items
}

fn cell_str(sheet: &Range<Data>, row: u32, col: u32) -> Option<String> {
    match sheet.get_value((row, col))? {
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            // Whole-number cells print without the trailing ".0" so codes
            // like 10023 survive the float round-trip.
            if f.fract() == 0.0 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
        _ => None,
    }
}

fn cell_num(sheet: &Range<Data>, row: u32, col: u32) -> Option<f64> {
    match sheet.get_value((row, col))? {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| normalize::parse_locale_number(trimmed))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn header_sheet() -> Range<Data> {
        let mut r = Range::new((0, 0), (1, 11));
        let s = |v: &str| Data::String(v.to_string());
        r.set_value((1, 0), s("45021"));
        r.set_value((1, 1), s("01/03/2024"));
        r.set_value((1, 2), s("ACME INDUSTRIAL LTD"));
        r.set_value((1, 3), s("12.345.678/0001-90"));
        r.set_value((1, 4), s("100 Harbor Rd, Dockside, 04500-000"));
        r.set_value((1, 5), s("Springfield / North"));
        r.set_value((1, 6), s("FAST FREIGHT CO"));
        r.set_value((1, 7), s("CIF"));
        r.set_value((1, 8), s("150,00"));
        // delivery date (col 9) intentionally empty
        r.set_value((1, 10), s("deliver at rear gate"));
        r
    }

    fn items_sheet() -> Range<Data> {
        let mut r = Range::new((0, 0), (4, 9));
        let s = |v: &str| Data::String(v.to_string());
        // row 1: complete item
        r.set_value((1, 0), Data::Int(1));
        r.set_value((1, 1), s("MAT-001"));
        r.set_value((1, 2), s("HEX BOLT M8"));
        r.set_value((1, 3), Data::Float(100.0));
        r.set_value((1, 4), s("PC"));
        r.set_value((1, 5), s("WH1"));
        r.set_value((1, 6), s("2,50"));
        r.set_value((1, 7), s("250,00"));
        r.set_value((1, 8), s("7318.15.00"));
        r.set_value((1, 9), s("PR"));
        // row 2: blank code — must be filtered
        r.set_value((2, 3), Data::Float(5.0));
        // row 3: zero quantity — must be dropped
        r.set_value((3, 0), Data::Int(3));
        r.set_value((3, 1), s("MAT-003"));
        r.set_value((3, 3), Data::Float(0.0));
        // row 4: minimal valid item
        r.set_value((4, 0), Data::Int(4));
        r.set_value((4, 1), s("MAT-004"));
        r.set_value((4, 3), Data::Float(2.0));
        r
    }

    #[test]
    fn single_sheet_is_a_structural_error() {
        let result = from_sheets(&[header_sheet()], &ExtractorConfig::default());
        assert!(matches!(result, Err(ExtractError::Structure(_))));
    }

    #[test]
    fn maps_header_by_column_position() {
        let order = from_sheets(&[header_sheet(), items_sheet()], &ExtractorConfig::default())
            .unwrap();
        let h = &order.header;
        assert_eq!(h.order_number.as_deref(), Some("45021"));
        assert_eq!(h.issue_date, Some(date!(2024 - 03 - 01)));
        assert_eq!(h.customer_name.as_deref(), Some("ACME INDUSTRIAL LTD"));
        assert_eq!(h.freight_value, Some(150.0));
        assert_eq!(h.priority, Priority::Normal);
        assert!(order.quality.is_none());
    }

    #[test]
    fn computes_delivery_date_when_absent() {
        let order = from_sheets(&[header_sheet(), items_sheet()], &ExtractorConfig::default())
            .unwrap();
        // 01/03/2024 + 10 business days
        assert_eq!(order.header.delivery_date, Some(date!(2024 - 03 - 15)));
        assert!(order.items.iter().all(|i| i.delivery_date == order.header.delivery_date));
    }

    #[test]
    fn filters_blank_codes_and_non_positive_quantities() {
        let order = from_sheets(&[header_sheet(), items_sheet()], &ExtractorConfig::default())
            .unwrap();
        let codes: Vec<_> = order.items.iter().map(|i| i.item_code.as_str()).collect();
        assert_eq!(codes, vec!["MAT-001", "MAT-004"]);
        assert!(order.items.iter().all(|i| i.quantity > 0.0));
    }

    #[test]
    fn maps_material_type_to_source() {
        let order = from_sheets(&[header_sheet(), items_sheet()], &ExtractorConfig::default())
            .unwrap();
        assert_eq!(order.items[0].source, SourceClassification::Production);
        assert_eq!(order.items[1].source, SourceClassification::InStock);
    }
}
