// src/heuristics/header.rs
//
// Labeled-field extraction over the accumulated page buffer. Each field
// has its own keyword-anchored regex and fails independently — a miss is
// a `None`, never an error. Layout noise from the upstream text
// extraction (reordered labels, page furniture between fields) is why
// these run against the whole buffer instead of line windows.

use crate::config::ExtractorConfig;
use crate::model::{OrderHeader, Priority};
use crate::normalize;
use regex::Regex;
use time::Date;

/// Run every field extractor against the buffer and assemble a header.
/// The delivery date falls back to issue date + configured business days.
pub fn extract_header(text: &str, config: &ExtractorConfig) -> OrderHeader {
    let issue_date = extract_issue_date(text);
    let delivery_date = extract_delivery_date(text).or_else(|| {
        issue_date.map(|d| normalize::add_business_days(d, config.delivery_business_days))
    });

    OrderHeader {
        order_number: extract_order_number(text),
        issue_date,
        delivery_date,
        customer_name: extract_customer_name(text),
        customer_tax_id: extract_tax_id(text),
        delivery_address: extract_address(text),
        municipality: extract_municipality(text),
        carrier: extract_carrier(text),
        freight_type: extract_freight_type(text),
        freight_value: extract_freight_value(text),
        operation_code: extract_operation_code(text),
        cost_center: extract_cost_center(text),
        sales_executive: extract_sales_executive(text),
        priority: extract_priority(text),
        ..Default::default()
    }
}

fn extract_order_number(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Order\s+(?:No\.?|Number)\s*:?\s*([A-Za-z0-9\-/]+)").ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

fn extract_issue_date(text: &str) -> Option<Date> {
    let re = Regex::new(r"(?i)(?:Issue\s+Date\s*:?|Issued\s+on)\s*(\d{2}/\d{2}/\d{4})").ok()?;
    re.captures(text).and_then(|c| normalize::parse_date(&c[1]))
}

fn extract_delivery_date(text: &str) -> Option<Date> {
    let re = Regex::new(r"(?i)Delivery\s+Date\s*:?\s*(\d{2}/\d{2}/\d{4})").ok()?;
    re.captures(text).and_then(|c| normalize::parse_date(&c[1]))
}

/// Customer lines print as "<internal code> - NAME - STORE <n>"; only the
/// middle part is the name.
fn extract_customer_name(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Customer\s*:?\s*(.+)").ok()?;
    let raw = re.captures(text).map(|c| c[1].trim().to_string())?;

    let lead_code = Regex::new(r"^\d+\s*[-–]?\s*").ok()?;
    let store_code = Regex::new(r"(?i)\s*[-–]?\s*(?:STORE|SHOP|BRANCH)\s*\d+\s*$").ok()?;
    let name = store_code
        .replace(&lead_code.replace(&raw, ""), "")
        .trim()
        .to_string();
    (!name.is_empty()).then_some(name)
}

fn extract_tax_id(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Tax\s+ID\s*:?\s*([\d][\d./-]{9,19})").ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

fn extract_address(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(?:Delivery\s+)?Address\s*:?\s*(.+)").ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

/// Municipality prints with a trailing two-letter region code; the code
/// is dropped here (the delimited export keeps its region spelled out).
fn extract_municipality(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(?:Municipality|City)\s*:?\s*(.+)").ok()?;
    let raw = re.captures(text).map(|c| c[1].trim().to_string())?;
    let region_code = Regex::new(r"\s*[-/]\s*[A-Z]{2}\s*$").ok()?;
    let city = region_code.replace(&raw, "").trim().to_string();
    (!city.is_empty()).then_some(city)
}

/// The carrier block often prints the vehicle plate on the same label;
/// a value that is only a plate is a false match, not a carrier.
fn extract_carrier(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Carrier\s*:?\s*(.+)").ok()?;
    let raw = re.captures(text).map(|c| c[1].trim().to_string())?;

    let plate = Regex::new(r"(?i)\b[A-Z]{3}-?\d[A-Z0-9]\d{2}\b").ok()?;
    let cleaned = plate.replace_all(&raw, "").trim().trim_end_matches('-').trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn extract_freight_type(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Freight\s+Type\s*:?\s*([A-Za-z]{3})\b").ok()?;
    re.captures(text).map(|c| c[1].to_uppercase())
}

fn extract_freight_value(text: &str) -> Option<f64> {
    let re = Regex::new(r"(?i)Freight\s+(?:Value|Cost)\s*:?\s*R?\$?\s*([\d.,]+)").ok()?;
    re.captures(text)
        .map(|c| normalize::parse_locale_number(&c[1]))
}

fn extract_operation_code(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Operation\s+(?:Code\s*)?:?\s*(\d{3,4})\b").ok()?;
    re.captures(text).map(|c| c[1].to_string())
}

fn extract_cost_center(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)Cost\s+Center\s*:?\s*(.+)").ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

fn extract_sales_executive(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(?:Sales\s+)?Executive\s*:?\s*(.+)").ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

fn extract_priority(text: &str) -> Priority {
    let re = Regex::new(r"(?i)Priority\s*:?\s*(urgent)\b");
    match re {
        Ok(re) if re.is_match(text) => Priority::Urgent,
        _ => Priority::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn cfg() -> ExtractorConfig {
        ExtractorConfig::default()
    }

    #[test]
    fn labeled_fields_resolve_independently() {
        let text = "Order No: 45021\nIssue Date: 01/03/2024\nTax ID: 12.345.678/0001-90\n";
        let h = extract_header(text, &cfg());
        assert_eq!(h.order_number.as_deref(), Some("45021"));
        assert_eq!(h.issue_date, Some(date!(2024 - 03 - 01)));
        assert_eq!(h.customer_tax_id.as_deref(), Some("12.345.678/0001-90"));
        assert_eq!(h.customer_name, None);
        assert_eq!(h.carrier, None);
    }

    #[test]
    fn customer_name_is_stripped_of_codes() {
        let text = "Customer: 004512 - ACME INDUSTRIAL LTD - STORE 03\n";
        let h = extract_header(text, &cfg());
        assert_eq!(h.customer_name.as_deref(), Some("ACME INDUSTRIAL LTD"));
    }

    #[test]
    fn municipality_drops_region_code() {
        let text = "City: Springfield - SP\n";
        let h = extract_header(text, &cfg());
        assert_eq!(h.municipality.as_deref(), Some("Springfield"));
    }

    #[test]
    fn carrier_ignores_vehicle_plates() {
        let text = "Carrier: FAST FREIGHT CO ABC-1234\n";
        let h = extract_header(text, &cfg());
        assert_eq!(h.carrier.as_deref(), Some("FAST FREIGHT CO"));

        let plate_only = "Carrier: ABC1D23\n";
        let h = extract_header(plate_only, &cfg());
        assert_eq!(h.carrier, None);
    }

    #[test]
    fn delivery_date_falls_back_to_business_day_offset() {
        let text = "Order No: 1\nIssue Date: 01/03/2024\n";
        let h = extract_header(text, &cfg());
        assert_eq!(h.delivery_date, Some(date!(2024 - 03 - 15)));

        let explicit = "Issue Date: 01/03/2024\nDelivery Date: 08/03/2024\n";
        let h = extract_header(explicit, &cfg());
        assert_eq!(h.delivery_date, Some(date!(2024 - 03 - 08)));
    }

    #[test]
    fn freight_and_operation_fields() {
        let text = "Freight Type: CIF\nFreight Value: R$ 1.250,00\nOperation Code: 6102\n";
        let h = extract_header(text, &cfg());
        assert_eq!(h.freight_type.as_deref(), Some("CIF"));
        assert_eq!(h.freight_value, Some(1250.0));
        assert_eq!(h.operation_code.as_deref(), Some("6102"));
    }
}
