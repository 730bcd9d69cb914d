// src/delimited.rs
//
// Line-oriented state machine over the ERP's semicolon-delimited export.
// The first field of each line names its section; sections accumulate
// into the canonical order. Record layouts:
//
//   header;<order number>;<issue date>
//   customer info;<name>;<tax id>;<free fields... phone somewhere>
//   cost allocation;<free text fields...>
//   shipping;<carrier>;<freight type>;<freight value>
//   delivery address;<street>;<neighbourhood>;<postal code>;<municipality>;<region>
//   installation;<...>            (ignored)
//   item;<no>;<code>;<description>;<qty>;<unit>;<warehouse>;<unit price>;<total w/ tax>;<total w/o tax>;<material code>;<ncm>
//
// Anything else is an unknown section and is ignored without error.

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::model::{ExtractedOrder, OrderHeader, OrderLineItem, SourceClassification};
use crate::normalize;
use regex::Regex;
use std::path::Path;
use time::Date;
use tracing::{debug, info, warn};

/// One decoded line, tagged by section kind. Keeping the unknown case a
/// variant forces every consumer of a line to say what happens to it.
#[derive(Debug)]
enum SectionLine {
    Header {
        order_number: Option<String>,
        issue_date: Option<Date>,
    },
    CustomerInfo {
        name: Option<String>,
        tax_id: Option<String>,
        phone: Option<String>,
    },
    CostAllocation {
        cost_center: Option<String>,
        accounting_item: Option<String>,
    },
    Shipping {
        carrier: Option<String>,
        freight_type: Option<String>,
        freight_value: Option<f64>,
    },
    DeliveryAddress {
        address: Option<String>,
        municipality: Option<String>,
    },
    Installation,
    Item(Box<OrderLineItem>),
    Unknown(String),
}

pub fn extract_path(path: impl AsRef<Path>, config: &ExtractorConfig) -> Result<ExtractedOrder> {
    let text = std::fs::read_to_string(path)?;
    extract_str(&text, config)
}

/// Fold the whole export into one canonical order.
pub fn extract_str(text: &str, config: &ExtractorConfig) -> Result<ExtractedOrder> {
    if text.trim().is_empty() {
        return Err(ExtractError::Structure("empty input".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut header = OrderHeader::default();
    let mut items: Vec<OrderLineItem> = Vec::new();

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "skipping undecodable line");
                continue;
            }
        };
        let fields: Vec<&str> = record.iter().map(str::trim).collect();
        if fields.is_empty() || fields[0].is_empty() {
            continue;
        }

        match classify(&fields, items.len() as u32 + 1) {
            SectionLine::Header {
                order_number,
                issue_date,
            } => {
                header.order_number = order_number;
                header.issue_date = issue_date;
            }
            SectionLine::CustomerInfo { name, tax_id, phone } => {
                header.customer_name = name;
                header.customer_tax_id = tax_id;
                header.customer_phone = phone;
            }
            SectionLine::CostAllocation {
                cost_center,
                accounting_item,
            } => {
                if let Some(ref cc) = cost_center {
                    header.business_area = Some(config.classify_business_area(cc));
                }
                header.cost_center = cost_center;
                header.accounting_item = accounting_item;
            }
            SectionLine::Shipping {
                carrier,
                freight_type,
                freight_value,
            } => {
                header.carrier = carrier;
                header.freight_type = freight_type;
                header.freight_value = freight_value;
            }
            SectionLine::DeliveryAddress {
                address,
                municipality,
            } => {
                header.delivery_address = address;
                header.municipality = municipality;
            }
            SectionLine::Installation => {
                debug!("installation section present, not modeled");
            }
            SectionLine::Item(item) => {
                if item.item_code.is_empty() {
                    debug!("skipping item line without code");
                } else if item.quantity <= 0.0 {
                    debug!(code = %item.item_code, quantity = item.quantity, "skipping non-positive quantity");
                } else {
                    items.push(*item);
                }
            }
            SectionLine::Unknown(prefix) => {
                debug!(prefix = %prefix, "ignoring unknown section");
            }
        }
    }

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
        "delimited extraction complete"
    );

    Ok(ExtractedOrder {
        header,
        items,
        quality: None,
    })
}

fn classify(fields: &[&str], next_item_number: u32) -> SectionLine {
    let rest = &fields[1..];
    match fields[0].to_lowercase().as_str() {
        "header" => SectionLine::Header {
            order_number: field_str(rest, 0),
            issue_date: field_str(rest, 1).and_then(|s| normalize::parse_date(&s)),
        },
        "customer info" => SectionLine::CustomerInfo {
            name: field_str(rest, 0),
            tax_id: field_str(rest, 1),
            phone: rest.iter().skip(2).find_map(|f| find_phone(f)),
        },
        "cost allocation" => SectionLine::CostAllocation {
            cost_center: rest.iter().find_map(|f| extract_cost_center(f)),
            accounting_item: rest.iter().find_map(|f| extract_accounting_item(f)),
        },
        "shipping" => SectionLine::Shipping {
            carrier: field_str(rest, 0),
            freight_type: field_str(rest, 1),
            freight_value: field_str(rest, 2).map(|s| normalize::parse_locale_number(&s)),
        },
        "delivery address" => {
            let street = field_str(rest, 0);
            let neighbourhood = field_str(rest, 1);
            let postal = field_str(rest, 2);
            let parts: Vec<String> = [street, neighbourhood, postal].into_iter().flatten().collect();
            let municipality = match (field_str(rest, 3), field_str(rest, 4)) {
                (Some(city), Some(region)) => Some(format!("{city} / {region}")),
                (Some(city), None) => Some(city),
                _ => None,
            };
            SectionLine::DeliveryAddress {
                address: (!parts.is_empty()).then(|| parts.join(", ")),
                municipality,
            }
        }
        "installation" => SectionLine::Installation,
        "item" | "line item" => SectionLine::Item(Box::new(parse_item(rest, next_item_number))),
        other => SectionLine::Unknown(other.to_string()),
    }
}

fn parse_item(rest: &[&str], fallback_number: u32) -> OrderLineItem {
    let total_with_tax = field_str(rest, 7).map(|s| normalize::parse_locale_number(&s));
    let total_without_tax = field_str(rest, 8).map(|s| normalize::parse_locale_number(&s));

    // The export carries no explicit IPI column; the rate is the delta
    // between the tax-inclusive and tax-exclusive totals.
    let ipi_pct = match (total_with_tax, total_without_tax) {
        (Some(with), Some(without)) if without > 0.0 && with >= without => {
            Some(((with / without) - 1.0) * 100.0)
        }
        _ => None,
    };

    let material_type = field_str(rest, 9);

    OrderLineItem {
        item_number: field_str(rest, 0)
            .and_then(|s| s.parse().ok())
            .unwrap_or(fallback_number),
        item_code: field_str(rest, 1).unwrap_or_default(),
        description: field_str(rest, 2)
            .map(|d| normalize::strip_regulatory_text(&d))
            .unwrap_or_default(),
        quantity: field_str(rest, 3)
            .map(|s| normalize::parse_locale_number(&s))
            .unwrap_or(0.0),
        unit: field_str(rest, 4),
        warehouse: field_str(rest, 5),
        unit_price: field_str(rest, 6).map(|s| normalize::parse_locale_number(&s)),
        total_value: total_with_tax,
        ipi_pct,
        source: material_type
            .as_deref()
            .map(SourceClassification::from_code)
            .unwrap_or_default(),
        material_type,
        ncm_code: field_str(rest, 10),
        ..Default::default()
    }
}

fn field_str(fields: &[&str], idx: usize) -> Option<String> {
    fields
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The phone column moves around between export versions, so it is found
/// by shape: a run of ≥10 digits, or a parenthesised area code.
fn find_phone(field: &str) -> Option<String> {
    let digits: String = field.chars().filter(char::is_ascii_digit).collect();
    let area_code = Regex::new(r"\(\d{2,3}\)").unwrap();
    if digits.len() >= 10 || area_code.is_match(field) {
        Some(field.to_string())
    } else {
        None
    }
}

/// Prioritized phrase patterns for the cost-center free text. First
/// pattern that matches wins.
fn extract_cost_center(text: &str) -> Option<String> {
    let patterns = [
        r"(?i)cost\s+center\s*[:#-]?\s*([A-Za-z0-9][A-Za-z0-9 \-/]*)",
        r"(?i)\bcc\s*[:#]\s*([A-Za-z0-9][A-Za-z0-9 \-/]*)",
        r"(?i)charge(?:d)?\s+to\s+([A-Za-z0-9][A-Za-z0-9 \-/]*)",
    ];
    first_capture(text, &patterns)
}

fn extract_accounting_item(text: &str) -> Option<String> {
    let patterns = [
        r"(?i)accounting\s+item\s*[:#-]?\s*([A-Za-z0-9][A-Za-z0-9 \-/\.]*)",
        r"(?i)ledger\s+account\s*[:#-]?\s*([A-Za-z0-9][A-Za-z0-9 \-/\.]*)",
        r"(?i)expense\s+account\s*[:#-]?\s*([A-Za-z0-9][A-Za-z0-9 \-/\.]*)",
    ];
    first_capture(text, &patterns)
}

fn first_capture(text: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(cap) = re.captures(text) {
            return Some(cap[1].trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BusinessArea;
    use time::macros::date;

    #[test]
    fn empty_input_is_structural() {
        let result = extract_str("   \n", &ExtractorConfig::default());
        assert!(matches!(result, Err(ExtractError::Structure(_))));
    }

    #[test]
    fn header_without_delivery_date_gets_computed_one() {
        let order = extract_str("header;12345;01/03/2024\n", &ExtractorConfig::default()).unwrap();
        assert_eq!(order.header.order_number.as_deref(), Some("12345"));
        assert_eq!(order.header.issue_date, Some(date!(2024 - 03 - 01)));
        assert_eq!(
            order.header.delivery_date,
            Some(normalize::add_business_days(date!(2024 - 03 - 01), 10))
        );
    }

    #[test]
    fn phone_is_found_by_shape_not_position() {
        let text = "customer info;ACME LTD;12.345.678/0001-90;att. John Doe;(11) 99888-7766\n";
        let order = extract_str(text, &ExtractorConfig::default()).unwrap();
        assert_eq!(order.header.customer_name.as_deref(), Some("ACME LTD"));
        assert_eq!(order.header.customer_tax_id.as_deref(), Some("12.345.678/0001-90"));
        assert_eq!(order.header.customer_phone.as_deref(), Some("(11) 99888-7766"));

        // long digit run works too, wherever the column lands
        let text = "customer info;ACME LTD;12.345.678/0001-90;11998887766;att. John\n";
        let order = extract_str(text, &ExtractorConfig::default()).unwrap();
        assert_eq!(order.header.customer_phone.as_deref(), Some("11998887766"));
    }

    #[test]
    fn cost_allocation_resolves_center_and_area() {
        let text = "cost allocation;approved by finance;Cost Center: E-commerce Ops;ledger account: 4401.02\n";
        let order = extract_str(text, &ExtractorConfig::default()).unwrap();
        assert_eq!(order.header.cost_center.as_deref(), Some("E-commerce Ops"));
        assert_eq!(order.header.accounting_item.as_deref(), Some("4401.02"));
        assert_eq!(order.header.business_area, Some(BusinessArea::Ecommerce));
    }

    #[test]
    fn shipping_and_address_sections() {
        let text = "shipping;FAST FREIGHT CO;CIF;150,00\n\
                    delivery address;100 Harbor Rd;Dockside;04500-000;Springfield;North\n";
        let order = extract_str(text, &ExtractorConfig::default()).unwrap();
        assert_eq!(order.header.carrier.as_deref(), Some("FAST FREIGHT CO"));
        assert_eq!(order.header.freight_type.as_deref(), Some("CIF"));
        assert_eq!(order.header.freight_value, Some(150.0));
        assert_eq!(
            order.header.delivery_address.as_deref(),
            Some("100 Harbor Rd, Dockside, 04500-000")
        );
        assert_eq!(order.header.municipality.as_deref(), Some("Springfield / North"));
    }

    #[test]
    fn item_lines_map_codes_and_compute_ipi() {
        let text = "item;1;MAT-001;HEX BOLT M8;100;PC;WH1;2,50;275,00;250,00;PR;7318.15.00\n\
                    item;2;MAT-002;WASHER;50;PC;WH1;1,00;50,00;;ZZ\n";
        let order = extract_str(text, &ExtractorConfig::default()).unwrap();
        assert_eq!(order.items.len(), 2);

        let first = &order.items[0];
        assert_eq!(first.item_code, "MAT-001");
        assert_eq!(first.source, SourceClassification::Production);
        assert_eq!(first.ncm_code.as_deref(), Some("7318.15.00"));
        let ipi = first.ipi_pct.unwrap();
        assert!((ipi - 10.0).abs() < 1e-9, "ipi was {ipi}");

        let second = &order.items[1];
        assert_eq!(second.source, SourceClassification::InStock);
        assert_eq!(second.ipi_pct, None);
    }

    #[test]
    fn bad_items_and_foreign_sections_are_dropped_silently() {
        let text = "item;1;;NO CODE;10;PC\n\
                    item;2;MAT-002;ZERO QTY;0;PC\n\
                    installation;crew of two;ladder required\n\
                    telemetry;1;2;3\n\
                    item;3;MAT-003;GOOD;5;PC\n";
        let order = extract_str(text, &ExtractorConfig::default()).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].item_code, "MAT-003");
    }

    #[test]
    fn delivery_date_propagates_to_items() {
        let text = "header;777;05/06/2024\nitem;1;MAT-001;BOLT;10;PC\n";
        let order = extract_str(text, &ExtractorConfig::default()).unwrap();
        let expected = normalize::add_business_days(date!(2024 - 06 - 05), 10);
        assert_eq!(order.header.delivery_date, Some(expected));
        assert_eq!(order.items[0].delivery_date, Some(expected));
    }
}
