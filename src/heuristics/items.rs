// src/heuristics/items.rs
//
// Item-table extraction over the accumulated page buffer. Strategies are
// an ordered list from most- to least-strict; each is independent and the
// first one to yield a non-empty set wins, so a degraded scan falls
// through to progressively looser row shapes instead of duplicating
// control flow per tier.

use crate::model::OrderLineItem;
use crate::normalize;
use regex::Regex;
use tracing::debug;

/// Description used by the minimal tier, which has no description column
/// at all.
pub const PLACEHOLDER_DESCRIPTION: &str = "UNSPECIFIED ITEM";

/// How far (bytes) past a relaxed-tier row a "Description" label may sit
/// and still be attributed to that row.
const DESCRIPTION_WINDOW: usize = 200;

/// Extract line items from the buffer.
///
/// The table is anchored to the items-section marker; a buffer without
/// the marker yields no items and no error — the caller reads the
/// completeness score instead.
pub fn extract_items(buffer: &str) -> Vec<OrderLineItem> {
    let Some(section) = items_section(buffer) else {
        return Vec::new();
    };

    let strategies: [(&str, fn(&str) -> Vec<OrderLineItem>); 3] = [
        ("strict", tier_strict),
        ("relaxed", tier_relaxed),
        ("minimal", tier_minimal),
    ];

    for (tier, strategy) in strategies {
        let items = strategy(section);
        if !items.is_empty() {
            debug!(tier, count = items.len(), "item tier matched");
            return items;
        }
    }
    Vec::new()
}

/// Everything after the items-section marker, or `None` when the buffer
/// has no item table yet.
fn items_section(buffer: &str) -> Option<&str> {
    let re = Regex::new(r"(?i)\b(?:composition|order\s+items|items)\b").ok()?;
    let m = re.find(buffer)?;
    Some(&buffer[m.end()..])
}

/// Tier 1: the full printed table row —
/// `no  code  description  qty  unit  [price  disc  ipi  icms  total]  [warehouse]`.
fn tier_strict(section: &str) -> Vec<OrderLineItem> {
    let re = Regex::new(
        r"(?m)^\s*(?P<num>\d{1,3})\s+(?P<code>[A-Z][A-Z0-9.\-/]{2,})\s+(?P<desc>\S.*?)\s+(?P<qty>\d+(?:,\d+)?)\s+(?P<unit>[A-Z]{2,4})\b(?:\s+(?P<price>\d[\d.]*,\d{2}))?(?:\s+(?P<disc>\d{1,2},\d{2}))?(?:\s+(?P<ipi>\d{1,2},\d{2}))?(?:\s+(?P<icms>\d{1,2},\d{2}))?(?:\s+(?P<total>\d[\d.]*,\d{2}))?(?:\s+(?P<wh>[A-Z]{2,3}\d{1,3}))?\s*$",
    )
    .unwrap();

    re.captures_iter(section)
        .filter_map(|cap| {
            let quantity = normalize::parse_locale_number(&cap["qty"]);
            if quantity <= 0.0 {
                debug!(code = &cap["code"], "skipping row with unusable quantity");
                return None;
            }
            Some(OrderLineItem {
                item_number: cap["num"].parse().ok()?,
                item_code: cap["code"].to_string(),
                description: normalize::strip_regulatory_text(cap["desc"].trim()),
                quantity,
                unit: Some(cap["unit"].to_string()),
                warehouse: group_str(&cap, "wh"),
                unit_price: group_num(&cap, "price"),
                discount: group_num(&cap, "disc"),
                ipi_pct: group_num(&cap, "ipi"),
                icms_pct: group_num(&cap, "icms"),
                total_value: group_num(&cap, "total"),
                ..Default::default()
            })
        })
        .collect()
}

/// Tier 2: description column lost to layout noise —
/// `no  code  qty  unit  [price]  [total]  [warehouse]`, with the
/// description recovered from a labeled line near the row.
fn tier_relaxed(section: &str) -> Vec<OrderLineItem> {
    let re = Regex::new(
        r"(?m)^\s*(?P<num>\d{1,3})\s+(?P<code>[A-Z][A-Z0-9.\-/]{2,})\s+(?P<qty>\d+(?:,\d+)?)\s+(?P<unit>[A-Z]{2,4})\b(?:\s+(?P<price>\d[\d.]*,\d{2}))?(?:\s+(?P<total>\d[\d.]*,\d{2}))?(?:\s+(?P<wh>[A-Z]{2,3}\d{1,3}))?\s*$",
    )
    .unwrap();

    re.captures_iter(section)
        .filter_map(|cap| {
            let quantity = normalize::parse_locale_number(&cap["qty"]);
            if quantity <= 0.0 {
                return None;
            }
            let row_end = cap.get(0).map(|m| m.end()).unwrap_or(0);
            Some(OrderLineItem {
                item_number: cap["num"].parse().ok()?,
                item_code: cap["code"].to_string(),
                description: lookup_description(section, row_end).unwrap_or_default(),
                quantity,
                unit: Some(cap["unit"].to_string()),
                warehouse: group_str(&cap, "wh"),
                unit_price: group_num(&cap, "price"),
                total_value: group_num(&cap, "total"),
                ..Default::default()
            })
        })
        .collect()
}

/// Tier 3: last resort for heavily degraded text — `code qty unit` with
/// nothing else recoverable. Item numbers are assigned sequentially.
fn tier_minimal(section: &str) -> Vec<OrderLineItem> {
    let re = Regex::new(
        r"(?m)^\s*(?P<code>[A-Z][A-Z0-9.\-/]{2,})\s+(?P<qty>\d+(?:,\d+)?)\s+(?P<unit>[A-Z]{2,4})\b",
    )
    .unwrap();

    re.captures_iter(section)
        .enumerate()
        .filter_map(|(i, cap)| {
            let quantity = normalize::parse_locale_number(&cap["qty"]);
            if quantity <= 0.0 {
                return None;
            }
            Some(OrderLineItem {
                item_number: i as u32 + 1,
                item_code: cap["code"].to_string(),
                description: PLACEHOLDER_DESCRIPTION.to_string(),
                quantity,
                unit: Some(cap["unit"].to_string()),
                ..Default::default()
            })
        })
        .collect()
}

/// Find a `Description: …` label shortly after a relaxed-tier row.
fn lookup_description(section: &str, from: usize) -> Option<String> {
    let tail = section.get(from..)?;
    let re = Regex::new(r"(?im)^\s*Description\s*:?\s*(\S.*)$").ok()?;
    let cap = re.captures(tail)?;
    if cap.get(0)?.start() > DESCRIPTION_WINDOW {
        return None;
    }
    Some(normalize::strip_regulatory_text(cap[1].trim()))
}

fn group_str(cap: &regex::Captures<'_>, name: &str) -> Option<String> {
    cap.name(name).map(|m| m.as_str().to_string())
}

fn group_num(cap: &regex::Captures<'_>, name: &str) -> Option<f64> {
    cap.name(name)
        .map(|m| normalize::parse_locale_number(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_section_marker_means_no_items() {
        let text = "Order No: 1\n1 MAT-001 HEX BOLT 10 PC\n";
        assert!(extract_items(text).is_empty());
    }

    #[test]
    fn strict_tier_captures_full_rows() {
        let text = "Items\n\
                    1 MAT-001 HEX BOLT M8 100 PC 2,50 0,00 10,00 18,00 275,00 WH1\n\
                    2 MAT-002 FLAT WASHER 50 PC 1,00 0,00 5,00 18,00 52,50 WH2\n";
        let items = extract_items(text);
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.item_number, 1);
        assert_eq!(first.item_code, "MAT-001");
        assert_eq!(first.description, "HEX BOLT M8");
        assert_eq!(first.quantity, 100.0);
        assert_eq!(first.unit.as_deref(), Some("PC"));
        assert_eq!(first.unit_price, Some(2.5));
        assert_eq!(first.ipi_pct, Some(10.0));
        assert_eq!(first.icms_pct, Some(18.0));
        assert_eq!(first.total_value, Some(275.0));
        assert_eq!(first.warehouse.as_deref(), Some("WH1"));
    }

    #[test]
    fn relaxed_tier_runs_only_when_strict_finds_nothing() {
        let text = "Items\n\
                    1 MAT-010 25 PC 4,00 100,00\n\
                    Description: COPPER TERMINAL 16MM\n";
        let items = extract_items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_code, "MAT-010");
        assert_eq!(items[0].description, "COPPER TERMINAL 16MM");
        assert_eq!(items[0].unit_price, Some(4.0));
        assert_eq!(items[0].total_value, Some(100.0));
    }

    #[test]
    fn strict_result_preempts_looser_tiers() {
        // Both a strict row and a minimal-shaped row are present; the
        // cascade must return only the strict tier's output.
        let text = "Items\n\
                    1 MAT-001 HEX BOLT M8 100 PC 2,50 0,00 10,00 18,00 275,00 WH1\n\
                    MAT-099 7 PC\n";
        let items = extract_items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_code, "MAT-001");
    }

    #[test]
    fn minimal_tier_is_the_last_resort() {
        let text = "Composition\n\
                    MAT-050 12 PC\n\
                    MAT-051 3 BOX\n";
        let items = extract_items(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, PLACEHOLDER_DESCRIPTION);
        assert_eq!(items[0].item_number, 1);
        assert_eq!(items[1].item_number, 2);
        assert_eq!(items[1].unit.as_deref(), Some("BOX"));
        assert!(items.iter().all(|i| i.unit_price.is_none()));
    }

    #[test]
    fn zero_quantity_rows_are_skipped() {
        let text = "Items\n\
                    1 MAT-001 HEX BOLT M8 0 PC 2,50 0,00 10,00 18,00 0,00 WH1\n\
                    2 MAT-002 WASHER 5 PC 1,00 0,00 5,00 18,00 5,25 WH1\n";
        let items = extract_items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_code, "MAT-002");
    }
}
