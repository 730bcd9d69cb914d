// src/model.rs

use serde::Deserialize;
use serde::Serialize;
use time::Date;

/// Where a line item is sourced from, derived from the 2-letter
/// material-type code carried by some input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceClassification {
    #[default]
    InStock,
    Production,
    ThirdParty,
    Transfer,
}

impl SourceClassification {
    /// Map a material-type code to a classification. Unrecognized codes
    /// (and absent ones) mean the item ships from stock.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "PR" => Self::Production,
            "TP" => Self::ThirdParty,
            "TR" => Self::Transfer,
            _ => Self::InStock,
        }
    }
}

/// Coarse business-area classification derived from cost-center text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessArea {
    Ecommerce,
    Branch,
    Projects,
    Corporate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

/// Canonical order header. Every extractor populates this; fields a
/// format does not carry stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub order_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_tax_id: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    /// Municipality with region suffix, e.g. "Springfield / North".
    pub municipality: Option<String>,
    pub issue_date: Option<Date>,
    /// Always populated on successful extraction: read from the source or
    /// computed as issue date + N business days.
    pub delivery_date: Option<Date>,
    pub carrier: Option<String>,
    pub freight_type: Option<String>,
    pub freight_value: Option<f64>,
    pub cost_center: Option<String>,
    pub accounting_item: Option<String>,
    pub business_area: Option<BusinessArea>,
    pub operation_code: Option<String>,
    pub sales_executive: Option<String>,
    pub notes: Option<String>,
    pub priority: Priority,
}

impl OrderHeader {
    /// How many of the expected header fields were resolved.
    ///
    /// The denominator is the set a complete document always carries;
    /// phone, accounting item and the other heuristic extras do not count
    /// against completeness.
    pub fn coverage(&self) -> (usize, usize) {
        let filled = [
            self.order_number.is_some(),
            self.issue_date.is_some(),
            self.delivery_date.is_some(),
            self.customer_name.is_some(),
            self.customer_tax_id.is_some(),
            self.delivery_address.is_some(),
            self.municipality.is_some(),
            self.carrier.is_some(),
            self.freight_type.is_some(),
            self.freight_value.is_some(),
            self.cost_center.is_some(),
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, EXPECTED_HEADER_FIELDS)
    }
}

/// Number of header fields counted by [`OrderHeader::coverage`].
pub const EXPECTED_HEADER_FIELDS: usize = 11;

/// One order line. Items without a code, or with a non-positive quantity,
/// never make it into the canonical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Sequence number within the order.
    pub item_number: u32,
    pub item_code: String,
    pub description: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub warehouse: Option<String>,
    pub unit_price: Option<f64>,
    pub discount: Option<f64>,
    pub ipi_pct: Option<f64>,
    pub icms_pct: Option<f64>,
    pub total_value: Option<f64>,
    pub source: SourceClassification,
    pub ncm_code: Option<String>,
    pub material_type: Option<String>,
    /// Propagated from the header when the row itself has none.
    pub delivery_date: Option<Date>,
}

/// Completeness summary for the paginated path, used downstream to decide
/// whether a human needs to review the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionQuality {
    pub has_order_number: bool,
    pub has_customer_name: bool,
    pub items_count: usize,
    pub items_with_unit_price: usize,
    /// Resolved header fields / expected header fields.
    pub header_field_coverage: f64,
}

impl ExtractionQuality {
    pub fn measure(header: &OrderHeader, items: &[OrderLineItem]) -> Self {
        let (filled, total) = header.coverage();
        Self {
            has_order_number: header.order_number.is_some(),
            has_customer_name: header.customer_name.is_some(),
            items_count: items.len(),
            items_with_unit_price: items.iter().filter(|i| i.unit_price.is_some()).count(),
            header_field_coverage: filled as f64 / total as f64,
        }
    }
}

/// What every extractor hands back to the caller. Only the paginated path
/// produces a quality summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedOrder {
    pub header: OrderHeader,
    pub items: Vec<OrderLineItem>,
    pub quality: Option<ExtractionQuality>,
}
