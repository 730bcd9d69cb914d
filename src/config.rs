// src/config.rs

use crate::error::{ExtractError, Result};
use crate::model::BusinessArea;
use serde::Deserialize;
use std::{fs, path::Path};

/// Tunables for the extraction pipeline.
///
/// The business-area rule list is deliberately data, not code: cost-center
/// phrasings vary by ERP installation and the built-in table is not
/// assumed exhaustive.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Business days added to the issue date when a document carries no
    /// delivery date.
    #[serde(default = "default_delivery_business_days")]
    pub delivery_business_days: u32,

    /// Ordered substring rules mapping cost-center text to a business
    /// area; first match wins.
    #[serde(default = "default_business_area_rules")]
    pub business_area_rules: Vec<BusinessAreaRule>,

    /// Markers that signal the end of a paginated document (totals line,
    /// data-protection footer). Matched case-insensitively.
    #[serde(default = "default_end_markers")]
    pub end_of_document_markers: Vec<String>,

    /// Stop reading pages once the header is resolved, at least one item
    /// was found and an end-of-document marker appeared.
    #[serde(default)]
    pub early_stop: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessAreaRule {
    /// Case-insensitive substring matched against the cost-center text.
    pub contains: String,
    pub area: BusinessArea,
}

fn default_delivery_business_days() -> u32 {
    10
}

fn default_business_area_rules() -> Vec<BusinessAreaRule> {
    let rule = |contains: &str, area| BusinessAreaRule {
        contains: contains.to_string(),
        area,
    };
    vec![
        rule("e-commerce", BusinessArea::Ecommerce),
        rule("ecommerce", BusinessArea::Ecommerce),
        rule("online", BusinessArea::Ecommerce),
        rule("branch", BusinessArea::Branch),
        rule("store", BusinessArea::Branch),
        rule("project", BusinessArea::Projects),
    ]
}

fn default_end_markers() -> Vec<String> {
    vec![
        "total of order".to_string(),
        "order total".to_string(),
        "general data protection".to_string(),
    ]
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            delivery_business_days: default_delivery_business_days(),
            business_area_rules: default_business_area_rules(),
            end_of_document_markers: default_end_markers(),
            early_stop: false,
        }
    }
}

impl ExtractorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ExtractError::Structure(format!("config: {e}")))
    }

    /// Classify a resolved cost center; `Corporate` is the fall-through.
    pub fn classify_business_area(&self, cost_center: &str) -> BusinessArea {
        let lowered = cost_center.to_lowercase();
        self.business_area_rules
            .iter()
            .find(|rule| lowered.contains(&rule.contains.to_lowercase()))
            .map(|rule| rule.area)
            .unwrap_or(BusinessArea::Corporate)
    }

    /// Does the accumulated buffer contain an end-of-document marker?
    pub fn has_end_marker(&self, buffer: &str) -> bool {
        let lowered = buffer.to_lowercase();
        self.end_of_document_markers
            .iter()
            .any(|m| lowered.contains(&m.to_lowercase()))
    }
}
