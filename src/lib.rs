//! Canonical purchase-order extraction from heterogeneous ERP exports.
//!
//! Three document shapes are supported: a two-sheet workbook, a
//! semicolon-delimited sectioned text export, and per-page plain text
//! recovered from a paginated (scanned/exported) document. Each is
//! converted into the same canonical order — header plus ordered line
//! items — with a completeness score on the paginated path instead of
//! hard failure.

pub mod config;
pub mod delimited;
pub mod dispatch;
pub mod error;
pub mod heuristics;
pub mod model;
pub mod normalize;
pub mod page_source;
pub mod pdf_pages;
pub mod spreadsheet;

pub use config::ExtractorConfig;
pub use dispatch::{InputFormat, extract_file};
pub use error::{ExtractError, Result};
pub use heuristics::{CancelFlag, cancel_flag, extract_pages};
pub use model::{
    BusinessArea, ExtractedOrder, ExtractionQuality, OrderHeader, OrderLineItem, Priority,
    SourceClassification,
};
pub use page_source::{MemoryPages, PageSource};
pub use pdf_pages::PdfPages;
