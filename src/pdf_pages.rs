// src/pdf_pages.rs

use crate::error::{ExtractError, Result};
use crate::page_source::PageSource;
use async_trait::async_trait;
use lopdf::Document;
use tracing::{info, warn};

/// Minimum number of non-whitespace characters we expect from a page that
/// really carries text. Below this the document is treated as scanned.
const MIN_TEXT_CHARS: usize = 30;

/// `PageSource` backed by a text-layer PDF.
///
/// The whole document is decoded up front (the pdf-extract API works on
/// the full byte buffer) and pages are served from the split result; the
/// extraction loop still suspends between pages.
pub struct PdfPages {
    pages: Vec<String>,
}

impl PdfPages {
    /// Decode a PDF byte buffer into per-page text.
    ///
    /// Fails with [`ExtractError::Document`] when the bytes are not a
    /// parseable PDF, or when the document is image-only — OCR belongs to
    /// an external service, not to this crate.
    pub fn from_bytes(pdf_bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractError::Document(format!("failed to parse PDF: {e}")))?;

        if looks_like_scanned(&doc) {
            return Err(ExtractError::Document(
                "image-only document: page text must come from an OCR service".to_string(),
            ));
        }

        let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractError::Document(format!("text extraction failed: {e}")))?;

        let meaningful: usize = pages
            .iter()
            .map(|p| p.chars().filter(|c| !c.is_whitespace()).count())
            .sum();
        if meaningful < MIN_TEXT_CHARS {
            warn!(chars = meaningful, "extracted text too short, treating as scanned");
            return Err(ExtractError::Document(
                "document yielded no usable text".to_string(),
            ));
        }

        info!(pages = pages.len(), chars = meaningful, "decoded PDF page text");
        Ok(Self { pages })
    }
}

#[async_trait]
impl PageSource for PdfPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn page_text(&mut self, index: usize) -> Result<String> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| ExtractError::Document(format!("page {index} out of range")))
    }
}

/// Inspect the PDF object tree for signs that every page is a single
/// image with no text operators: XObject images present, Font resources
/// absent. If ≥80% of pages look like that, the document is scanned.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false; // can't tell, let text extraction try
    }

    let image_only = pages
        .values()
        .filter(|object_id| {
            let Ok(page_obj) = doc.get_object(**object_id) else {
                return false;
            };
            let Ok(page_dict) = page_obj.as_dict() else {
                return false;
            };
            let has = |key: &[u8]| {
                page_dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| doc.dereference(r).ok())
                    .and_then(|(_, resolved)| resolved.as_dict().ok())
                    .and_then(|res| res.get(key).ok())
                    .and_then(|v| doc.dereference(v).ok())
                    .and_then(|(_, resolved)| resolved.as_dict().ok())
                    .is_some_and(|d| !d.is_empty())
            };
            has(b"XObject") && !has(b"Font")
        })
        .count();

    let ratio = image_only as f64 / pages.len() as f64;
    info!(
        total_pages = pages.len(),
        image_only = image_only,
        ratio = format!("{ratio:.2}"),
        "scanned-page analysis"
    );
    ratio >= 0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_document_error() {
        let result = PdfPages::from_bytes(b"this is not a pdf");
        assert!(matches!(result, Err(ExtractError::Document(_))));
    }
}
