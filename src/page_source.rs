// src/page_source.rs

use crate::error::{ExtractError, Result};
use async_trait::async_trait;

/// A paginated source of plain text.
///
/// Decoding page images or PDF content streams into text is a collaborator
/// capability, not part of the extraction core; the core only ever sees
/// page count plus per-page text through this trait.
#[async_trait]
pub trait PageSource: Send {
    fn page_count(&self) -> usize;

    async fn page_text(&mut self, index: usize) -> Result<String>;
}

/// Page texts already held in memory — for tests and for callers that run
/// their own decoding service.
pub struct MemoryPages {
    pages: Vec<String>,
}

impl MemoryPages {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl PageSource for MemoryPages {
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
