// src/dispatch.rs

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::heuristics::{self, CancelFlag};
use crate::model::ExtractedOrder;
use crate::pdf_pages::PdfPages;
use crate::{delimited, spreadsheet};
use std::path::Path;
use tracing::info;

/// The three document shapes the ERP hands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Spreadsheet,
    SectionedText,
    PagedDocument,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Some(Self::Spreadsheet),
            "txt" | "csv" => Some(Self::SectionedText),
            "pdf" => Some(Self::PagedDocument),
            _ => None,
        }
    }
}

/// Route a file to its extractor and return the canonical order.
pub async fn extract_file(
    path: &Path,
    config: &ExtractorConfig,
    cancel: &CancelFlag,
) -> Result<ExtractedOrder> {
    let format = InputFormat::from_path(path).ok_or_else(|| {
        ExtractError::Structure(format!("unrecognized file type: {}", path.display()))
    })?;
    info!(format = ?format, path = %path.display(), "dispatching");

    match format {
        InputFormat::Spreadsheet => spreadsheet::extract_path(path, config),
        InputFormat::SectionedText => delimited::extract_path(path, config),
        InputFormat::PagedDocument => {
            let bytes = std::fs::read(path)?;
            let mut pages = PdfPages::from_bytes(&bytes)?;
            heuristics::extract_pages(&mut pages, config, cancel, None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection_by_extension() {
        let f = |p: &str| InputFormat::from_path(Path::new(p));
        assert_eq!(f("order.xlsx"), Some(InputFormat::Spreadsheet));
        assert_eq!(f("ORDER.XLSM"), Some(InputFormat::Spreadsheet));
        assert_eq!(f("export.txt"), Some(InputFormat::SectionedText));
        assert_eq!(f("export.csv"), Some(InputFormat::SectionedText));
        assert_eq!(f("scan.pdf"), Some(InputFormat::PagedDocument));
        assert_eq!(f("order.docx"), None);
        assert_eq!(f("noextension"), None);
    }

    #[tokio::test]
    async fn unknown_extension_is_structural() {
        let cancel = heuristics::cancel_flag();
        let result = extract_file(
            Path::new("order.docx"),
            &ExtractorConfig::default(),
            &cancel,
        )
        .await;
        assert!(matches!(result, Err(ExtractError::Structure(_))));
    }
}
