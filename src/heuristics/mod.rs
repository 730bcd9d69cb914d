// src/heuristics/mod.rs
//
// Best-effort extraction from paginated document text. Pages arrive one
// at a time from a `PageSource`; after every page the header and item
// extractors re-run against the whole accumulated buffer, so fields that
// straddle page breaks resolve as soon as both halves are present.

mod header;
mod items;

pub use items::PLACEHOLDER_DESCRIPTION;

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::model::{
    ExtractedOrder, ExtractionQuality, OrderHeader, EXPECTED_HEADER_FIELDS,
};
use crate::page_source::PageSource;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Shared cancellation flag, checked once per page boundary. Cooperative:
/// a page already being processed finishes before the signal is seen.
pub type CancelFlag = Arc<AtomicBool>;

pub fn cancel_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}

/// Walk the document page by page and assemble the canonical order plus
/// its completeness score.
///
/// The loop yields to the runtime between pages so a host UI stays
/// responsive, invokes `progress` once per completed page, and — when
/// `config.early_stop` is set — halts as soon as the header is resolved,
/// at least one item was found and an end-of-document marker appeared.
pub async fn extract_pages<S: PageSource>(
    source: &mut S,
    config: &ExtractorConfig,
    cancel: &CancelFlag,
    mut progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Result<ExtractedOrder> {
    let total = source.page_count();
    if total == 0 {
        return Err(ExtractError::Structure("document has no pages".to_string()));
    }

    let mut buffer = String::new();
    let mut order_header = OrderHeader::default();
    let mut order_items = Vec::new();
    let mut seen: HashSet<(String, u32)> = HashSet::new();

    for page in 0..total {
        if cancel.load(Ordering::Relaxed) {
            info!(page, "cancellation signal observed");
            return Err(ExtractError::Cancelled);
        }

        let text = source.page_text(page).await?;
        buffer.push_str(&text);
        buffer.push('\n');

        if order_header.coverage().0 < EXPECTED_HEADER_FIELDS {
            order_header = header::extract_header(&buffer, config);
        }

        let mut new_items = 0;
        for item in items::extract_items(&buffer) {
            if seen.insert((item.item_code.clone(), item.item_number)) {
                order_items.push(item);
                new_items += 1;
            }
        }

        debug!(
            page,
            new_items,
            total_items = order_items.len(),
            header_fields = order_header.coverage().0,
            "page processed"
        );
        if let Some(cb) = progress.as_deref_mut() {
            cb(page + 1, total);
        }

        if config.early_stop
            && header_resolved(&order_header)
            && !order_items.is_empty()
            && config.has_end_marker(&buffer)
        {
            info!(page, "end-of-document marker found, stopping early");
            break;
        }

        tokio::task::yield_now().await;
    }

    for item in &mut order_items {
        if item.delivery_date.is_none() {
            item.delivery_date = order_header.delivery_date;
        }
    }

    let quality = ExtractionQuality::measure(&order_header, &order_items);
    info!(
        order = ?order_header.order_number,
        items = quality.items_count,
        coverage = format!("{:.2}", quality.header_field_coverage),
        "paged extraction complete"
    );

    Ok(ExtractedOrder {
        header: order_header,
        items: order_items,
        quality: Some(quality),
    })
}

/// The minimum a header must carry before early stop may fire. Weaker
/// than full coverage: freight and allocation fields are routinely
/// absent from scanned documents.
fn header_resolved(header: &OrderHeader) -> bool {
    header.order_number.is_some() && header.customer_name.is_some()
}
