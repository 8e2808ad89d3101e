//! Paginator: partitions measured render blocks into pages.
//!
//! Single forward pass. Blocks are atomic: a block never splits, and a
//! block taller than the page gets a page of its own. Every input block
//! lands on exactly one page, in input order.

use serde::{Deserialize, Serialize};

use crate::config::PaginationOptions;
use crate::error::LayoutError;
use crate::layout::RenderBlock;

/// Slack for summed float heights.
const HEIGHT_EPSILON: f64 = 1e-6;

/// One screenful of blocks.
///
/// `height` never exceeds the page height by more than `HEIGHT_EPSILON`
/// (1e-6), the slack allowed for rounding in summed float heights. The one
/// exception is an overflow page holding a single oversized block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based page index
    pub index: usize,
    pub blocks: Vec<RenderBlock>,
    /// Sum of block heights
    pub height: f64,
}

impl Page {
    fn new(index: usize) -> Self {
        Self {
            index,
            blocks: Vec::new(),
            height: 0.0,
        }
    }

    fn push(&mut self, block: RenderBlock) {
        self.height += block.height;
        self.blocks.push(block);
    }

    /// A page holding a single block taller than the page height.
    pub fn is_overflow(&self, page_height: f64) -> bool {
        self.blocks.len() == 1 && self.height > page_height + HEIGHT_EPSILON
    }
}

/// Split `blocks` into pages no taller than `page_height`.
pub fn paginate(
    blocks: Vec<RenderBlock>,
    page_height: f64,
    options: &PaginationOptions,
) -> Result<Vec<Page>, LayoutError> {
    if !(page_height.is_finite() && page_height > 0.0) {
        return Err(LayoutError::InvalidPageHeight(page_height));
    }

    let soft_limit = options.soft_break_ratio * page_height;
    let fits = |used: f64, extra: f64| used + extra <= page_height + HEIGHT_EPSILON;

    let mut pages: Vec<Page> = Vec::new();
    let mut current = Page::new(0);
    let mut iter = blocks.into_iter().peekable();

    while let Some(block) = iter.next() {
        if !current.blocks.is_empty() {
            let mut close = !fits(current.height, block.height);

            if !close && block.is_header() {
                // Sections should not open at the very bottom of a page.
                close = current.height >= soft_limit - HEIGHT_EPSILON;
                if !close && options.keep_header_with_next {
                    if let Some(next) = iter.peek() {
                        close = !fits(current.height, block.height + next.height);
                    }
                }
            }

            if close {
                let index = current.index + 1;
                pages.push(std::mem::replace(&mut current, Page::new(index)));
            }
        }

        if block.height > page_height + HEIGHT_EPSILON {
            log::warn!(
                "block of height {} exceeds page height {page_height}; placed on page {} alone",
                block.height,
                current.index + 1
            );
        }
        current.push(block);
    }

    // An empty song still shows one (empty) page.
    pages.push(current);

    log::debug!("paginated into {} pages at height {page_height}", pages.len());
    Ok(pages)
}
