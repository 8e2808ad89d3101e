//! Layout cache: memoizes layout + pagination for one signature.
//!
//! A published entry is immutable and shared through `Arc`. Any change in
//! the signature builds a complete new entry which then replaces the old
//! one in a single swap, so readers never observe a half-built layout.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::config::LayoutSettings;
use crate::error::LayoutError;
use crate::layout::{build_blocks, TextMeasurer};
use crate::model::{DocumentId, SongDocument};
use crate::paginate::{paginate, Page};
use crate::style::StyleTable;

/// Everything a layout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutSignature {
    pub document: DocumentId,
    /// `StyleTable::fingerprint`
    pub style: u64,
    pub content_width: f64,
    pub page_height: f64,
    /// `LayoutSettings::layout_fingerprint`, including the metrics version
    pub settings: u64,
}

impl LayoutSignature {
    pub fn new(
        doc: &SongDocument,
        style: &StyleTable,
        settings: &LayoutSettings,
        content_width: f64,
        page_height: f64,
    ) -> Self {
        Self {
            document: doc.id,
            style: style.fingerprint(),
            content_width,
            page_height,
            settings: settings.layout_fingerprint(),
        }
    }

    /// Dimensions compare bitwise.
    fn matches(&self, other: &LayoutSignature) -> bool {
        self.document == other.document
            && self.style == other.style
            && self.settings == other.settings
            && self.content_width.to_bits() == other.content_width.to_bits()
            && self.page_height.to_bits() == other.page_height.to_bits()
    }
}

/// Pages of one song under one signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedLayout {
    pub signature: LayoutSignature,
    pub pages: Vec<Page>,
    pub block_count: usize,
}

impl PagedLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Holds at most one published layout.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entry: RwLock<Option<Arc<PagedLayout>>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The published layout, whatever its signature.
    pub fn current(&self) -> Option<Arc<PagedLayout>> {
        let guard = self.entry.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    /// The published layout if it was built for `signature`.
    pub fn get(&self, signature: &LayoutSignature) -> Option<Arc<PagedLayout>> {
        self.current()
            .filter(|layout| layout.signature.matches(signature))
    }

    /// Drop the published layout.
    pub fn invalidate(&self) {
        let mut guard = self.entry.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }

    fn publish(&self, layout: Arc<PagedLayout>) {
        let mut guard = self.entry.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(layout);
    }

    /// Return the cached layout for these inputs, rebuilding it when any
    /// part of the signature changed.
    ///
    /// On error nothing is published and the previous layout stays in place.
    pub fn get_or_build(
        &self,
        doc: &SongDocument,
        style: &StyleTable,
        settings: &LayoutSettings,
        content_width: f64,
        page_height: f64,
        measurer: &dyn TextMeasurer,
    ) -> Result<Arc<PagedLayout>, LayoutError> {
        let signature = LayoutSignature::new(doc, style, settings, content_width, page_height);
        if let Some(hit) = self.get(&signature) {
            log::trace!("layout cache hit for song {}", doc.id);
            return Ok(hit);
        }
        log::trace!("layout cache miss for song {}", doc.id);

        let layout = Arc::new(build_layout(
            doc,
            style,
            settings,
            content_width,
            page_height,
            measurer,
        )?);
        self.publish(Arc::clone(&layout));
        Ok(layout)
    }
}

/// Build blocks and pages for one signature, uncached.
pub fn build_layout(
    doc: &SongDocument,
    style: &StyleTable,
    settings: &LayoutSettings,
    content_width: f64,
    page_height: f64,
    measurer: &dyn TextMeasurer,
) -> Result<PagedLayout, LayoutError> {
    if !(page_height.is_finite() && page_height > 0.0) {
        return Err(LayoutError::InvalidPageHeight(page_height));
    }
    let signature = LayoutSignature::new(doc, style, settings, content_width, page_height);
    let blocks = build_blocks(doc, style, settings, content_width, measurer)?;
    let block_count = blocks.len();
    let pages = paginate(blocks, page_height, &settings.pagination)?;

    Ok(PagedLayout {
        signature,
        pages,
        block_count,
    })
}
