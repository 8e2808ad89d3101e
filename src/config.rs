//! Layout settings: font metrics, spacing, pagination heuristics and
//! viewport padding.
//!
//! Every field has a default, so a partial JSON document from the host's
//! preferences merges over the defaults.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// All knobs the layout builder and paginator read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub font: FontSettings,
    /// Height of the spacer emitted for a blank line
    pub blank_height: f64,
    pub pagination: PaginationOptions,
    pub ui: UiSettings,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            font: FontSettings::default(),
            blank_height: 10.0,
            pagination: PaginationOptions::default(),
            ui: UiSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub family: String,
    /// Lyric font size in host units
    pub size: f64,
    pub line_height: f64,
    /// Sizes of the other element classes, relative to `size`
    pub chord_size_factor: f64,
    pub comment_size_factor: f64,
    pub header_size_factor: f64,
    pub title_size_factor: f64,
    pub subtitle_size_factor: f64,
    pub meta_size_factor: f64,
    /// Bumped by the host whenever font rendering changes (new font file,
    /// DPI change); part of the layout cache signature
    pub metrics_version: u64,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: "DejaVu Sans".to_string(),
            size: 34.0,
            line_height: 1.15,
            chord_size_factor: 0.70,
            comment_size_factor: 0.60,
            header_size_factor: 0.70,
            title_size_factor: 1.15,
            subtitle_size_factor: 0.70,
            meta_size_factor: 0.50,
            metrics_version: 0,
        }
    }
}

/// Page-break heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// A section header starts a new page when the current page is already
    /// filled to at least this fraction of the page height
    pub soft_break_ratio: f64,
    /// Move a header to the next page when the block after it would not fit
    pub keep_header_with_next: bool,
}

/// Default for `soft_break_ratio`.
pub const DEFAULT_SOFT_BREAK_RATIO: f64 = 0.70;

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            soft_break_ratio: DEFAULT_SOFT_BREAK_RATIO,
            keep_header_with_next: true,
        }
    }
}

/// Padding between the viewport edge and the content area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub padding_x: f64,
    pub padding_y: f64,
    /// Space kept free at the bottom for the page footer/hint
    pub page_bottom_reserve: f64,
    /// Lower bound for content width and height
    pub min_content_size: f64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            padding_x: 36.0,
            padding_y: 24.0,
            page_bottom_reserve: 64.0,
            min_content_size: 200.0,
        }
    }
}

/// Size of the host's drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl LayoutSettings {
    /// Parse settings JSON, filling anything missing from the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: LayoutSettings =
            serde_json::from_str(json).map_err(|source| ConfigError::Json {
                what: "settings",
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.font.size.is_finite() && self.font.size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "font.size must be positive, got {}",
                self.font.size
            )));
        }
        if !(self.blank_height.is_finite() && self.blank_height >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "blank_height must not be negative, got {}",
                self.blank_height
            )));
        }
        let ratio = self.pagination.soft_break_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Invalid(format!(
                "pagination.soft_break_ratio must be within 0..=1, got {ratio}"
            )));
        }
        Ok(())
    }

    /// Hash of every setting that changes block heights or page breaks:
    /// the font, `blank_height` and the pagination options. Floats hash
    /// bitwise. The UI padding is left out; it only reaches layout through
    /// the content width and page height.
    pub fn layout_fingerprint(&self) -> u64 {
        let font = &self.font;
        let mut hasher = DefaultHasher::new();
        font.family.hash(&mut hasher);
        for value in [
            font.size,
            font.line_height,
            font.chord_size_factor,
            font.comment_size_factor,
            font.header_size_factor,
            font.title_size_factor,
            font.subtitle_size_factor,
            font.meta_size_factor,
            self.blank_height,
            self.pagination.soft_break_ratio,
        ] {
            value.to_bits().hash(&mut hasher);
        }
        font.metrics_version.hash(&mut hasher);
        self.pagination.keep_header_with_next.hash(&mut hasher);
        hasher.finish()
    }

    /// Content area (width, height) for a viewport, before title chrome.
    pub fn content_area(&self, viewport: Viewport) -> (f64, f64) {
        let ui = &self.ui;
        let width = (viewport.width - 2.0 * ui.padding_x).max(ui.min_content_size);
        let height = (viewport.height - 2.0 * ui.padding_y - ui.page_bottom_reserve)
            .max(ui.min_content_size);
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_merges_over_defaults() {
        let settings =
            LayoutSettings::from_json(r#"{ "font": { "size": 40 }, "blank_height": 12 }"#).unwrap();
        assert_eq!(settings.font.size, 40.0);
        assert_eq!(settings.font.line_height, 1.15);
        assert_eq!(settings.blank_height, 12.0);
        assert_eq!(settings.pagination, PaginationOptions::default());
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        let err = LayoutSettings::from_json(r#"{ "pagination": { "soft_break_ratio": 1.5 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn fingerprint_tracks_layout_inputs_only() {
        let base = LayoutSettings::default();
        let fingerprint = base.layout_fingerprint();
        assert_eq!(fingerprint, LayoutSettings::default().layout_fingerprint());

        let mut font = base.clone();
        font.font.size = 80.0;
        let mut blank = base.clone();
        blank.blank_height = 50.0;
        let mut ratio = base.clone();
        ratio.pagination.soft_break_ratio = 0.1;
        let mut keep = base.clone();
        keep.pagination.keep_header_with_next = false;
        let mut metrics = base.clone();
        metrics.font.metrics_version = 1;
        for changed in [font, blank, ratio, keep, metrics] {
            assert_ne!(changed.layout_fingerprint(), fingerprint);
        }

        let mut padded = base.clone();
        padded.ui.padding_x = 10.0;
        assert_eq!(padded.layout_fingerprint(), fingerprint);
    }

    #[test]
    fn content_area_never_drops_below_minimum() {
        let settings = LayoutSettings::default();
        assert_eq!(settings.content_area(Viewport::new(1920.0, 1080.0)), (1848.0, 968.0));
        assert_eq!(settings.content_area(Viewport::new(100.0, 100.0)), (200.0, 200.0));
    }
}
