//! Shared constants for the layout builder (host units).

/// Average glyph advance relative to font size, for the monospace estimate.
pub(super) const CHAR_WIDTH_FACTOR: f64 = 0.55;

/// Bold glyphs run a little wider.
pub(super) const BOLD_WIDTH_FACTOR: f64 = 1.05;

/// Slack for float comparisons against the content width.
pub(super) const WIDTH_EPSILON: f64 = 1e-6;

/// Separator between chord symbols when measuring a chord row.
pub(super) const CHORD_ROW_SEPARATOR: &str = " ";

/// Text measured in place of an empty row so it still gets a height.
pub(super) const EMPTY_ROW_PROBE: &str = " ";
