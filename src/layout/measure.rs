//! Text measurement: the injected oracle that maps a run of text under a
//! style to its rendered size.

use serde::{Deserialize, Serialize};

use crate::error::MeasureError;
use crate::style::TextStyle;
use super::constants::*;

/// Rendered size of a run of text, in host units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextSize {
    pub width: f64,
    pub height: f64,
}

impl TextSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Measures text the way the host will draw it.
///
/// Implemented for closures, so a host can pass
/// `&|text: &str, style: &TextStyle| -> Result<TextSize, MeasureError> { ... }`.
pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError>;
}

impl<F> TextMeasurer for F
where
    F: Fn(&str, &TextStyle) -> Result<TextSize, MeasureError>,
{
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        self(text, style)
    }
}

/// Character-cell estimate: every character advances
/// `font_size * char_width_factor`, every row is `font_size * line_height`
/// tall. Used by hosts without a text engine (FFI, JNI) and by tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub char_width_factor: f64,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            char_width_factor: CHAR_WIDTH_FACTOR,
        }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        let mut advance = style.font_size * self.char_width_factor;
        if style.bold {
            advance *= BOLD_WIDTH_FACTOR;
        }
        let width = text.chars().count() as f64 * advance;
        let height = style.font_size * style.line_height;
        Ok(TextSize::new(width, height))
    }
}

/// Measure and reject sizes no layout can use.
pub(super) fn measure_checked(
    measurer: &dyn TextMeasurer,
    text: &str,
    style: &TextStyle,
) -> Result<TextSize, MeasureError> {
    let size = measurer.measure(text, style)?;
    let usable = |v: f64| v.is_finite() && v >= 0.0;
    if !usable(size.width) || !usable(size.height) {
        return Err(MeasureError::new(format!(
            "measurer returned {}x{} for {:?}",
            size.width, size.height, text
        )));
    }
    Ok(size)
}

/// Height of one row of text; empty rows are probed with a space.
pub(super) fn row_height(
    measurer: &dyn TextMeasurer,
    text: &str,
    style: &TextStyle,
) -> Result<f64, MeasureError> {
    let probe = if text.trim().is_empty() { EMPTY_ROW_PROBE } else { text };
    Ok(measure_checked(measurer, probe, style)?.height)
}
