//! Layout builder: turns a SongDocument into a flat sequence of
//! measured render blocks.
//!
//! Heights come from the injected `TextMeasurer`, never from line-count
//! estimates, so pagination sees exactly what the host will draw. Blocks
//! carry their section kind but no colors: the renderer resolves colors
//! from the style table at draw time.

mod constants;
mod measure;
mod wrap;

use serde::{Deserialize, Serialize};

use crate::config::LayoutSettings;
use crate::error::LayoutError;
use crate::model::*;
use crate::style::{ElementClass, StyleTable};
use constants::CHORD_ROW_SEPARATOR;
use measure::{measure_checked, row_height};
use wrap::wrap_line;

pub use measure::{MonospaceMeasurer, TextMeasurer, TextSize};

// ═══════════════════════════════════════════════════════════════════════
// Render blocks
// ═══════════════════════════════════════════════════════════════════════

/// One atomic visual unit with its measured height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderBlock {
    pub kind: BlockKind,
    pub height: f64,
    /// Section the block belongs to, for styling and page-break decisions
    pub section_kind: SectionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    SectionHeader {
        label: String,
    },
    Comment {
        text: String,
        /// `text` word-wrapped to the content width
        rows: Vec<String>,
    },
    LyricLine {
        lyric_text: String,
        /// Offsets relative to `lyric_text`
        chords: Vec<ChordAnchor>,
        /// 0 for the first visual row of a logical line
        wrap_index: usize,
    },
    Blank,
}

impl RenderBlock {
    pub fn is_header(&self) -> bool {
        matches!(self.kind, BlockKind::SectionHeader { .. })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, BlockKind::Blank)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════

/// Lay out every section of `doc` for a column `content_width` wide.
///
/// Fails only when the width is unusable or the measurer fails; no partial
/// block list is returned in that case.
pub fn build_blocks(
    doc: &SongDocument,
    style: &StyleTable,
    settings: &LayoutSettings,
    content_width: f64,
    measurer: &dyn TextMeasurer,
) -> Result<Vec<RenderBlock>, LayoutError> {
    if !(content_width.is_finite() && content_width > 0.0) {
        return Err(LayoutError::InvalidContentWidth(content_width));
    }

    let mut blocks = Vec::new();
    for section in &doc.sections {
        layout_section(section, style, settings, content_width, measurer, &mut blocks)?;
    }

    // Spacers only separate content; none at the edges of the song.
    let first = blocks.iter().position(|b| !b.is_blank()).unwrap_or(blocks.len());
    blocks.drain(..first);
    while blocks.last().is_some_and(RenderBlock::is_blank) {
        blocks.pop();
    }

    log::debug!(
        "laid out song {} at width {content_width}: {} blocks",
        doc.id,
        blocks.len()
    );
    Ok(blocks)
}

fn layout_section(
    section: &Section,
    style: &StyleTable,
    settings: &LayoutSettings,
    content_width: f64,
    measurer: &dyn TextMeasurer,
    out: &mut Vec<RenderBlock>,
) -> Result<(), LayoutError> {
    let kind = &section.kind;

    if section.is_labeled() {
        let label = section.display_label();
        let header_style = style.resolve(kind, ElementClass::Header, settings);
        let height = row_height(measurer, &label, &header_style)?;
        out.push(RenderBlock {
            kind: BlockKind::SectionHeader { label },
            height,
            section_kind: kind.clone(),
        });
    }

    for line in &section.lines {
        if line.is_blank() {
            out.push(RenderBlock {
                kind: BlockKind::Blank,
                height: settings.blank_height,
                section_kind: kind.clone(),
            });
        } else if *kind == SectionKind::Comment {
            out.push(comment_block(line, kind, style, settings, content_width, measurer)?);
        } else {
            lyric_blocks(line, kind, style, settings, content_width, measurer, out)?;
        }
    }
    Ok(())
}

fn comment_block(
    line: &Line,
    kind: &SectionKind,
    style: &StyleTable,
    settings: &LayoutSettings,
    content_width: f64,
    measurer: &dyn TextMeasurer,
) -> Result<RenderBlock, LayoutError> {
    let comment_style = style.resolve(kind, ElementClass::Comment, settings);
    let plain = Line::plain(line.lyric_text.clone());
    let wrapped = wrap_line(&plain, content_width, |text| {
        Ok(measure_checked(measurer, text, &comment_style)?.width)
    })?;

    let mut height = 0.0;
    let mut rows = Vec::with_capacity(wrapped.len());
    for row in wrapped {
        height += row_height(measurer, &row.text, &comment_style)?;
        rows.push(row.text);
    }

    Ok(RenderBlock {
        kind: BlockKind::Comment {
            text: line.lyric_text.clone(),
            rows,
        },
        height,
        section_kind: kind.clone(),
    })
}

/// Wrap one lyric line into rows, each a chord row over a lyric row.
fn lyric_blocks(
    line: &Line,
    kind: &SectionKind,
    style: &StyleTable,
    settings: &LayoutSettings,
    content_width: f64,
    measurer: &dyn TextMeasurer,
    out: &mut Vec<RenderBlock>,
) -> Result<(), LayoutError> {
    let lyric_style = style.resolve(kind, ElementClass::Lyric, settings);

    // Every row of a chorded line reserves the chord row, so wrapped rows
    // of one line stay evenly spaced.
    let chord_row = if line.chords.is_empty() {
        0.0
    } else {
        let chord_style = style.resolve(kind, ElementClass::Chord, settings);
        let symbols: Vec<&str> = line.chords.iter().map(|c| c.symbol.as_str()).collect();
        row_height(measurer, &symbols.join(CHORD_ROW_SEPARATOR), &chord_style)?
    };

    let rows = wrap_line(line, content_width, |text| {
        Ok(measure_checked(measurer, text, &lyric_style)?.width)
    })?;

    for (wrap_index, row) in rows.into_iter().enumerate() {
        let height = row_height(measurer, &row.text, &lyric_style)? + chord_row;
        out.push(RenderBlock {
            kind: BlockKind::LyricLine {
                lyric_text: row.text,
                chords: row.chords,
                wrap_index,
            },
            height,
            section_kind: kind.clone(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// Title chrome
// ═══════════════════════════════════════════════════════════════════════

/// Height of the title, subtitle and meta lines drawn atop every page.
/// The host subtracts it from the page height before paginating.
pub fn measure_title_area(
    doc: &SongDocument,
    style: &StyleTable,
    settings: &LayoutSettings,
    fallback_title: &str,
    measurer: &dyn TextMeasurer,
) -> Result<f64, LayoutError> {
    let chrome = doc.title_block(fallback_title);
    let plain = SectionKind::Plain;

    let mut height = row_height(
        measurer,
        &chrome.title,
        &style.resolve(&plain, ElementClass::Title, settings),
    )?;
    if let Some(subtitle) = &chrome.subtitle {
        height += row_height(
            measurer,
            subtitle,
            &style.resolve(&plain, ElementClass::Subtitle, settings),
        )?;
    }
    if !chrome.meta_line.is_empty() {
        height += row_height(
            measurer,
            &chrome.meta_line,
            &style.resolve(&plain, ElementClass::Meta, settings),
        )?;
    }
    Ok(height)
}
