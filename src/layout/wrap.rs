//! Chord-aware word wrap.
//!
//! A logical line is split into visual rows by greedy word accumulation
//! against the content width. Every chord moves to the row whose character
//! range contains its offset, re-based to that row's start, so a chord is
//! always drawn above the syllable it belongs to.

use crate::error::MeasureError;
use crate::model::{ChordAnchor, Line};
use super::constants::WIDTH_EPSILON;

/// One visual row of a wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct WrappedRow {
    pub(super) text: String,
    /// Offsets relative to `text`, within `0..=text.chars().count()`
    pub(super) chords: Vec<ChordAnchor>,
}

/// A run of non-whitespace characters, `start..end` in char indices.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Word {
    start: usize,
    end: usize,
}

fn split_words(chars: &[char]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in chars.iter().enumerate() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                words.push(Word { start: s, end: i });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(Word { start: s, end: chars.len() });
    }
    words
}

fn slice(chars: &[char], start: usize, end: usize) -> String {
    chars[start..end].iter().collect()
}

/// Split words wider than the content width at character boundaries.
/// Every piece keeps at least one character.
fn fit_pieces<W>(
    chars: &[char],
    words: Vec<Word>,
    content_width: f64,
    width_of: &mut W,
) -> Result<Vec<Word>, MeasureError>
where
    W: FnMut(&str) -> Result<f64, MeasureError>,
{
    let mut pieces = Vec::with_capacity(words.len());
    for word in words {
        if width_of(&slice(chars, word.start, word.end))? <= content_width + WIDTH_EPSILON {
            pieces.push(word);
            continue;
        }
        let mut start = word.start;
        while start < word.end {
            let mut end = start + 1;
            while end < word.end
                && width_of(&slice(chars, start, end + 1))? <= content_width + WIDTH_EPSILON
            {
                end += 1;
            }
            pieces.push(Word { start, end });
            start = end;
        }
    }
    Ok(pieces)
}

/// Wrap `line` to `content_width`, measuring candidate rows with `width_of`.
///
/// Every row is measured against `content_width`. Leading indentation and
/// trailing whitespace are kept whenever they fit, so a line that fits comes
/// back as a single row identical to the input.
pub(super) fn wrap_line<W>(
    line: &Line,
    content_width: f64,
    mut width_of: W,
) -> Result<Vec<WrappedRow>, MeasureError>
where
    W: FnMut(&str) -> Result<f64, MeasureError>,
{
    let chars: Vec<char> = line.lyric_text.chars().collect();
    let words = split_words(&chars);
    if words.is_empty() {
        return Ok(vec![WrappedRow {
            text: line.lyric_text.clone(),
            chords: line.chords.clone(),
        }]);
    }
    let pieces = fit_pieces(&chars, words, content_width, &mut width_of)?;

    let fits = |width: f64| width <= content_width + WIDTH_EPSILON;

    // (text start, text end) per row. Row 0 keeps the indentation when it
    // fits; anchors inside dropped indentation land on offset 0.
    let first = pieces[0];
    let indented = slice(&chars, 0, first.end);
    let start = if fits(width_of(&indented)?) { 0 } else { first.start };
    let mut rows: Vec<(usize, usize)> = vec![(start, first.end)];
    for piece in &pieces[1..] {
        let Some(current) = rows.last_mut() else { break };
        let candidate = slice(&chars, current.0, piece.end);
        if fits(width_of(&candidate)?) {
            current.1 = piece.end;
        } else {
            rows.push((piece.start, piece.end));
        }
    }
    // Trailing whitespace stays on the last row when it fits; a chord past
    // the row end clamps to it.
    if let Some(last) = rows.last_mut() {
        if last.1 < chars.len() && fits(width_of(&slice(&chars, last.0, chars.len()))?) {
            last.1 = chars.len();
        }
    }

    let mut wrapped: Vec<WrappedRow> = rows
        .iter()
        .map(|&(start, end)| WrappedRow {
            text: slice(&chars, start, end),
            chords: Vec::new(),
        })
        .collect();

    for anchor in &line.chords {
        // rows are ordered by start
        let idx = rows
            .iter()
            .rposition(|&(start, _)| start <= anchor.offset)
            .unwrap_or(0);
        let (start, end) = rows[idx];
        let offset = anchor.offset.saturating_sub(start).min(end - start);
        wrapped[idx]
            .chords
            .push(ChordAnchor::new(offset, anchor.symbol.clone()));
    }

    Ok(wrapped)
}
