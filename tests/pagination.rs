//! Integration tests: pagination of laid-out songs.

use pretty_assertions::assert_eq;
use stagelib::*;
use std::path::PathBuf;

/// One unit per character; chord rows 6 tall, everything else 10.
struct CellMeasurer;

impl TextMeasurer for CellMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        let height = if style.element == ElementClass::Chord { 6.0 } else { 10.0 };
        Ok(TextSize::new(text.chars().count() as f64, height))
    }
}

fn amazing_grace() -> SongDocument {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("songs/amazing-grace.cho");
    parse_file(&path).expect("Failed to parse amazing-grace.cho").document
}

fn layout(doc: &SongDocument, width: f64, page_height: f64) -> PagedLayout {
    build_layout(
        doc,
        &StyleTable::default(),
        &LayoutSettings::default(),
        width,
        page_height,
        &CellMeasurer,
    )
    .expect("Failed to build layout")
}

fn sizes(pages: &[Page]) -> Vec<usize> {
    pages.iter().map(|p| p.blocks.len()).collect()
}

// ─── Invariants ─────────────────────────────────────────────────────

#[test]
fn pages_hold_every_block_in_order() {
    let doc = amazing_grace();
    let settings = LayoutSettings::default();
    let style = StyleTable::default();

    for width in [12.0, 20.0, 1000.0] {
        let blocks = build_blocks(&doc, &style, &settings, width, &CellMeasurer).unwrap();
        for page_height in [12.0, 30.0, 45.0, 60.0, 100.0, 1000.0] {
            let pages = paginate(blocks.clone(), page_height, &settings.pagination).unwrap();
            let flat: Vec<RenderBlock> =
                pages.iter().flat_map(|p| p.blocks.iter().cloned()).collect();
            assert_eq!(flat, blocks, "blocks changed at {width}x{page_height}");

            for (i, page) in pages.iter().enumerate() {
                assert_eq!(page.index, i);
                assert!(!page.blocks.is_empty(), "empty page {i} at {width}x{page_height}");
                let sum: f64 = page.blocks.iter().map(|b| b.height).sum();
                assert!((page.height - sum).abs() < 1e-9);
                assert!(
                    page.height <= page_height + 1e-6 || page.blocks.len() == 1,
                    "page {i} overflows at {width}x{page_height}"
                );
            }
        }
    }
}

#[test]
fn headers_stay_with_their_first_line() {
    let doc = amazing_grace();
    for page_height in [30.0, 40.0, 55.0, 80.0] {
        let pages = layout(&doc, 1000.0, page_height).pages;
        for page in &pages {
            let last = page.blocks.last().unwrap();
            assert!(
                !last.is_header(),
                "page {} ends with a header at height {page_height}",
                page.index
            );
        }
    }
}

// ─── Break placement ────────────────────────────────────────────────

#[test]
fn six_lines_fill_five_per_page() {
    let (doc, _) = parse_chordpro("a\nb\nc\nd\ne\nf");
    let pages = layout(&doc, 100.0, 50.0).pages;
    assert_eq!(sizes(&pages), vec![5, 1]);
    assert_eq!(pages[0].height, 50.0);
    assert_eq!(pages[1].height, 10.0);
}

#[test]
fn chorus_header_moves_past_soft_ratio() {
    // 8 lines of 10 fill 80 of 100, past the 0.70 ratio
    let (doc, _) = parse_chordpro("1\n2\n3\n4\n5\n6\n7\n8\n{soc}\nla\n{eoc}");
    let pages = layout(&doc, 100.0, 100.0).pages;
    assert_eq!(sizes(&pages), vec![8, 2]);
    assert!(pages[1].blocks[0].is_header());
}

#[test]
fn soft_ratio_of_one_only_breaks_when_full() {
    let (doc, _) = parse_chordpro("1\n2\n3\n4\n5\n6\n7\n8\n{soc}\nla\n{eoc}");
    let settings = LayoutSettings {
        pagination: PaginationOptions {
            soft_break_ratio: 1.0,
            ..PaginationOptions::default()
        },
        ..LayoutSettings::default()
    };
    let result = build_layout(
        &doc,
        &StyleTable::default(),
        &settings,
        100.0,
        100.0,
        &CellMeasurer,
    )
    .unwrap();
    assert_eq!(sizes(&result.pages), vec![10]);
}

#[test]
fn oversized_rows_get_pages_of_their_own() {
    let doc = amazing_grace();
    // chorded rows are 16 tall
    let result = layout(&doc, 1000.0, 12.0);
    for page in &result.pages {
        if page.is_overflow(12.0) {
            assert_eq!(page.blocks.len(), 1);
            assert_eq!(page.height, 16.0);
        }
    }
    assert_eq!(result.page_count(), result.block_count);
}

#[test]
fn empty_song_has_one_empty_page() {
    for text in ["", "{title: Silence}", "\n\n\n"] {
        let (doc, _) = parse_chordpro(text);
        let result = layout(&doc, 100.0, 100.0);
        assert_eq!(result.page_count(), 1);
        assert!(result.pages[0].blocks.is_empty());
        assert_eq!(result.block_count, 0);
    }
}

#[test]
fn invalid_page_height_is_rejected() {
    let doc = amazing_grace();
    for page_height in [0.0, -10.0, f64::NAN] {
        let result = build_layout(
            &doc,
            &StyleTable::default(),
            &LayoutSettings::default(),
            100.0,
            page_height,
            &CellMeasurer,
        );
        assert!(matches!(result, Err(LayoutError::InvalidPageHeight(_))));
    }
}

// ─── Text in, JSON out ──────────────────────────────────────────────

#[test]
fn paginate_text_with_defaults() {
    let text = std::fs::read_to_string(
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("songs/amazing-grace.cho"),
    )
    .unwrap();
    let layout = paginate_text(
        &text,
        Viewport::new(1920.0, 1080.0),
        &StyleTable::default(),
        &LayoutSettings::default(),
    )
    .expect("Failed to paginate");

    assert_eq!(layout.page_count(), 1);
    assert_eq!(layout.block_count, 9);
    assert_eq!(layout.signature.content_width, 1848.0);

    let json = pages_to_json(&layout).unwrap();
    assert!(json.contains("\"type\": \"section_header\""));
    assert!(json.contains("\"label\": \"Verse 1\""));
}
