//! Integration tests: layout cache and song sessions.

use pretty_assertions::assert_eq;
use stagelib::*;
use std::cell::Cell;
use std::path::PathBuf;
use std::sync::Arc;

/// Cell measurer that counts how often it is asked.
#[derive(Default)]
struct CountingMeasurer {
    calls: Cell<usize>,
}

impl TextMeasurer for CountingMeasurer {
    fn measure(&self, text: &str, _style: &TextStyle) -> Result<TextSize, MeasureError> {
        self.calls.set(self.calls.get() + 1);
        Ok(TextSize::new(text.chars().count() as f64, 10.0))
    }
}

struct BrokenMeasurer;

impl TextMeasurer for BrokenMeasurer {
    fn measure(&self, _text: &str, _style: &TextStyle) -> Result<TextSize, MeasureError> {
        Err(MeasureError::new("font not loaded"))
    }
}

fn song_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("songs").join(name)
}

fn amazing_grace() -> SongDocument {
    parse_file(song_path("amazing-grace.cho"))
        .expect("Failed to parse amazing-grace.cho")
        .document
}

// ─── Hits and misses ────────────────────────────────────────────────

#[test]
fn unchanged_inputs_hit_the_cache() {
    let doc = amazing_grace();
    let style = StyleTable::default();
    let settings = LayoutSettings::default();
    let cache = LayoutCache::new();
    let measurer = CountingMeasurer::default();

    let first = cache
        .get_or_build(&doc, &style, &settings, 400.0, 300.0, &measurer)
        .unwrap();
    let calls = measurer.calls.get();
    assert!(calls > 0);

    let second = cache
        .get_or_build(&doc, &style, &settings, 400.0, 300.0, &measurer)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(measurer.calls.get(), calls, "a cache hit must not measure");
}

#[test]
fn any_signature_change_rebuilds() {
    let doc = amazing_grace();
    let mut style = StyleTable::default();
    let mut settings = LayoutSettings::default();
    let cache = LayoutCache::new();
    let measurer = CountingMeasurer::default();

    let base = cache
        .get_or_build(&doc, &style, &settings, 400.0, 300.0, &measurer)
        .unwrap();

    let wider = cache
        .get_or_build(&doc, &style, &settings, 500.0, 300.0, &measurer)
        .unwrap();
    assert!(!Arc::ptr_eq(&base, &wider));
    assert_eq!(wider.signature.content_width, 500.0);

    let shorter = cache
        .get_or_build(&doc, &style, &settings, 500.0, 200.0, &measurer)
        .unwrap();
    assert!(!Arc::ptr_eq(&wider, &shorter));

    style.set_color("chords", "#00FFFF");
    let restyled = cache
        .get_or_build(&doc, &style, &settings, 500.0, 200.0, &measurer)
        .unwrap();
    assert!(!Arc::ptr_eq(&shorter, &restyled));
    assert_eq!(restyled.signature.style, style.fingerprint());

    settings.font.metrics_version += 1;
    let remeasured = cache
        .get_or_build(&doc, &style, &settings, 500.0, 200.0, &measurer)
        .unwrap();
    assert!(!Arc::ptr_eq(&restyled, &remeasured));

    let (other, _) = parse_chordpro("{soc}\nSomething else\n{eoc}");
    let other_layout = cache
        .get_or_build(&other, &style, &settings, 500.0, 200.0, &measurer)
        .unwrap();
    assert_eq!(other_layout.signature.document, other.id);

    // Only the latest entry is kept
    assert!(Arc::ptr_eq(&cache.current().unwrap(), &other_layout));
    let old = LayoutSignature::new(&doc, &style, &settings, 500.0, 200.0);
    assert!(cache.get(&old).is_none());
}

#[test]
fn settings_changes_rebuild_without_metrics_bump() {
    let doc = amazing_grace();
    let style = StyleTable::default();
    let cache = LayoutCache::new();
    let measurer = MonospaceMeasurer::default();

    let base = LayoutSettings::default();
    let mut font = base.clone();
    font.font.size = 80.0;
    let mut line_height = base.clone();
    line_height.font.line_height = 1.5;
    let mut chords = base.clone();
    chords.font.chord_size_factor = 0.9;
    let mut family = base.clone();
    family.font.family = "Noto Sans".to_string();
    let mut blank = base.clone();
    blank.blank_height = 50.0;
    let mut ratio = base.clone();
    ratio.pagination.soft_break_ratio = 0.1;

    let mut previous = cache
        .get_or_build(&doc, &style, &base, 600.0, 300.0, &measurer)
        .unwrap();
    for settings in [font, line_height, chords, family, blank, ratio] {
        assert_eq!(settings.font.metrics_version, base.font.metrics_version);
        let layout = cache
            .get_or_build(&doc, &style, &settings, 600.0, 300.0, &measurer)
            .unwrap();
        assert!(!Arc::ptr_eq(&previous, &layout));

        let fresh = build_layout(&doc, &style, &settings, 600.0, 300.0, &measurer).unwrap();
        assert_eq!(*layout, fresh);
        previous = layout;
    }
}

#[test]
fn swapping_json_themes_rebuilds() {
    let (doc, _) = parse_chordpro("{soc}\nabc def ghi jkl\n{eoc}");
    let settings = LayoutSettings::default();
    let cache = LayoutCache::new();
    let measurer = MonospaceMeasurer::default();

    let plain = StyleTable::from_json(r#"{ "name": "A" }"#).unwrap();
    let bold =
        StyleTable::from_json(r#"{ "name": "B", "styles": { "section.chorus": ["bold"] } }"#)
            .unwrap();

    // 15 characters: 280.5 wide in the regular face, 294.5 in bold
    let first = cache
        .get_or_build(&doc, &plain, &settings, 290.0, 500.0, &measurer)
        .unwrap();
    assert_eq!(first.block_count, 2);

    let swapped = cache
        .get_or_build(&doc, &bold, &settings, 290.0, 500.0, &measurer)
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &swapped));
    assert_eq!(swapped.block_count, 3);
    assert_eq!(
        *swapped,
        build_layout(&doc, &bold, &settings, 290.0, 500.0, &measurer).unwrap()
    );
}

#[test]
fn rebuilt_layout_matches_uncached_build() {
    let doc = amazing_grace();
    let style = StyleTable::default();
    let settings = LayoutSettings::default();
    let cache = LayoutCache::new();
    let measurer = CountingMeasurer::default();

    let cached = cache
        .get_or_build(&doc, &style, &settings, 300.0, 120.0, &measurer)
        .unwrap();
    let fresh = build_layout(&doc, &style, &settings, 300.0, 120.0, &measurer).unwrap();
    assert_eq!(*cached, fresh);
}

// ─── Failed builds ──────────────────────────────────────────────────

#[test]
fn failed_build_keeps_previous_layout() {
    let doc = amazing_grace();
    let style = StyleTable::default();
    let settings = LayoutSettings::default();
    let cache = LayoutCache::new();

    let good = cache
        .get_or_build(&doc, &style, &settings, 400.0, 300.0, &CountingMeasurer::default())
        .unwrap();

    let broken = cache.get_or_build(&doc, &style, &settings, 600.0, 300.0, &BrokenMeasurer);
    assert!(matches!(broken, Err(LayoutError::Measurement(_))));

    let zero = cache.get_or_build(
        &doc,
        &style,
        &settings,
        400.0,
        0.0,
        &CountingMeasurer::default(),
    );
    assert!(matches!(zero, Err(LayoutError::InvalidPageHeight(_))));

    assert!(Arc::ptr_eq(&cache.current().unwrap(), &good));
}

#[test]
fn invalidate_drops_the_entry() {
    let doc = amazing_grace();
    let cache = LayoutCache::new();
    cache
        .get_or_build(
            &doc,
            &StyleTable::default(),
            &LayoutSettings::default(),
            400.0,
            300.0,
            &CountingMeasurer::default(),
        )
        .unwrap();
    assert!(cache.current().is_some());
    cache.invalidate();
    assert!(cache.current().is_none());
}

#[test]
fn readers_share_one_cache_across_threads() {
    let doc = amazing_grace();
    let style = StyleTable::default();
    let settings = LayoutSettings::default();
    let cache = LayoutCache::new();

    let layouts: Vec<Arc<PagedLayout>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    cache
                        .get_or_build(
                            &doc,
                            &style,
                            &settings,
                            400.0,
                            300.0,
                            &MonospaceMeasurer::default(),
                        )
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for layout in &layouts[1..] {
        assert_eq!(**layout, *layouts[0]);
    }
}

// ─── Sessions ───────────────────────────────────────────────────────

#[test]
fn session_reuses_layout_until_text_changes() {
    let mut session = SongSession::open(song_path("amazing-grace.cho"))
        .expect("Failed to open amazing-grace.cho");
    let style = StyleTable::default();
    let settings = LayoutSettings::default();
    let viewport = Viewport::new(1280.0, 720.0);
    let measurer = MonospaceMeasurer::default();

    let first = session.pages(&style, &settings, viewport, &measurer).unwrap();
    let again = session.pages(&style, &settings, viewport, &measurer).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    let text = std::fs::read_to_string(song_path("amazing-grace.cho")).unwrap();
    assert!(!session.set_text(text.clone()));
    assert!(session.cached().is_some());

    assert!(session.set_text(format!("{text}\n{{c: Fine}}\n")));
    assert!(session.cached().is_none());

    let edited = session.pages(&style, &settings, viewport, &measurer).unwrap();
    assert!(!Arc::ptr_eq(&first, &edited));
    assert_eq!(edited.block_count, first.block_count + 2);
}

#[test]
fn session_repaginates_when_settings_change() {
    let session = SongSession::open(song_path("amazing-grace.cho")).unwrap();
    let style = StyleTable::default();
    let viewport = Viewport::new(1280.0, 720.0);
    let measurer = MonospaceMeasurer::default();

    let settings = LayoutSettings::default();
    let first = session.pages(&style, &settings, viewport, &measurer).unwrap();

    let mut larger = settings.clone();
    larger.font.size = 80.0;
    let second = session.pages(&style, &larger, viewport, &measurer).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.page_count() > first.page_count());
}

#[test]
fn session_title_falls_back_to_file_stem() {
    let session = SongSession::open(song_path("unclosed-chorus.cho")).unwrap();
    assert_eq!(session.title_block().title, "Unclosed");
    assert_eq!(session.warnings().len(), 1);

    let untitled = SongSession::new("[C]No title here", "my-song");
    assert_eq!(untitled.title_block().title, "my-song");
    assert!(untitled.warnings().is_empty());
}

#[test]
fn page_area_subtracts_title_chrome() {
    let session = SongSession::new("{title: T}\n{key: C}\nWords", "");
    let settings = LayoutSettings::default();
    let measurer = |_: &str, _: &TextStyle| -> Result<TextSize, MeasureError> {
        Ok(TextSize::new(1.0, 10.0))
    };
    let (width, height) = session
        .page_area(
            &StyleTable::default(),
            &settings,
            Viewport::new(1920.0, 1080.0),
            &measurer,
        )
        .unwrap();
    assert_eq!(width, 1848.0);
    assert_eq!(height, 968.0 - 20.0);
}
