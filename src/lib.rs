//! stagelib: ChordPro parser and measured stage pagination for StagePro.
//!
//! Song text is parsed once into a [`SongDocument`]; layout and pagination
//! then run against the host's own text measurement so every page fits the
//! screen exactly, with chords kept above their syllables across wraps.
//!
//! # Example
//! ```no_run
//! use stagelib::{LayoutSettings, MonospaceMeasurer, SongSession, StyleTable, Viewport};
//!
//! let session = SongSession::open("songs/amazing-grace.cho").unwrap();
//! let layout = session
//!     .pages(
//!         &StyleTable::default(),
//!         &LayoutSettings::default(),
//!         Viewport::new(1920.0, 1080.0),
//!         &MonospaceMeasurer::default(),
//!     )
//!     .unwrap();
//! println!("Pages: {}", layout.page_count());
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod paginate;
pub mod parser;
pub mod style;

#[cfg(target_os = "android")]
pub mod android;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use cache::{build_layout, LayoutCache, LayoutSignature, PagedLayout};
pub use config::{LayoutSettings, PaginationOptions, Viewport};
pub use error::{ConfigError, LayoutError, LoadError, MeasureError};
pub use layout::{
    build_blocks, measure_title_area, BlockKind, MonospaceMeasurer, RenderBlock, TextMeasurer,
    TextSize,
};
pub use model::*;
pub use paginate::{paginate, Page};
pub use parser::parse_chordpro;
pub use style::{ElementClass, StyleTable, TextStyle};

/// A parsed song together with the warnings its text produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSong {
    pub document: SongDocument,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedSong {
    pub fn parse(raw: &str) -> Self {
        let (document, warnings) = parse_chordpro(raw);
        Self { document, warnings }
    }
}

/// Read and parse a song file. Only I/O and UTF-8 problems fail; the
/// markup itself always parses.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedSong, LoadError> {
    Ok(ParsedSong::parse(&read_text(path.as_ref())?))
}

/// Parse song text from raw bytes. A UTF-8 byte order mark is ignored.
pub fn parse_bytes(data: &[u8]) -> Result<ParsedSong, LoadError> {
    let text = std::str::from_utf8(data)?;
    Ok(ParsedSong::parse(text))
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    let data = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(data).map_err(|e| LoadError::Utf8(e.utf8_error()))
}

/// Convert a parsed song to a JSON string for the host.
pub fn song_to_json(song: &ParsedSong) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(song)
}

/// Convert a paginated layout to a JSON string for the host.
pub fn pages_to_json(layout: &PagedLayout) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(layout)
}

// ═══════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════

/// One loaded song: parsed once, re-paginated whenever the viewport, theme
/// or font metrics change.
#[derive(Debug)]
pub struct SongSession {
    raw: String,
    song: ParsedSong,
    fallback_title: String,
    cache: LayoutCache,
}

impl SongSession {
    pub fn new(raw: impl Into<String>, fallback_title: impl Into<String>) -> Self {
        let raw = raw.into();
        let song = ParsedSong::parse(&raw);
        Self {
            raw,
            song,
            fallback_title: fallback_title.into(),
            cache: LayoutCache::new(),
        }
    }

    /// Load a song file; its file stem is the title fallback.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = read_text(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(text, stem))
    }

    /// Replace the song text. Returns whether anything changed; only then
    /// is the text re-parsed and the cached layout dropped.
    pub fn set_text(&mut self, raw: impl Into<String>) -> bool {
        let raw = raw.into();
        if raw == self.raw {
            return false;
        }
        self.song = ParsedSong::parse(&raw);
        self.raw = raw;
        self.cache.invalidate();
        true
    }

    pub fn document(&self) -> &SongDocument {
        &self.song.document
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.song.warnings
    }

    pub fn title_block(&self) -> TitleBlock {
        self.song.document.title_block(&self.fallback_title)
    }

    /// Content width and page height for a viewport: padding, bottom
    /// reserve and the title chrome are taken off.
    pub fn page_area(
        &self,
        style: &StyleTable,
        settings: &LayoutSettings,
        viewport: Viewport,
        measurer: &dyn TextMeasurer,
    ) -> Result<(f64, f64), LayoutError> {
        let (width, height) = settings.content_area(viewport);
        let title = measure_title_area(
            &self.song.document,
            style,
            settings,
            &self.fallback_title,
            measurer,
        )?;
        Ok((width, height - title))
    }

    /// Pages for the viewport, from the cache when nothing changed.
    pub fn pages(
        &self,
        style: &StyleTable,
        settings: &LayoutSettings,
        viewport: Viewport,
        measurer: &dyn TextMeasurer,
    ) -> Result<Arc<PagedLayout>, LayoutError> {
        let (width, height) = self.page_area(style, settings, viewport, measurer)?;
        self.cache
            .get_or_build(&self.song.document, style, settings, width, height, measurer)
    }

    /// Last successfully built layout, if any.
    pub fn cached(&self) -> Option<Arc<PagedLayout>> {
        self.cache.current()
    }
}

/// Parse text and paginate it for a viewport with the monospace estimate.
/// Convenience for hosts without their own text engine.
pub fn paginate_text(
    raw: &str,
    viewport: Viewport,
    style: &StyleTable,
    settings: &LayoutSettings,
) -> Result<Arc<PagedLayout>, LayoutError> {
    SongSession::new(raw, "").pages(style, settings, viewport, &MonospaceMeasurer::default())
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Read an optional C string; null means "not given".
unsafe fn optional_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_str().ok()
    }
}

/// Settings and theme from optional JSON, defaults when absent.
pub(crate) fn settings_and_theme(
    settings_json: Option<&str>,
    theme_json: Option<&str>,
) -> Result<(LayoutSettings, StyleTable), ConfigError> {
    let settings = match settings_json {
        Some(json) => LayoutSettings::from_json(json)?,
        None => LayoutSettings::default(),
    };
    let theme = match theme_json {
        Some(json) => StyleTable::from_json(json)?,
        None => StyleTable::default(),
    };
    Ok((settings, theme))
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Parse song text and return the document plus warnings as JSON.
/// The caller must free the returned string with `stagelib_free_string`.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn stagelib_parse_text(text: *const c_char) -> *mut c_char {
    let Some(text) = (unsafe { optional_str(text) }) else {
        return std::ptr::null_mut();
    };
    match song_to_json(&ParsedSong::parse(text)) {
        Ok(json) => into_c_string(json),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Parse and paginate song text for a viewport, returning the pages as
/// JSON. Settings and theme JSON may be null for defaults.
/// The caller must free the returned string with `stagelib_free_string`.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string; `settings_json`
/// and `theme_json` must each be null or such a string.
#[no_mangle]
pub unsafe extern "C" fn stagelib_paginate_text(
    text: *const c_char,
    viewport_width: f64,
    viewport_height: f64,
    settings_json: *const c_char,
    theme_json: *const c_char,
) -> *mut c_char {
    let Some(text) = (unsafe { optional_str(text) }) else {
        return std::ptr::null_mut();
    };
    let (settings, theme) = match unsafe {
        settings_and_theme(optional_str(settings_json), optional_str(theme_json))
    } {
        Ok(pair) => pair,
        Err(e) => {
            log::warn!("stagelib_paginate_text: {e}");
            return std::ptr::null_mut();
        }
    };

    let viewport = Viewport::new(viewport_width, viewport_height);
    match paginate_text(text, viewport, &theme, &settings) {
        Ok(layout) => match pages_to_json(&layout) {
            Ok(json) => into_c_string(json),
            Err(_) => std::ptr::null_mut(),
        },
        Err(e) => {
            log::warn!("stagelib_paginate_text: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by stagelib functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a stagelib function, or null.
#[no_mangle]
pub unsafe extern "C" fn stagelib_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
