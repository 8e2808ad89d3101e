//! Style table: theme colors and font attributes keyed by semantic names
//! (`section.chorus`, `chords`, `directive.title`, ...).
//!
//! The layout builder only reads the font attributes (for measurement); the
//! host renderer resolves colors per block at draw time, so swapping a theme
//! never requires re-parsing.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::LayoutSettings;
use crate::error::ConfigError;
use crate::model::SectionKind;

/// Hard fallbacks for keys a theme does not define.
const DEFAULT_COLORS: &[(&str, &str)] = &[
    ("background", "#000000"),
    ("lyrics", "#FFFFFF"),
    ("chords", "#FFD166"),
    ("section.verse", "#FFFFFF"),
    ("section.chorus", "#FFFFFF"),
    ("section.comment", "#AAAAAA"),
    ("directive.title", "#FFFFFF"),
    ("directive.subtitle", "#BBBBBB"),
    ("directive.meta", "#888888"),
];

/// Older flat keys still accepted in theme files.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("background", "bg"),
    ("lyrics", "text"),
    ("section.verse", "verse_text"),
    ("section.chorus", "chorus_text"),
    ("section.comment", "comment"),
    ("directive.title", "title"),
    ("directive.subtitle", "subtitle"),
    ("directive.meta", "meta"),
];

/// Visual element classes a block is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementClass {
    Background,
    Lyric,
    Chord,
    Header,
    Comment,
    Title,
    Subtitle,
    Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Bold,
    Italic,
}

/// A theme: colors and font styles per semantic key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleTable {
    name: String,
    colors: BTreeMap<String, String>,
    styles: BTreeMap<String, Vec<FontStyle>>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            colors: BTreeMap::new(),
            styles: BTreeMap::new(),
        }
    }
}

/// Everything the measurer and renderer need to know about one run of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub element: ElementClass,
    pub section: SectionKind,
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub font_family: String,
    pub font_size: f64,
    /// Line height as a multiple of `font_size`
    pub line_height: f64,
}

impl StyleTable {
    /// Parse a theme JSON document. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json {
            what: "theme",
            source,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_color(&mut self, key: &str, color: impl Into<String>) {
        self.colors.insert(key.to_string(), color.into());
    }

    pub fn set_styles(&mut self, key: &str, styles: Vec<FontStyle>) {
        self.styles.insert(key.to_string(), styles);
    }

    /// Hash of every color and font style. Two tables that resolve any
    /// element differently never share a fingerprint; part of the layout
    /// cache signature.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.colors.hash(&mut hasher);
        self.styles.hash(&mut hasher);
        hasher.finish()
    }

    /// Resolve a color for a semantic key.
    ///
    /// Lookup order: the key, its legacy alias, its prefix (`section` for
    /// `section.chorus`), the built-in default for the key, the built-in
    /// default for the prefix, and finally the lyric default.
    pub fn color_for(&self, key: &str) -> String {
        let prefix = key.split('.').next().unwrap_or(key);
        let legacy = LEGACY_KEYS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, alias)| *alias);

        let themed = self
            .colors
            .get(key)
            .or_else(|| legacy.and_then(|alias| self.colors.get(alias)))
            .or_else(|| self.colors.get(prefix))
            .filter(|c| !c.trim().is_empty());
        if let Some(color) = themed {
            return color.clone();
        }

        default_color(key)
            .or_else(|| default_color(prefix))
            .or_else(|| default_color("lyrics"))
            .unwrap_or("#FFFFFF")
            .to_string()
    }

    pub fn background_color(&self) -> String {
        self.color_for("background")
    }

    fn has_style(&self, key: &str, style: FontStyle) -> bool {
        self.styles
            .get(key)
            .is_some_and(|styles| styles.contains(&style))
    }

    /// Resolve the full text style of an element drawn inside a section.
    pub fn resolve(
        &self,
        section: &SectionKind,
        element: ElementClass,
        settings: &LayoutSettings,
    ) -> TextStyle {
        let key = style_key(section, element);
        let font = &settings.font;
        let factor = match element {
            ElementClass::Background | ElementClass::Lyric => 1.0,
            ElementClass::Chord => font.chord_size_factor,
            ElementClass::Header => font.header_size_factor,
            ElementClass::Comment => font.comment_size_factor,
            ElementClass::Title => font.title_size_factor,
            ElementClass::Subtitle => font.subtitle_size_factor,
            ElementClass::Meta => font.meta_size_factor,
        };

        TextStyle {
            element,
            section: section.clone(),
            color: self.color_for(&key),
            bold: self.has_style(&key, FontStyle::Bold) || element == ElementClass::Title,
            italic: self.has_style(&key, FontStyle::Italic) || element == ElementClass::Comment,
            font_family: font.family.clone(),
            font_size: font.size * factor,
            line_height: font.line_height,
        }
    }
}

fn default_color(key: &str) -> Option<&'static str> {
    DEFAULT_COLORS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, color)| *color)
}

/// Semantic key for an element within a section.
pub fn style_key(section: &SectionKind, element: ElementClass) -> String {
    match element {
        ElementClass::Background => "background".to_string(),
        ElementClass::Chord => "chords".to_string(),
        ElementClass::Comment => "section.comment".to_string(),
        ElementClass::Header => format!("header.{}", section.tag()),
        ElementClass::Title => "directive.title".to_string(),
        ElementClass::Subtitle => "directive.subtitle".to_string(),
        ElementClass::Meta => "directive.meta".to_string(),
        ElementClass::Lyric => match section {
            SectionKind::Plain => "lyrics".to_string(),
            other => format!("section.{}", other.tag()),
        },
    }
}
