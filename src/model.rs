//! Data model for a parsed ChordPro song.
//!
//! A `SongDocument` is produced once per load of a song's raw text and is
//! never mutated afterwards. Layout works from a shared reference to it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A complete song parsed from ChordPro-style markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongDocument {
    /// Identity of the source text (stable for identical text)
    pub id: DocumentId,
    /// Directive metadata in source order
    pub metadata: Metadata,
    /// Flat list of sections in source order
    pub sections: Vec<Section>,
}

/// Identity of a parsed document, derived from a hash of its raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Ordered key → value metadata. Keys are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<MetaEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. A key that already exists keeps its position and
    /// takes the new value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = key.trim().to_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(MetaEntry { key, value }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A labeled group of lines (verse, chorus, ...). Sections never nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    /// Explicit label from the start directive, e.g. `{start_of_verse: Verse 2}`
    pub label: Option<String>,
    /// Resumes the previous section of the same kind after an inline
    /// comment; laid out without a second header
    #[serde(default)]
    pub continued: bool,
    pub lines: Vec<Line>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            label: None,
            continued: false,
            lines: Vec::new(),
        }
    }

    /// Text shown in the section header.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.kind.default_label(),
        }
    }

    /// Whether this section gets a header when laid out.
    ///
    /// Plain sections never do; comment sections only when the author
    /// named them.
    pub fn is_labeled(&self) -> bool {
        if self.continued {
            return false;
        }
        match self.kind {
            SectionKind::Plain => false,
            SectionKind::Comment => self.label.is_some(),
            _ => true,
        }
    }
}

/// Kind of a section. Unrecognized section names are kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Plain,
    Verse,
    Chorus,
    Bridge,
    Comment,
    Other(String),
}

impl SectionKind {
    /// Map a section tag (`chorus`, `tab`, ...) to a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "verse" => SectionKind::Verse,
            "chorus" => SectionKind::Chorus,
            "bridge" => SectionKind::Bridge,
            "comment" => SectionKind::Comment,
            "" => SectionKind::Plain,
            other => SectionKind::Other(other.to_string()),
        }
    }

    /// Lowercase tag, as used in directives and style keys.
    pub fn tag(&self) -> &str {
        match self {
            SectionKind::Plain => "plain",
            SectionKind::Verse => "verse",
            SectionKind::Chorus => "chorus",
            SectionKind::Bridge => "bridge",
            SectionKind::Comment => "comment",
            SectionKind::Other(tag) => tag.as_str(),
        }
    }

    /// Header text used when the section has no explicit label.
    pub fn default_label(&self) -> String {
        let tag = self.tag();
        let mut chars = tag.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// One logical lyric line with its chords.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Lyric text with chord markers removed
    pub lyric_text: String,
    /// Chords sorted ascending by offset, offsets in `0..=char_len`
    pub chords: Vec<ChordAnchor>,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            lyric_text: text.into(),
            chords: Vec::new(),
        }
    }

    /// Length of `lyric_text` in characters (the unit of chord offsets).
    pub fn char_len(&self) -> usize {
        self.lyric_text.chars().count()
    }

    /// A blank line is a vertical spacer: no visible text and no chords.
    pub fn is_blank(&self) -> bool {
        self.chords.is_empty() && self.lyric_text.trim().is_empty()
    }
}

/// A chord sounded at a character offset of a lyric line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordAnchor {
    pub offset: usize,
    pub symbol: String,
}

impl ChordAnchor {
    pub fn new(offset: usize, symbol: impl Into<String>) -> Self {
        Self {
            offset,
            symbol: symbol.into(),
        }
    }
}

// ─── Title chrome ────────────────────────────────────────────────────

/// Title lines drawn at the top of every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleBlock {
    pub title: String,
    pub subtitle: Option<String>,
    /// "Key: G • Tempo: 92", empty when neither is set
    pub meta_line: String,
}

impl SongDocument {
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title")
    }

    /// Title chrome, falling back to `fallback` (usually the file stem) and
    /// then to "Untitled" when the song has no title directive.
    pub fn title_block(&self, fallback: &str) -> TitleBlock {
        let title = match self.title() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ if !fallback.trim().is_empty() => fallback.to_string(),
            _ => "Untitled".to_string(),
        };
        let subtitle = self
            .metadata
            .get("subtitle")
            .filter(|s| !s.trim().is_empty())
            .map(String::from);

        let mut bits = Vec::new();
        if let Some(key) = self.metadata.get("key").filter(|s| !s.is_empty()) {
            bits.push(format!("Key: {key}"));
        }
        if let Some(tempo) = self.metadata.get("tempo").filter(|s| !s.is_empty()) {
            bits.push(format!("Tempo: {tempo}"));
        }

        TitleBlock {
            title,
            subtitle,
            meta_line: bits.join(" • "),
        }
    }

    /// Total number of lines across all sections.
    pub fn line_count(&self) -> usize {
        self.sections.iter().map(|s| s.lines.len()).sum()
    }
}

// ─── Parse warnings ──────────────────────────────────────────────────

/// A non-fatal problem found while parsing. Never raised as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// 1-based source line
    pub line_number: usize,
    pub kind: WarningKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Section still open at end of input
    UnclosedSection,
    /// End directive without a matching open section
    UnmatchedEndDirective,
    /// A new section started before the open one was closed
    SectionImplicitlyClosed,
    /// `[]` with nothing inside
    EmptyChord,
    /// `[` without a closing `]`
    UnclosedChordBracket,
    /// `[` inside an open chord bracket
    NestedChordBracket,
    /// Directive name not in the known vocabulary
    UnknownDirective,
    /// `{}` or a directive line missing its closing brace
    MalformedDirective,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {:?}: {}", self.line_number, self.kind, self.detail)
    }
}
