//! ChordPro parser: converts song markup into the SongDocument model.
//!
//! Parsing never fails. Malformed input is recovered on the spot and
//! reported as a `ParseWarning` returned next to the document.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::*;

/// Directive names stored as metadata without a warning.
const METADATA_KEYS: &[&str] = &[
    "title", "subtitle", "artist", "composer", "lyricist", "arranger", "album", "year", "key",
    "tempo", "time", "capo", "duration", "copyright", "ccli",
];

/// Parse ChordPro-style text into a document plus the warnings met on the way.
pub fn parse_chordpro(raw: &str) -> (SongDocument, Vec<ParseWarning>) {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut state = ParserState::new();
    for (idx, line) in text.lines().enumerate() {
        state.line_number = idx + 1;
        state.process_line(line);
    }

    let (doc, warnings) = state.finish(document_id(raw));
    log::debug!(
        "parsed song {}: {} sections, {} lines, {} warnings",
        doc.id,
        doc.sections.len(),
        doc.line_count(),
        warnings.len()
    );
    (doc, warnings)
}

fn document_id(raw: &str) -> DocumentId {
    let mut hasher = DefaultHasher::new();
    raw.hash(&mut hasher);
    DocumentId(hasher.finish())
}

// ─── Parser state ────────────────────────────────────────────────────

/// Section opened by a directive and not closed yet.
struct OpenSection {
    kind: SectionKind,
    line_number: usize,
}

struct ParserState {
    line_number: usize,
    metadata: Metadata,
    sections: Vec<Section>,
    /// Section receiving lines
    current: Section,
    /// Opened by a directive: emitted even when it stays empty
    current_explicit: bool,
    open: Option<OpenSection>,
    warnings: Vec<ParseWarning>,
}

impl ParserState {
    fn new() -> Self {
        Self {
            line_number: 0,
            metadata: Metadata::new(),
            sections: Vec::new(),
            current: Section::new(SectionKind::Plain),
            current_explicit: false,
            open: None,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, kind: WarningKind, detail: impl Into<String>) {
        self.warnings.push(ParseWarning {
            line_number: self.line_number,
            kind,
            detail: detail.into(),
        });
    }

    /// Emit the current section (if it has to be kept) and make `next` current.
    fn replace_current(&mut self, next: Section, explicit: bool) {
        let done = std::mem::replace(&mut self.current, next);
        if self.current_explicit || !done.lines.is_empty() {
            self.sections.push(done);
        }
        self.current_explicit = explicit;
    }

    fn process_line(&mut self, line: &str) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            self.current.lines.push(Line::default());
            return;
        }

        if trimmed.starts_with('{') {
            if let Some(body) = trimmed.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
                self.process_directive(body);
                return;
            }
            self.warn(
                WarningKind::MalformedDirective,
                format!("directive without closing brace, kept as text: {trimmed}"),
            );
        }

        let line = line.trim_end();
        if self.current.kind == SectionKind::Comment {
            self.current.lines.push(Line::plain(line));
        } else {
            let parsed = parse_chord_line(line, self.line_number, &mut self.warnings);
            self.current.lines.push(parsed);
        }
    }

    // ─── Directives ──────────────────────────────────────────────────

    fn process_directive(&mut self, body: &str) {
        let (name, value) = split_directive(body);
        if name.is_empty() {
            self.warn(WarningKind::MalformedDirective, format!("empty directive {{{body}}}"));
            return;
        }

        match classify(&name, value.is_some()) {
            Directive::Start(kind) => self.start_section(kind, value),
            Directive::End(kind) => self.end_section(kind, &name),
            Directive::InlineComment => self.inline_comment(value.unwrap_or_default()),
            Directive::Meta(key) => self.metadata.insert(key, value.unwrap_or_default()),
            Directive::Unknown => {
                self.warn(
                    WarningKind::UnknownDirective,
                    format!("unknown directive '{name}' kept as metadata"),
                );
                self.metadata.insert(&name, value.unwrap_or_default());
            }
        }
    }

    fn start_section(&mut self, kind: SectionKind, label: Option<&str>) {
        if let Some(open) = self.open.take() {
            self.warn(
                WarningKind::SectionImplicitlyClosed,
                format!(
                    "'{}' section opened on line {} closed by start of '{}'",
                    open.kind.tag(),
                    open.line_number,
                    kind.tag()
                ),
            );
        }

        let mut section = Section::new(kind.clone());
        section.label = label.map(String::from);
        self.replace_current(section, true);
        self.open = Some(OpenSection {
            kind,
            line_number: self.line_number,
        });
    }

    fn end_section(&mut self, kind: SectionKind, name: &str) {
        let open = self
            .open
            .as_ref()
            .map(|open| (open.kind.clone(), open.line_number));

        match open {
            Some((open_kind, _)) if open_kind == kind => {
                self.open = None;
                self.replace_current(Section::new(SectionKind::Plain), false);
            }
            Some((open_kind, open_line)) => {
                self.warn(
                    WarningKind::UnmatchedEndDirective,
                    format!(
                        "'{name}' does not close the open '{}' section (line {open_line}), ignored",
                        open_kind.tag()
                    ),
                );
            }
            None => {
                self.warn(
                    WarningKind::UnmatchedEndDirective,
                    format!("'{name}' without an open section, ignored"),
                );
            }
        }
    }

    /// `{comment: text}`: a one-line comment section. The open section, if
    /// any, continues after it.
    fn inline_comment(&mut self, text: &str) {
        let mut comment = Section::new(SectionKind::Comment);
        comment.lines.push(Line::plain(text));

        let resumed = match &self.open {
            Some(open) => {
                let mut section = Section::new(open.kind.clone());
                section.continued = true;
                section
            }
            None => Section::new(SectionKind::Plain),
        };

        self.replace_current(comment, true);
        self.replace_current(resumed, false);
    }

    fn finish(mut self, id: DocumentId) -> (SongDocument, Vec<ParseWarning>) {
        if let Some(open) = self.open.take() {
            self.warnings.push(ParseWarning {
                line_number: open.line_number,
                kind: WarningKind::UnclosedSection,
                detail: format!(
                    "'{}' section not closed before end of input",
                    open.kind.tag()
                ),
            });
        }
        self.replace_current(Section::new(SectionKind::Plain), false);

        let doc = SongDocument {
            id,
            metadata: self.metadata,
            sections: self.sections,
        };
        (doc, self.warnings)
    }
}

// ─── Directive vocabulary ────────────────────────────────────────────

enum Directive {
    Start(SectionKind),
    End(SectionKind),
    InlineComment,
    Meta(&'static str),
    Unknown,
}

/// Split a directive body on the first `:` or whitespace.
fn split_directive(body: &str) -> (String, Option<&str>) {
    let body = body.trim();
    let (name, rest) = match body.find(|c: char| c == ':' || c.is_whitespace()) {
        Some(pos) => (&body[..pos], &body[pos..]),
        None => (body, ""),
    };
    let rest = rest.trim_start();
    let value = rest.strip_prefix(':').unwrap_or(rest).trim();
    let value = if value.is_empty() { None } else { Some(value) };
    (name.to_lowercase(), value)
}

fn classify(name: &str, has_value: bool) -> Directive {
    match name {
        "start_of_chorus" | "soc" | "chorus" => Directive::Start(SectionKind::Chorus),
        "start_of_verse" | "sov" | "verse" => Directive::Start(SectionKind::Verse),
        "start_of_bridge" | "sob" | "bridge" => Directive::Start(SectionKind::Bridge),
        "start_of_tab" | "sot" => Directive::Start(SectionKind::Other("tab".into())),
        "start_of_grid" | "sog" => Directive::Start(SectionKind::Other("grid".into())),
        "comment" | "c" | "comment_italic" | "ci" | "comment_box" | "cb" => {
            if has_value {
                Directive::InlineComment
            } else {
                Directive::Start(SectionKind::Comment)
            }
        }
        "eoc" => Directive::End(SectionKind::Chorus),
        "eov" => Directive::End(SectionKind::Verse),
        "eob" => Directive::End(SectionKind::Bridge),
        "eot" => Directive::End(SectionKind::Other("tab".into())),
        "eog" => Directive::End(SectionKind::Other("grid".into())),
        "t" => Directive::Meta("title"),
        "st" => Directive::Meta("subtitle"),
        _ => {
            if let Some(tag) = name.strip_prefix("start_of_").filter(|t| !t.is_empty()) {
                return Directive::Start(SectionKind::from_tag(tag));
            }
            if let Some(tag) = name.strip_prefix("end_of_").filter(|t| !t.is_empty()) {
                return Directive::End(SectionKind::from_tag(tag));
            }
            match METADATA_KEYS.iter().find(|k| **k == name) {
                Some(key) => Directive::Meta(*key),
                None => Directive::Unknown,
            }
        }
    }
}

// ─── Inline chords ───────────────────────────────────────────────────

/// Strip `[chord]` markers from a lyric line, recording where each sounds.
fn parse_chord_line(line: &str, line_number: usize, warnings: &mut Vec<ParseWarning>) -> Line {
    let chars: Vec<char> = line.chars().collect();
    let mut text = String::with_capacity(line.len());
    let mut text_len = 0usize;
    let mut chords = Vec::new();

    let mut warn = |kind: WarningKind, detail: String| {
        warnings.push(ParseWarning {
            line_number,
            kind,
            detail,
        });
    };

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '[' {
            text.push(chars[i]);
            text_len += 1;
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && chars[j] != ']' && chars[j] != '[' {
            j += 1;
        }

        if j >= chars.len() {
            warn(
                WarningKind::UnclosedChordBracket,
                format!("unclosed '[' at column {}, rest of line kept as text", i + 1),
            );
            text.extend(&chars[i..]);
            break;
        }

        if chars[j] == '[' {
            warn(
                WarningKind::NestedChordBracket,
                format!("'[' inside chord bracket at column {}", j + 1),
            );
            text.extend(&chars[i..j]);
            text_len += j - i;
            i = j;
            continue;
        }

        let symbol: String = chars[i + 1..j].iter().collect();
        let symbol = symbol.trim();
        if symbol.is_empty() {
            warn(
                WarningKind::EmptyChord,
                format!("empty chord bracket at column {} dropped", i + 1),
            );
        } else {
            chords.push(ChordAnchor::new(text_len, symbol));
        }
        i = j + 1;
    }

    Line {
        lyric_text: text,
        chords,
    }
}
