//! Line classification for paragraph reconstruction.
//!
//! Classification is an ordered predicate table; the first predicate that
//! matches names the line. Order matters: `"  1842 Treaty"` is a
//! [`LineKind::DatedEntry`] (checked on the trimmed line) even though it is
//! also indented, while `"  【注】"` is [`LineKind::Indented`] because the
//! bracket test looks at the raw line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Glyph the transcription prompt uses to mark a page boundary.
pub const PAGE_MARKER: char = '🀄';

/// Lines shorter than this (in characters) are treated as complete lines
/// unless they end in strong terminal punctuation.
pub const SHORT_LINE_CHARS: usize = 50;

/// Strong sentence-final punctuation.
pub const TERMINAL_PUNCTUATION: &[char] = &['。', '！', '？'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    FootnoteOpen,
    PageMarker,
    BracketTitle,
    DatedEntry,
    Indented,
    Plain,
}

impl LineKind {
    /// Kinds that keep their own text verbatim when opening a block.
    pub fn is_special(self) -> bool {
        !matches!(self, LineKind::Indented | LineKind::Plain)
    }

    /// Every kind except [`LineKind::Plain`] opens a new block.
    pub fn starts_block(self) -> bool {
        self != LineKind::Plain
    }
}

type Predicate = fn(raw: &str, trimmed: &str) -> bool;

static RE_DATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}(\.\.\.)?\s+").unwrap());

fn is_heading(raw: &str, _: &str) -> bool {
    raw.starts_with('#')
}

fn is_footnote_open(raw: &str, _: &str) -> bool {
    raw.starts_with("<sup>")
}

fn is_page_marker(raw: &str, _: &str) -> bool {
    raw.contains(PAGE_MARKER)
}

fn is_bracket_title(raw: &str, _: &str) -> bool {
    raw.starts_with('【') || raw.starts_with('（')
}

fn is_dated_entry(_: &str, trimmed: &str) -> bool {
    RE_DATED.is_match(trimmed)
}

fn is_indented(raw: &str, _: &str) -> bool {
    raw.starts_with("  ")
}

/// First match wins.
const RULES: &[(LineKind, Predicate)] = &[
    (LineKind::Heading, is_heading),
    (LineKind::FootnoteOpen, is_footnote_open),
    (LineKind::PageMarker, is_page_marker),
    (LineKind::BracketTitle, is_bracket_title),
    (LineKind::DatedEntry, is_dated_entry),
    (LineKind::Indented, is_indented),
];

/// Classify one raw (untrimmed) line.
pub fn classify(raw: &str) -> LineKind {
    let trimmed = raw.trim();
    RULES
        .iter()
        .find(|(_, test)| test(raw, trimmed))
        .map(|(kind, _)| *kind)
        .unwrap_or(LineKind::Plain)
}

/// A short line without closing punctuation reads as a line of its own
/// (list items, captions, verse).
pub fn is_short_line(trimmed: &str) -> bool {
    trimmed.chars().count() < SHORT_LINE_CHARS && !trimmed.ends_with(TERMINAL_PUNCTUATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(classify("# 第一章"), LineKind::Heading);
        assert_eq!(classify("<sup>1</sup> 注释"), LineKind::FootnoteOpen);
        assert_eq!(classify("正文🀄正文"), LineKind::PageMarker);
        assert_eq!(classify("【按语】"), LineKind::BracketTitle);
        assert_eq!(classify("（一）总论"), LineKind::BracketTitle);
        assert_eq!(classify("1842 南京条约"), LineKind::DatedEntry);
        assert_eq!(classify("1842... 续"), LineKind::DatedEntry);
        assert_eq!(classify("  缩进段落"), LineKind::Indented);
        assert_eq!(classify("普通的一行"), LineKind::Plain);
    }

    #[test]
    fn order_resolves_overlaps() {
        // Heading beats page marker.
        assert_eq!(classify("# 标题🀄"), LineKind::Heading);
        // Dated test runs on the trimmed line, before the indent test.
        assert_eq!(classify("  1842 南京条约"), LineKind::DatedEntry);
        // Bracket test runs on the raw line.
        assert_eq!(classify("  【按语】"), LineKind::Indented);
    }

    #[test]
    fn dated_entry_needs_whitespace() {
        assert_eq!(classify("1842年签订"), LineKind::Plain);
        assert_eq!(classify("18420 x"), LineKind::Plain);
    }

    #[test]
    fn special_kinds() {
        assert!(LineKind::Heading.is_special());
        assert!(LineKind::DatedEntry.is_special());
        assert!(!LineKind::Indented.is_special());
        assert!(LineKind::Indented.starts_block());
        assert!(!LineKind::Plain.starts_block());
    }

    #[test]
    fn short_line_rule() {
        assert!(is_short_line("Some short line"));
        assert!(!is_short_line("这是一句完整的话。"));
        assert!(!is_short_line("真的吗？"));
        // Punctuation in the middle does not count.
        assert!(is_short_line("他说：好。然后"));
        assert!(!is_short_line(&"长".repeat(50)));
    }
}
