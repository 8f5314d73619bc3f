//! Cleanup of transcription artefacts in reconstructed text.
//!
//! ## Rule Order
//!
//! 1. Footnote spans: every `<sup>…</sup>` becomes a single line
//! 2. Repeated CJK phrases (`已经已经` → `已经`)
//! 3. Runs of one CJK character (`太太太` → `太太`)
//! 4. Repeated words separated only by spaces or tabs (`the the` → `the`)
//!
//! Rules 2–4 run until nothing changes: collapsing one repetition can expose
//! another (`甲乙甲乙丙甲乙丙` → `甲乙丙甲乙丙` → `甲乙丙`). Footnotes go first
//! because the de-dup rules never introduce line breaks.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_FOOTNOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<sup>.*?</sup>").unwrap());

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Apply every cleanup rule.
pub fn cleanup_text(text: &str) -> String {
    let mut current = normalize_footnotes(text);
    loop {
        let next = collapse_repeated_words(&collapse_char_runs(&collapse_cjk_phrases(&current)));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// CJK Unified Ideographs, basic block as used by the de-dup rules.
pub fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FA5}').contains(&c)
}

// ── Footnotes ────────────────────────────────────────────────────────────────

/// Join the lines of every footnote span, trimming each.
pub fn normalize_footnotes(text: &str) -> String {
    RE_FOOTNOTE
        .replace_all(text, |caps: &Captures| {
            caps[0].lines().map(str::trim).collect::<String>()
        })
        .into_owned()
}

// ── CJK phrases ──────────────────────────────────────────────────────────────

/// Collapse a CJK phrase (2+ characters) repeated back to back.
///
/// At each position the longest repeating unit wins, and every immediate
/// repetition of it is dropped.
pub fn collapse_cjk_phrases(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !is_cjk(chars[i]) {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let run_end = chars[i..]
            .iter()
            .position(|c| !is_cjk(*c))
            .map_or(chars.len(), |p| i + p);

        match repeating_unit(&chars[i..run_end]) {
            Some((unit, copies)) => {
                out.extend(&chars[i..i + unit]);
                i += unit * copies;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    out
}

/// Longest unit (2+ chars) at the start of `run` that is immediately
/// repeated, with the number of consecutive copies.
fn repeating_unit(run: &[char]) -> Option<(usize, usize)> {
    (2..=run.len() / 2).rev().find_map(|unit| {
        let head = &run[..unit];
        let copies = run
            .chunks_exact(unit)
            .take_while(|chunk| *chunk == head)
            .count();
        (copies >= 2).then_some((unit, copies))
    })
}

// ── CJK character runs ───────────────────────────────────────────────────────

/// Collapse three or more of the same CJK character to exactly two.
pub fn collapse_char_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;

    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if is_cjk(c) && run > 2 {
            continue;
        }
        out.push(c);
    }
    out
}

// ── Repeated words ───────────────────────────────────────────────────────────

/// Drop a word that repeats the previous word with only spaces or tabs in
/// between. Never joins across a line break.
pub fn collapse_repeated_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    let mut prev: Option<&str> = None;

    for m in RE_WORD.find_iter(text) {
        let gap = &text[last_end..m.start()];
        let repeat = prev == Some(m.as_str())
            && !gap.is_empty()
            && gap.chars().all(|c| c == ' ' || c == '\t');
        if !repeat {
            out.push_str(gap);
            out.push_str(m.as_str());
        }
        prev = Some(m.as_str());
        last_end = m.end();
    }
    out.push_str(&text[last_end..]);
    out
}
