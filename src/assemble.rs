//! Bookkeeping steps around the two cores: merge page transcripts, split the
//! rough text into chapters, merge typeset chapters into the book, and list
//! rejected pages.

use crate::error::PdfSetError;
use crate::files;
use crate::orchestrator::FAIL_SUFFIX;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default name of the merged rough transcript.
pub const ROUGH_FILE: &str = crate::layout::ROUGH_FILE;

static RE_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+").unwrap());
static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static RE_LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.").unwrap());
static RE_FAIL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.fail\.md$").unwrap());

// ── Natural ordering ─────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Number(u64),
    Text(String),
}

fn natural_key(name: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut in_digits = false;

    for c in name.chars() {
        let digit = c.is_ascii_digit();
        if !buf.is_empty() && digit != in_digits {
            chunks.push(to_chunk(&buf, in_digits));
            buf.clear();
        }
        in_digits = digit;
        buf.push(c);
    }
    if !buf.is_empty() {
        chunks.push(to_chunk(&buf, in_digits));
    }
    chunks
}

fn to_chunk(s: &str, digits: bool) -> Chunk {
    if digits {
        Chunk::Number(s.parse().unwrap_or(u64::MAX))
    } else {
        Chunk::Text(s.to_lowercase())
    }
}

/// Order names so that `2.md` sorts before `10.md`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

fn markdown_files(dir: &Path) -> Result<Vec<String>, PdfSetError> {
    if !dir.is_dir() {
        return Err(PdfSetError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let mut names: Vec<String> = files::file_names(dir)?
        .into_iter()
        .filter(|n| n.ends_with(".md"))
        .collect();
    names.sort();
    Ok(names)
}

fn join_sections(sections: &[String]) -> String {
    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

// ── merge ────────────────────────────────────────────────────────────────────

/// Merge every page transcript of `ocr_dir` into `output_file`.
///
/// Files are read in natural order; empty ones (rejection markers included)
/// contribute nothing. Returns the number of files read.
pub fn merge_transcripts(ocr_dir: &Path, output_file: &Path) -> Result<usize, PdfSetError> {
    let mut names = markdown_files(ocr_dir)?;
    names.sort_by(|a, b| natural_cmp(a, b));
    info!("Found {} files to merge", names.len());

    let mut sections = Vec::with_capacity(names.len());
    for name in &names {
        let text = files::read_text(&ocr_dir.join(name))?;
        let text = text.trim();
        if !text.is_empty() {
            sections.push(text.to_string());
        }
    }

    files::write_atomic(output_file, join_sections(&sections).as_bytes())?;
    info!("Merged {} files into {}", names.len(), output_file.display());
    Ok(names.len())
}

// ── split ────────────────────────────────────────────────────────────────────

/// Replace characters that are not allowed in file names.
pub fn sanitize_title(title: &str) -> String {
    RE_UNSAFE.replace_all(title, "_").into_owned()
}

/// One chapter cut from the rough text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub body: String,
}

impl Chapter {
    pub fn file_name(&self, number: usize) -> String {
        format!("{number}.{}.md", sanitize_title(&self.title))
    }

    pub fn contents(&self) -> String {
        format!("# {}\n{}", self.title, self.body)
    }
}

/// Cut `text` at every level-one heading. Text before the first heading is
/// dropped.
pub fn split_chapters(text: &str) -> Vec<Chapter> {
    RE_H1
        .split(text)
        .skip(1)
        .map(|section| {
            let (title, body) = section.split_once('\n').unwrap_or((section, ""));
            Chapter {
                title: title.trim().to_string(),
                body: body.to_string(),
            }
        })
        .collect()
}

/// Split `input_file` into `<n>.<title>.md` files in `output_dir`.
pub fn split_rough(input_file: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, PdfSetError> {
    if !input_file.is_file() {
        return Err(PdfSetError::FileNotFound {
            path: input_file.to_path_buf(),
        });
    }
    let text = files::read_text(input_file)?;
    files::ensure_dir(output_dir)?;

    let mut written = Vec::new();
    for (i, chapter) in split_chapters(&text).iter().enumerate() {
        let path = output_dir.join(chapter.file_name(i + 1));
        files::write_atomic(&path, chapter.contents().as_bytes())?;
        debug!("Created {}", path.display());
        written.push(path);
    }
    info!("Split {} into {} chapters", input_file.display(), written.len());
    Ok(written)
}

// ── merge-final ──────────────────────────────────────────────────────────────

/// Leading chapter number; names without one sort last.
pub fn chapter_number(name: &str) -> u64 {
    RE_LEADING_NUMBER
        .captures(name)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(999)
}

/// Merge the typeset chapters of `input_dir` into the book file.
/// Returns the chapter names in merge order.
pub fn merge_final(input_dir: &Path, output_file: &Path) -> Result<Vec<String>, PdfSetError> {
    let mut names = markdown_files(input_dir)?;
    names.sort_by_key(|n| chapter_number(n));
    info!("Merging files in order: {:?}", names);

    let mut sections = Vec::with_capacity(names.len());
    for name in &names {
        sections.push(files::read_text(&input_dir.join(name))?.trim().to_string());
    }

    files::write_atomic(output_file, join_sections(&sections).as_bytes())?;
    info!("Merged book into {}", output_file.display());
    Ok(names)
}

// ── list-fail ────────────────────────────────────────────────────────────────

/// Indices of the pages with a rejection marker, ascending.
pub fn list_failed_pages(ocr_dir: &Path) -> Result<Vec<usize>, PdfSetError> {
    let mut pages: Vec<usize> = files::file_names(ocr_dir)?
        .iter()
        .filter(|n| n.ends_with(FAIL_SUFFIX))
        .filter_map(|n| RE_FAIL_MARKER.captures(n))
        .filter_map(|c| c[1].parse().ok())
        .collect();
    pages.sort_unstable();
    Ok(pages)
}

/// Image file name to re-run for a failed page.
pub fn failed_image_name(page: usize) -> String {
    format!("{page}.jpg")
}
