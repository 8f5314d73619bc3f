//! Layout reconstruction: turn line-broken transcripts back into paragraphs.
//!
//! OCR output keeps the printed line breaks of the page. [`reconstruct`]
//! walks the non-blank lines once, deciding for each whether it opens a new
//! block or continues the current one (see [`classify`] for the line kinds),
//! then runs the [`cleanup`] rules over the joined text.

pub mod classify;
pub mod cleanup;

pub use classify::{classify, LineKind};
pub use cleanup::cleanup_text;

use crate::error::PdfSetError;
use crate::files;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The merged rough transcript; never typeset as a chapter.
pub const ROUGH_FILE: &str = "0.rough.md";

/// Rebuild paragraphs from `text`.
///
/// In an index (table of contents) every line is its own block. The result
/// has blocks separated by one blank line and ends with a single newline.
///
/// Blank lines never close a block, so a paragraph cut by a page break in
/// the merged transcript is joined again. A block that was opened by a short
/// line and then grew past the short-line limit is therefore appended to its
/// predecessor if the output is reconstructed a second time.
pub fn reconstruct(text: &str, is_index: bool) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_was_heading = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let kind = classify(line);

        let new_block = kind.starts_block()
            || is_heading_block(&current)
            || is_index
            || classify::is_short_line(trimmed);

        if new_block {
            if !current.is_empty() {
                prev_was_heading = is_heading_block(&current);
                blocks.push(current.trim_end().to_string());
            }
            current = if prev_was_heading && kind == LineKind::Plain {
                format!("  {trimmed}")
            } else {
                line.to_string()
            };
        } else if current.is_empty() {
            current = line.to_string();
        } else {
            let kept = current.trim_end();
            let kept = kept.strip_suffix('-').unwrap_or(kept);
            current = format!("{kept}{trimmed}");
        }
    }
    if !current.is_empty() {
        blocks.push(current.trim_end().to_string());
    }

    let mut out = cleanup_text(&blocks.join("\n\n"));
    out.push('\n');
    out
}

fn is_heading_block(block: &str) -> bool {
    block.trim_start().starts_with('#')
}

/// File names that mark a table of contents.
pub fn looks_like_index(file_name: &str) -> bool {
    file_name.contains("目录") || file_name.to_lowercase().contains("contents")
}

/// Reconstruct one chapter file into `output`.
pub fn typeset_file(input: &Path, output: &Path, is_index: bool) -> Result<(), PdfSetError> {
    let text = files::read_text(input)?;
    files::write_atomic(output, reconstruct(&text, is_index).as_bytes())
}

/// Which chapter files a [`typeset_dir`] run touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every `*.md` except [`ROUGH_FILE`], sorted by name.
    #[default]
    All,
    /// These file names, in this order.
    Files(Vec<String>),
    /// The first file named `<n>.*.md` for each index.
    Indices(Vec<usize>),
}

#[derive(Debug, Clone, Default)]
pub struct TypesetOptions {
    pub selection: Selection,
    /// Treat every file as an index regardless of its name.
    pub force_index: bool,
}

/// Names processed and names that could not be found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypesetReport {
    pub processed: Vec<String>,
    pub missing: Vec<String>,
}

/// Resolve a [`Selection`] against the files present in `input_dir`.
pub fn select_files(input_dir: &Path, selection: &Selection) -> Result<Vec<String>, PdfSetError> {
    let mut available: Vec<String> = files::file_names(input_dir)?
        .into_iter()
        .filter(|n| n.ends_with(".md") && n != ROUGH_FILE)
        .collect();
    available.sort();

    Ok(match selection {
        Selection::All => available,
        Selection::Files(names) => names
            .iter()
            .filter(|n| n.as_str() != ROUGH_FILE)
            .cloned()
            .collect(),
        Selection::Indices(indices) => indices
            .iter()
            .filter_map(|i| {
                let prefix = format!("{i}.");
                let found = available.iter().find(|n| n.starts_with(&prefix)).cloned();
                if found.is_none() {
                    warn!("No chapter file with prefix {}", prefix);
                }
                found
            })
            .collect(),
    })
}

/// Read a UTF-8 list of file names, one per line; blank lines and
/// [`ROUGH_FILE`] are skipped.
pub fn read_file_list(path: &Path) -> Result<Vec<String>, PdfSetError> {
    Ok(files::read_text(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && *l != ROUGH_FILE)
        .map(String::from)
        .collect())
}

/// Typeset the selected chapters of `input_dir` into same-named files in
/// `output_dir`. Missing inputs are skipped with a warning.
pub fn typeset_dir(
    input_dir: &Path,
    output_dir: &Path,
    options: &TypesetOptions,
) -> Result<TypesetReport, PdfSetError> {
    if !input_dir.is_dir() {
        return Err(PdfSetError::DirectoryNotFound {
            path: input_dir.to_path_buf(),
        });
    }
    files::ensure_dir(output_dir)?;

    let mut report = TypesetReport::default();
    for name in select_files(input_dir, &options.selection)? {
        let input: PathBuf = input_dir.join(&name);
        if !input.is_file() {
            warn!("{} not found, skipping", input.display());
            report.missing.push(name);
            continue;
        }
        let is_index = options.force_index || looks_like_index(&name);
        info!("Typesetting {}{}", name, if is_index { " (index)" } else { "" });
        typeset_file(&input, &output_dir.join(&name), is_index)?;
        report.processed.push(name);
    }

    info!(
        "Layout cleanup complete: {} processed, {} missing",
        report.processed.len(),
        report.missing.len()
    );
    Ok(report)
}
