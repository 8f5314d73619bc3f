//! Small file-system helpers shared by every pipeline step.

use crate::error::PdfSetError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `contents` to `path` atomically: temp file in the same directory,
/// then rename. Readers never observe a half-written transcript.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PdfSetError> {
    let fail = |e: std::io::Error| PdfSetError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(fail)?;
    tmp.write_all(contents).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

/// Create `dir` (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), PdfSetError> {
    std::fs::create_dir_all(dir).map_err(|e| PdfSetError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// File names (not paths) of the regular files directly inside `dir`.
///
/// A missing directory yields an empty list; callers that require the
/// directory check for it themselves.
pub fn file_names(dir: &Path) -> Result<Vec<String>, PdfSetError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let read_err = |e: std::io::Error| PdfSetError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.file_type().map_err(read_err)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Read a UTF-8 text file.
pub fn read_text(path: &Path) -> Result<String, PdfSetError> {
    std::fs::read_to_string(path).map_err(|e| PdfSetError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
