//! OCR instruction sent with every page image.
//!
//! Callers override it with a prompt file (`--prompt-file`); the constant
//! here is used only when no usable override is provided.

use crate::error::PdfSetError;
use std::path::Path;

/// Default instruction when no prompt file is configured.
pub const DEFAULT_OCR_PROMPT: &str =
    "Extract and transcribe any visible text from this image, exactly as it appears.";

/// Load the prompt from `path`, falling back to [`DEFAULT_OCR_PROMPT`] when
/// the path is absent, missing on disk, or blank after trimming.
pub fn load_prompt(path: Option<&Path>) -> Result<String, PdfSetError> {
    let Some(path) = path.filter(|p| p.is_file()) else {
        return Ok(DEFAULT_OCR_PROMPT.to_string());
    };

    let content = std::fs::read_to_string(path).map_err(|e| PdfSetError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Ok(DEFAULT_OCR_PROMPT.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_is_one_transcription_line() {
        assert!(DEFAULT_OCR_PROMPT.starts_with("Extract and transcribe any visible text"));
        assert!(!DEFAULT_OCR_PROMPT.contains('\n'));
    }

    #[test]
    fn missing_file_uses_default() {
        let p = Path::new("/definitely/not/here/ocr_prompt.md");
        assert_eq!(load_prompt(Some(p)).unwrap(), DEFAULT_OCR_PROMPT);
        assert_eq!(load_prompt(None).unwrap(), DEFAULT_OCR_PROMPT);
    }

    #[test]
    fn blank_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ocr_prompt.md");
        std::fs::write(&p, "  \n\n").unwrap();
        assert_eq!(load_prompt(Some(&p)).unwrap(), DEFAULT_OCR_PROMPT);
    }

    #[test]
    fn file_content_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ocr_prompt.md");
        std::fs::write(&p, "\nTranscribe to Markdown. Mark page breaks with 🀄.\n").unwrap();
        assert_eq!(
            load_prompt(Some(&p)).unwrap(),
            "Transcribe to Markdown. Mark page breaks with 🀄."
        );
    }
}
