//! Image encoding: page image bytes → base64 payload for the inference request.
//!
//! Images are sent exactly as stored on disk.

use crate::error::PdfSetError;
use crate::pipeline::images::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// One encoded page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    /// Base64 (standard alphabet, padded).
    pub data: String,
}

/// Encode raw bytes for an inline-data request part.
pub fn encode_bytes(bytes: &[u8], mime_type: &'static str) -> EncodedImage {
    let data = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", data.len());
    EncodedImage { mime_type, data }
}

/// Read and encode a page image.
pub async fn encode_page(image: &PageImage) -> Result<EncodedImage, PdfSetError> {
    let bytes = tokio::fs::read(&image.path)
        .await
        .map_err(|e| PdfSetError::ReadFailed {
            path: image.path.clone(),
            source: e,
        })?;
    Ok(encode_bytes(&bytes, image.mime_type()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_valid_base64() {
        let img = encode_bytes(&[0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg");
        assert_eq!(img.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&img.data).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[tokio::test]
    async fn encode_page_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.png");
        std::fs::write(&path, b"\x89PNG").unwrap();
        let page = PageImage::from_path(&path).unwrap();
        let img = encode_page(&page).await.unwrap();
        assert_eq!(img.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&img.data).unwrap(), b"\x89PNG");
    }
}
