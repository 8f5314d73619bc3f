//! PDF rasterisation: render every page to a numbered image via pdfium.
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state; the whole render runs on the blocking pool.
//!
//! Output files are named `<start_index + i>.<ext>`, the numbering the OCR
//! orchestrator expects.

use crate::error::PdfSetError;
use crate::files;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output format for rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    #[default]
    Jpeg,
    Png,
}

impl RenderFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            RenderFormat::Jpeg => "jpg",
            RenderFormat::Png => "png",
        }
    }
}

/// Rendering options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Render resolution. Default: 144.
    pub dpi: u32,
    /// Index given to the first page. Default: 0.
    pub start_index: usize,
    pub format: RenderFormat,
    /// Cap on the longest edge in pixels, aspect preserved. Default: none.
    pub max_dim: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 144,
            start_index: 0,
            format: RenderFormat::default(),
            max_dim: None,
        }
    }
}

/// Render every page of `pdf_path` into `output_dir`; returns the written paths.
pub async fn render_pdf(
    pdf_path: &Path,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<Vec<PathBuf>, PdfSetError> {
    if !pdf_path.is_file() {
        return Err(PdfSetError::FileNotFound {
            path: pdf_path.to_path_buf(),
        });
    }
    files::ensure_dir(output_dir)?;

    let pdf = pdf_path.to_path_buf();
    let out = output_dir.to_path_buf();
    let opts = options.clone();

    tokio::task::spawn_blocking(move || render_pdf_blocking(&pdf, &out, &opts))
        .await
        .map_err(|e| PdfSetError::Internal(format!("Render task panicked: {e}")))?
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the working directory, then
/// the system library search path.
fn bind_pdfium() -> Result<Pdfium, PdfSetError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => Pdfium::bind_to_library(&p),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PdfSetError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

fn render_pdf_blocking(
    pdf_path: &Path,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<Vec<PathBuf>, PdfSetError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| PdfSetError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor(options.dpi as f32 / 72.0);

    let mut written = Vec::with_capacity(pages.len() as usize);
    for (i, page) in pages.iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| PdfSetError::RasterisationFailed {
                page: i,
                detail: format!("{e:?}"),
            })?;

        let image = fit_within(bitmap.as_image(), options.max_dim);
        let path = output_dir.join(format!(
            "{}.{}",
            options.start_index + i,
            options.format.extension()
        ));
        save_image(&image, &path, options.format)?;
        debug!(
            "Rendered page {} → {} ({}x{} px)",
            i,
            path.display(),
            image.width(),
            image.height()
        );
        written.push(path);
    }

    info!("Rendered {} pages into {}", written.len(), output_dir.display());
    Ok(written)
}

/// Scale down so neither edge exceeds `max_dim`; never scales up.
fn fit_within(image: DynamicImage, max_dim: Option<u32>) -> DynamicImage {
    match target_size(image.width(), image.height(), max_dim) {
        Some((w, h)) => image.resize_exact(w, h, image::imageops::FilterType::Lanczos3),
        None => image,
    }
}

fn target_size(width: u32, height: u32, max_dim: Option<u32>) -> Option<(u32, u32)> {
    let max = max_dim?;
    if width <= max && height <= max {
        return None;
    }
    let scale = f64::min(max as f64 / width as f64, max as f64 / height as f64);
    Some((
        ((width as f64 * scale) as u32).max(1),
        ((height as f64 * scale) as u32).max(1),
    ))
}

fn save_image(image: &DynamicImage, path: &Path, format: RenderFormat) -> Result<(), PdfSetError> {
    let result = match format {
        // JPEG has no alpha channel.
        RenderFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .save_with_format(path, ImageFormat::Jpeg),
        RenderFormat::Png => image.save_with_format(path, ImageFormat::Png),
    };
    result.map_err(|e| PdfSetError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: std::io::Error::other(e.to_string()),
    })
}
