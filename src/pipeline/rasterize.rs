//! Stage 3: rasterise every page of the finished PDF to PNG for visual QA.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. The whole render loop
//! runs on a blocking-pool thread so Tokio workers never stall on it.
//!
//! ## Why PNG?
//!
//! The screenshots are compared by eye against the browser view. Lossless
//! output keeps 6.5pt footer text legible at the default 110 DPI; JPEG
//! ringing around small glyphs makes that comparison unreliable.

use crate::error::ProposalPdfError;
use crate::progress::ProgressCallback;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Render each page of `pdf_path` at `dpi` into `out_dir/page_NN.png`.
///
/// Stale `page_*.png` files from earlier runs are removed first, so the
/// directory always mirrors the current document. Returns the written paths
/// in page order.
pub async fn screenshot_pages(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    progress: Option<ProgressCallback>,
) -> Result<Vec<PathBuf>, ProposalPdfError> {
    let path = pdf_path.to_path_buf();
    let dir = out_dir.to_path_buf();

    let written = tokio::task::spawn_blocking(move || {
        screenshot_pages_blocking(&path, &dir, dpi, progress.as_ref())
    })
    .await
    .map_err(|e| ProposalPdfError::Internal(format!("Rasterise task panicked: {}", e)))??;

    info!(
        "Saved {} page screenshots to {}",
        written.len(),
        out_dir.display()
    );
    Ok(written)
}

fn screenshot_pages_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<PathBuf>, ProposalPdfError> {
    std::fs::create_dir_all(out_dir).map_err(|e| ProposalPdfError::write_failed(out_dir, e))?;
    let removed = clear_old_screenshots(out_dir)?;
    if removed > 0 {
        debug!("Removed {} stale screenshots", removed);
    }

    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| ProposalPdfError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ProposalPdfError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale_for_dpi(dpi));
    let pages = document.pages();
    let total = pages.len() as usize;
    let mut written = Vec::with_capacity(total);

    for (index, page) in pages.iter().enumerate() {
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ProposalPdfError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            }
        })?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );

        let png = encode_png(&image).map_err(|e| ProposalPdfError::RasterisationFailed {
            page: index + 1,
            detail: e.to_string(),
        })?;
        let out = out_dir.join(screenshot_name(index));
        std::fs::write(&out, png).map_err(|e| ProposalPdfError::write_failed(&out, e))?;
        written.push(out);

        if let Some(cb) = progress {
            cb.on_page_rasterized(index + 1, total);
        }
    }

    Ok(written)
}

/// PDF user space is 72 units per inch.
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / 72.0
}

/// `page_01.png` for the first page. Three-digit numbers appear past 99.
pub fn screenshot_name(index: usize) -> String {
    format!("page_{:02}.png", index + 1)
}

/// Delete `page_*.png` in `dir`. Other files are left alone.
pub fn clear_old_screenshots(dir: &Path) -> Result<usize, ProposalPdfError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ProposalPdfError::write_failed(dir, e))?;
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("page_") && name.ends_with(".png") && entry.path().is_file() {
            std::fs::remove_file(entry.path())
                .map_err(|e| ProposalPdfError::write_failed(entry.path(), e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn names_are_one_based_and_padded() {
        assert_eq!(screenshot_name(0), "page_01.png");
        assert_eq!(screenshot_name(9), "page_10.png");
        assert_eq!(screenshot_name(99), "page_100.png");
    }

    #[test]
    fn scale_at_default_dpi() {
        assert!((scale_for_dpi(110) - 1.527_777_8).abs() < 1e-6);
        assert_eq!(scale_for_dpi(72), 1.0);
    }

    #[test]
    fn clears_only_page_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page_01.png", "page_02.png", "notes.txt", "cover.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let removed = clear_old_screenshots(dir.path()).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.path().join("page_01.png").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("cover.png").exists());
    }

    #[test]
    fn png_signature() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([16, 16, 16, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
