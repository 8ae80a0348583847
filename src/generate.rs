//! Top-level entry points: run the whole pipeline, or inspect its output.
//!
//! ## Why strictly sequential?
//!
//! Every stage consumes the file the previous stage left on disk: Chromium
//! writes the PDF, the footer stage rewrites it in place, and the rasteriser
//! reads the stamped result. Nothing is worth overlapping, and any failure
//! aborts the run with the previous file still intact.

use crate::config::PipelineConfig;
use crate::error::ProposalPdfError;
use crate::output::{PdfSummary, PipelineOutput, PipelineStats};
use crate::pipeline::{annotate, input, rasterize, render};
use crate::progress::{ProgressCallback, Stage};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Render the proposal, stamp the footer, and screenshot every page.
///
/// # Errors
/// Any stage failure is fatal. Elements the page lacks (a section ID, a
/// portfolio table) are not failures; they show up as lower counts in
/// [`crate::output::RenderReport`].
pub async fn generate(config: &PipelineConfig) -> Result<PipelineOutput, ProposalPdfError> {
    let total_start = Instant::now();
    let cb = config.progress_callback.clone();
    let stage_count = if config.skip_screenshots { 2 } else { 3 };
    if let Some(ref cb) = cb {
        cb.on_pipeline_start(stage_count);
    }

    let html = input::resolve_html(&config.html_path).await?;

    // ── Stage 1: Chromium ────────────────────────────────────────────────
    stage_start(Stage::Render, &cb);
    let start = Instant::now();
    let report = render::render_pdf(&html, config).await?;
    let render_duration_ms = start.elapsed().as_millis() as u64;
    stage_complete(
        Stage::Render,
        &cb,
        &format!("PDF written ({:.1} MB)", report.pdf_megabytes()),
    );

    // ── Stage 2: Footer ──────────────────────────────────────────────────
    stage_start(Stage::Annotate, &cb);
    let start = Instant::now();
    let footer_pages = annotate::add_branded_footer(&config.output_path, config).await?;
    let annotate_duration_ms = start.elapsed().as_millis() as u64;
    stage_complete(
        Stage::Annotate,
        &cb,
        &format!("Footer added to {footer_pages} pages"),
    );

    // ── Stage 3: Screenshots ─────────────────────────────────────────────
    let mut rasterize_duration_ms = 0;
    let screenshots = if config.skip_screenshots {
        info!("Skipping page screenshots");
        Vec::new()
    } else {
        stage_start(Stage::Rasterize, &cb);
        let start = Instant::now();
        let written = rasterize::screenshot_pages(
            &config.output_path,
            &config.screenshot_dir,
            config.screenshot_dpi,
            cb.clone(),
        )
        .await?;
        rasterize_duration_ms = start.elapsed().as_millis() as u64;
        stage_complete(
            Stage::Rasterize,
            &cb,
            &format!(
                "Saved {} page screenshots to {}",
                written.len(),
                config.screenshot_dir.display()
            ),
        );
        written
    };

    let summary = inspect(&config.output_path).await?;
    info!(
        "Final: {} pages, {:.1} MB",
        summary.page_count,
        summary.file_size_megabytes()
    );
    info!("Page size: {}", summary.page_size_line());

    if let Some(ref cb) = cb {
        cb.on_pipeline_complete(summary.page_count);
    }

    Ok(PipelineOutput {
        summary,
        report,
        footer_pages,
        screenshots,
        stats: PipelineStats {
            render_duration_ms,
            annotate_duration_ms,
            rasterize_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        },
    })
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(config: &PipelineConfig) -> Result<PipelineOutput, ProposalPdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ProposalPdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(config))
}

/// Page count, first-page size and file size of a PDF. No browser needed.
pub async fn inspect(pdf_path: impl AsRef<Path>) -> Result<PdfSummary, ProposalPdfError> {
    let path: PathBuf = pdf_path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || inspect_blocking(&path))
        .await
        .map_err(|e| ProposalPdfError::Internal(format!("Inspect task panicked: {}", e)))?
}

fn inspect_blocking(path: &Path) -> Result<PdfSummary, ProposalPdfError> {
    let file_size_bytes = std::fs::metadata(path)
        .map_err(|_| ProposalPdfError::PdfNotFound {
            path: path.to_path_buf(),
        })?
        .len();

    let doc = annotate::load(path)?;
    let pages = doc.get_pages();
    let first = pages
        .values()
        .next()
        .copied()
        .ok_or_else(|| ProposalPdfError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "document has no pages".into(),
        })?;
    let [llx, lly, urx, ury] =
        annotate::media_box(&doc, first).ok_or_else(|| ProposalPdfError::MissingMediaBox {
            path: path.to_path_buf(),
            page: 1,
        })?;

    Ok(PdfSummary {
        path: path.to_path_buf(),
        page_count: pages.len(),
        width_pts: (urx - llx) as f64,
        height_pts: (ury - lly) as f64,
        file_size_bytes,
    })
}

fn stage_start(stage: Stage, cb: &Option<ProgressCallback>) {
    info!("=== {} ===", stage);
    if let Some(cb) = cb {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(stage: Stage, cb: &Option<ProgressCallback>, detail: &str) {
    if let Some(cb) = cb {
        cb.on_stage_complete(stage, detail);
    }
}
