//! Result types returned by the pipeline.
//!
//! Everything here is `Serialize` so the CLI can emit it verbatim with
//! `--json`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What stage 1 did to the page before printing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderReport {
    /// Images whose `loading="lazy"` attribute was removed.
    pub lazy_images_fixed: usize,
    /// Sections that received a forced page break.
    pub sections_marked: usize,
    /// Portfolio cards expanded with narrative, relevance and reference tags.
    pub cards_expanded: usize,
    /// Size of the PDF Chromium produced.
    pub pdf_bytes: u64,
}

impl RenderReport {
    pub fn pdf_megabytes(&self) -> f64 {
        self.pdf_bytes as f64 / BYTES_PER_MB
    }
}

/// Page count and first-page size of a PDF on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfSummary {
    pub path: PathBuf,
    pub page_count: usize,
    /// First-page MediaBox width in points.
    pub width_pts: f64,
    /// First-page MediaBox height in points.
    pub height_pts: f64,
    pub file_size_bytes: u64,
}

impl PdfSummary {
    pub fn file_size_megabytes(&self) -> f64 {
        self.file_size_bytes as f64 / BYTES_PER_MB
    }

    pub fn width_inches(&self) -> f64 {
        self.width_pts / crate::config::POINTS_PER_INCH
    }

    pub fn height_inches(&self) -> f64 {
        self.height_pts / crate::config::POINTS_PER_INCH
    }

    /// `612 x 1008 pts (8.5" x 14.0")`
    pub fn page_size_line(&self) -> String {
        format!(
            "{:.0} x {:.0} pts ({:.1}\" x {:.1}\")",
            self.width_pts,
            self.height_pts,
            self.width_inches(),
            self.height_inches()
        )
    }
}

/// Wall-clock timings in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub render_duration_ms: u64,
    pub annotate_duration_ms: u64,
    pub rasterize_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// The final, footer-stamped PDF.
    pub summary: PdfSummary,
    pub report: RenderReport,
    /// Pages that received a footer (always `summary.page_count`).
    pub footer_pages: usize,
    /// Written screenshots in page order; empty when stage 3 was skipped.
    pub screenshots: Vec<PathBuf>,
    pub stats: PipelineStats,
}
