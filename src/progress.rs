//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its three stages. The CLI uses it to
//! drive a terminal progress bar; library callers can forward the events
//! anywhere.
//!
//! # Example
//!
//! ```rust
//! use proposal_pdf::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl PipelineProgressCallback for PageCounter {
//!     fn on_page_rasterized(&self, _page: usize, _total: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The three pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Chromium renders the HTML to PDF.
    Render,
    /// The branded footer is drawn on every page.
    Annotate,
    /// Every page is rasterised to PNG.
    Rasterize,
}

impl Stage {
    /// 1-based position used in log banners.
    pub fn number(self) -> usize {
        match self {
            Stage::Render => 1,
            Stage::Annotate => 2,
            Stage::Rasterize => 3,
        }
    }

    /// Banner title, as printed between `===` markers.
    pub fn title(self) -> &'static str {
        match self {
            Stage::Render => "Chromium PDF generation (8.5\u{00d7}14 Legal)",
            Stage::Annotate => "Branded footer",
            Stage::Rasterize => "Page screenshots for QA",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage {}: {}", self.number(), self.title())
    }
}

/// Called by the pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive sequentially from one task, but the
/// trait is `Send + Sync` because stage 3 reports from a blocking thread.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once before stage 1 with the number of stages that will run.
    fn on_pipeline_start(&self, stages: usize) {
        let _ = stages;
    }

    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes; `detail` is a one-line human summary.
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called after each PNG is written (1-indexed page number).
    fn on_page_rasterized(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once after the final PDF has been inspected.
    fn on_pipeline_complete(&self, page_count: usize) {
        let _ = page_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
