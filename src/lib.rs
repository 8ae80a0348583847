//! # proposal-pdf
//!
//! Turn the Inkline proposal web page into a branded, print-ready US-Legal
//! PDF, plus a PNG of every page for visual QA.
//!
//! ## Why a browser?
//!
//! The proposal is a designed web page: gradients, grid layouts, web fonts,
//! lazily loaded images. Only a real browser engine reproduces it faithfully,
//! so headless Chromium does the layout and printing. Everything a browser
//! cannot do well (a per-page footer with "Page N of M") is added afterwards
//! on the PDF itself.
//!
//! ## Pipeline Overview
//!
//! ```text
//! index.html
//!  │
//!  ├─ 1. Render    Chromium: lazy images, print CSS, page breaks,
//!  │               expanded portfolio cards → 8.5×14 PDF
//!  ├─ 2. Annotate  lopdf: black footer strip, version stamp, page numbers
//!  ├─ 3. Rasterize pdfium: page_01.png … page_NN.png
//!  └─ 4. Inspect   final page count, file size and page size
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use proposal_pdf::{generate, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .html_path("site/index.html")
//!         .output_path("Proposal.pdf")
//!         .build()?;
//!     let output = generate(&config).await?;
//!     eprintln!(
//!         "{} pages, {} screenshots",
//!         output.summary.page_count,
//!         output.screenshots.len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `proposal-pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod portfolio;
pub mod progress;
pub mod scripts;
pub mod stylesheet;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    FooterStyle, Length, PageGeometry, PipelineConfig, PipelineConfigBuilder, Rgb, Viewport,
};
pub use error::ProposalPdfError;
pub use generate::{generate, generate_sync, inspect};
pub use output::{PdfSummary, PipelineOutput, PipelineStats, RenderReport};
pub use portfolio::{PortfolioEntry, PortfolioTable};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
