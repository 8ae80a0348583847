//! Pipeline stages for HTML-to-PDF generation.
//!
//! Each submodule owns one step and hands the next one a file on disk.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ annotate ──▶ rasterize
//! (HTML)    (Chromium)  (lopdf)      (pdfium)
//! ```
//!
//! 1. [`input`]    — validate the HTML path and build its `file://` URL
//! 2. [`render`]   — prepare the page for print and export it via CDP
//! 3. [`annotate`] — draw the branded footer, rewrite the PDF atomically;
//!    [`helvetica`] supplies the font metrics it aligns text with
//! 4. [`rasterize`] — PNG screenshot of every page; runs in `spawn_blocking`
//!    because pdfium is not async-safe

pub mod annotate;
pub mod helvetica;
pub mod input;
pub mod rasterize;
pub mod render;
