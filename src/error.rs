//! Error type for the proposal-pdf library.
//!
//! The pipeline is one-shot: any failure aborts the run. There is therefore a
//! single fatal error type, [`ProposalPdfError`], grouped by the stage that
//! raises it. Conditions that the page itself tolerates (a missing section
//! ID, a portfolio card without a table entry) are not errors; they only
//! lower the counts reported in [`crate::output::RenderReport`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the proposal-pdf library.
#[derive(Debug, Error)]
pub enum ProposalPdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The HTML document was not found at the given path.
    #[error("HTML file not found: '{path}'\nCheck the path exists and is readable.")]
    HtmlNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but does not start with markup.
    #[error("File does not look like HTML: '{path}'\nFirst bytes: {head:?}")]
    NotHtml { path: PathBuf, head: String },

    // ── Browser errors (stage 1) ──────────────────────────────────────────
    /// Chromium could not be found or started.
    #[error(
        "Failed to launch Chromium: {detail}\n\
Install Chrome/Chromium or point --chrome (PROPOSAL_PDF_CHROME) at the executable."
    )]
    BrowserLaunch { detail: String },

    /// Navigation did not complete within the configured timeout.
    #[error("Timed out after {timeout_ms}ms loading '{url}'")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    /// Navigation failed for a reason other than the timeout.
    #[error("Failed to load '{url}': {detail}")]
    NavigationFailed { url: String, detail: String },

    /// A page-side script threw or returned an unexpected value.
    #[error("Page script '{step}' failed: {detail}")]
    ScriptFailed { step: &'static str, detail: String },

    /// Chromium's print-to-PDF call failed.
    #[error("PDF export failed: {detail}")]
    PdfExportFailed { detail: String },

    // ── PDF errors (stage 2) ──────────────────────────────────────────────
    /// The PDF to annotate or inspect does not exist.
    #[error("PDF not found: '{path}'")]
    PdfNotFound { path: PathBuf },

    /// The PDF could not be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// A page has no usable MediaBox (neither on the page nor inherited).
    #[error("Page {page} of '{path}' has no MediaBox")]
    MissingMediaBox { path: PathBuf, page: usize },

    /// Annotation changed the number of pages.
    #[error("Page count changed while annotating '{path}': {before} before, {after} after")]
    PageCountMismatch {
        path: PathBuf,
        before: usize,
        after: usize,
    },

    // ── Rasterisation errors (stage 3) ────────────────────────────────────
    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file or directory.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProposalPdfError {
    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProposalPdfError::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_timeout_display() {
        let e = ProposalPdfError::NavigationTimeout {
            url: "file:///tmp/index.html".into(),
            timeout_ms: 60000,
        };
        let msg = e.to_string();
        assert!(msg.contains("60000ms"), "got: {msg}");
        assert!(msg.contains("file:///tmp/index.html"));
    }

    #[test]
    fn page_count_mismatch_display() {
        let e = ProposalPdfError::PageCountMismatch {
            path: PathBuf::from("out.pdf"),
            before: 12,
            after: 11,
        };
        let msg = e.to_string();
        assert!(msg.contains("12 before"), "got: {msg}");
        assert!(msg.contains("11 after"), "got: {msg}");
    }

    #[test]
    fn script_failed_names_step() {
        let e = ProposalPdfError::ScriptFailed {
            step: "mark_section_breaks",
            detail: "ReferenceError".into(),
        };
        assert!(e.to_string().contains("mark_section_breaks"));
    }

    #[test]
    fn write_failed_keeps_source() {
        use std::error::Error as _;
        let e = ProposalPdfError::write_failed(
            "pdf_pages/page_01.png",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(e.to_string().contains("page_01.png"));
        assert!(e.source().is_some());
    }
}
