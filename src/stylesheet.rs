//! Print stylesheet injected into the proposal before export.
//!
//! Kept as one literal so the exact CSS that reaches Chromium can be read and
//! tested in isolation. Every rule is `!important` because it has to win
//! against the page's own screen styles.

/// Class added to elements that must start on a new page.
pub const SECTION_BREAK_CLASS: &str = "pdf-section-break";

/// Class added to portfolio cards that received the long-form layout.
pub const EXPANDED_CARD_CLASS: &str = "pdf-expanded";

/// The `<style>` block appended to `document.head`.
pub const PRINT_CSS: &str = r#"
<style id="pdf-print-styles">
  /* ---- Force new page before each major section ---- */
  .pdf-section-break {
    break-before: page !important;
    page-break-before: always !important;
  }

  /* ---- Hide elements not needed in PDF ---- */
  .side-nav,
  .toc,
  .portfolio-lightbox,
  .pdf-download-btn,
  .footer,
  .pdf-hide {
    display: none !important;
  }

  /* ---- Card-level break-inside avoidance ---- */
  tr,
  .portfolio-card,
  .scope-card,
  .req-card,
  .site-card,
  .flag-card,
  .stat-card,
  .team-card,
  .next-card,
  .consideration-card,
  .timeline-phase,
  .timeline-item,
  .cost-highlight,
  .journey-container {
    break-inside: avoid !important;
    page-break-inside: avoid !important;
  }

  /* ---- Label rows stay with the following card ---- */
  .phase-header,
  .req-section-label {
    break-after: avoid !important;
    page-break-after: avoid !important;
  }

  /* ---- Headings stay with following content ---- */
  h1, h2, h3, h4, h5, h6,
  .section-label {
    break-after: avoid !important;
    page-break-after: avoid !important;
  }

  .hero::before {
    animation: none !important;
  }

  img {
    max-width: 100% !important;
  }

  body {
    overflow: visible !important;
  }

  /* ============================================================
     Density: scale typography and spacing for 8.5x14
     ============================================================ */
  body {
    font-size: 14px !important;
    line-height: 1.45 !important;
  }
  h1 { font-size: 1.9rem !important; margin-bottom: 0.5rem !important; }
  h2 { font-size: 1.5rem !important; margin-bottom: 0.4rem !important; }
  h3 { font-size: 1.15rem !important; margin-bottom: 0.3rem !important; }
  h4, h5, h6 { font-size: 0.95rem !important; }
  p { margin-bottom: 0.6rem !important; }
  section { padding-top: 1.5rem !important; padding-bottom: 1.5rem !important; }

  .section-label { font-size: 0.7rem !important; }

  .scope-grid, .portfolio-grid, .considerations-grid {
    gap: 1rem !important;
  }

  .stat-card { padding: 0.75rem !important; }
  .stat-card .stat-number { font-size: 1.5rem !important; }
  .stat-card .stat-label { font-size: 0.65rem !important; }

  /* ---- Compact cost highlight so it stays on its page ---- */
  .cost-highlight {
    padding: 1.25rem 2rem !important;
    margin: 1rem 0 !important;
    border-radius: 12px !important;
  }
  .cost-highlight .cost-range {
    font-size: 2rem !important;
    margin-bottom: 0.25rem !important;
  }
  .cost-highlight .cost-label {
    font-size: 0.9rem !important;
  }
  .cost-highlight .cost-note {
    font-size: 0.75rem !important;
    margin-top: 0.25rem !important;
  }

  /* ---- Backgrounds bleed edge-to-edge, text gets margin ---- */
  .container {
    padding-left: 2.5rem !important;
    padding-right: 2.5rem !important;
  }

  .strategy-diagram {
    break-inside: avoid !important;
    page-break-inside: avoid !important;
  }
  .hub-spoke {
    transform: scale(0.85) !important;
    transform-origin: top center !important;
  }

  .nav-level {
    break-inside: avoid !important;
    page-break-inside: avoid !important;
  }

  /* ---- Mega menu 4-col grid: tighten for 8.5" width ---- */
  .nav-level span[style*="font-size:1rem"],
  .nav-level span { font-size: 0.82rem !important; }
  .nav-level .spoke-icon { width: 18px !important; height: 18px !important; }

  /* ---- Portfolio: one column of expanded cards ---- */
  .portfolio-grid {
    grid-template-columns: 1fr !important;
    gap: 2rem !important;
  }

  /* ---- Expanded card: image on top, text below ---- */
  .portfolio-card.pdf-expanded {
    display: block !important;
    cursor: default !important;
    border: 1px solid #E5E7EB !important;
    border-radius: 12px !important;
    overflow: hidden !important;
    background: #fff !important;
  }
  .portfolio-card.pdf-expanded .portfolio-thumb {
    width: 100% !important;
    height: auto !important;
    max-height: 240px !important;
    object-fit: cover !important;
    object-position: top center !important;
    border-radius: 0 !important;
    display: block !important;
  }
  .portfolio-card.pdf-expanded .portfolio-info {
    padding: 1rem 1.25rem !important;
  }
  .portfolio-card.pdf-expanded .portfolio-name {
    font-size: 1rem !important;
  }
  .portfolio-card.pdf-expanded .portfolio-org-type {
    font-size: 0.65rem !important;
  }
  .portfolio-card.pdf-expanded .portfolio-tags {
    margin-top: 0.3rem !important;
  }
  .portfolio-card.pdf-expanded .portfolio-tag {
    font-size: 0.65rem !important;
    padding: 0.1rem 0.4rem !important;
  }
  .portfolio-card.pdf-expanded .portfolio-desc {
    display: none !important;
  }
  .pdf-narrative {
    font-size: 0.82rem !important;
    line-height: 1.45 !important;
    color: #374151 !important;
    margin: 0.4rem 0 !important;
  }
  .pdf-relevance-label {
    font-size: 0.65rem !important;
    font-weight: 700 !important;
    text-transform: uppercase !important;
    letter-spacing: 0.06em !important;
    color: #0891B2 !important;
    margin-top: 0.5rem !important;
    margin-bottom: 0.2rem !important;
  }
  .pdf-relevance {
    font-size: 0.78rem !important;
    line-height: 1.4 !important;
    color: #6B7280 !important;
    margin-bottom: 0.4rem !important;
  }
  .pdf-refs {
    display: flex !important;
    flex-wrap: wrap !important;
    gap: 0.35rem !important;
    margin-top: 0.5rem !important;
  }
  .pdf-ref-tag {
    display: inline-block !important;
    padding: 0.1rem 0.4rem !important;
    background: #F0F9FF !important;
    border: 1px solid #BAE6FD !important;
    border-radius: 3px !important;
    font-size: 0.6rem !important;
    color: #0369A1 !important;
    font-weight: 500 !important;
  }

  .scope-grid {
    grid-template-columns: repeat(2, 1fr) !important;
  }

  /* ---- Glassmorphism cards on the gradient section: visible in print ---- */
  section[style*="linear-gradient"] div[style*="backdrop-filter"] {
    backdrop-filter: none !important;
    -webkit-backdrop-filter: none !important;
    background: rgba(255,255,255,0.2) !important;
    border: 1px solid rgba(255,255,255,0.3) !important;
  }
</style>
"#;

/// The print stylesheet without surrounding whitespace, ready to append to
/// the document head.
pub fn print_css() -> &'static str {
    PRINT_CSS.trim()
}
