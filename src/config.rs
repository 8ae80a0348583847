//! Configuration types for the HTML-to-PDF pipeline.
//!
//! The pipeline produces one fixed-format document, so every constant lives
//! here as a default of [`PipelineConfig`]. `PipelineConfig::default()` is the
//! production configuration; the builder exists for tests and for the few CLI
//! overrides (paths, DPI, browser executable).

use crate::error::ProposalPdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Millimetres per inch.
const MM_PER_INCH: f64 = 25.4;
/// PDF user-space points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;
/// CSS reference pixels per inch.
const PIXELS_PER_INCH: f64 = 96.0;

/// Sections that start on a new page, in document order.
pub const BREAK_SECTION_IDS: &[&str] = &[
    "approach",       // Strategic Approach
    "ia",             // Information Architecture
    "seo",            // SEO & AEO
    "considerations", // Key Considerations
    "scope",          // Technical Scope
    "effort",         // Effort & Investment
    "company",        // About Inkline
    "next-steps",     // Next Steps
];

/// Left-hand footer text drawn on every page.
pub const DEFAULT_FOOTER_LEFT_TEXT: &str = "Inkline + Attention Strategy  \u{00b7}  Rideau Hall Foundation Website Consolidation  \u{00b7}  Confidential";

/// Configuration for one pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use proposal_pdf::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .html_path("site/index.html")
///     .output_path("out/proposal.pdf")
///     .screenshot_dpi(72)
///     .build()
///     .unwrap();
/// assert_eq!(config.screenshot_dpi, 72);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Proposal HTML document. Relative assets resolve against its directory.
    pub html_path: PathBuf,

    /// Where the branded PDF is written (and later rewritten in place).
    pub output_path: PathBuf,

    /// Directory receiving `page_NN.png` screenshots.
    pub screenshot_dir: PathBuf,

    /// Paper size and print margins handed to Chromium.
    pub page: PageGeometry,

    /// Browser viewport in CSS pixels. Default: 1100 × 900.
    ///
    /// Wide enough that the desktop layout (not the mobile breakpoint) is
    /// what gets printed.
    pub viewport: Viewport,

    /// Navigation timeout in milliseconds. Default: 60 000.
    pub navigation_timeout_ms: u64,

    /// Sleep after navigation so web fonts and scripts settle. Default: 3 000.
    pub render_settle_ms: u64,

    /// Sleep after lazy images are forced to load. Default: 2 000.
    pub image_settle_ms: u64,

    /// Element IDs that receive a forced page break.
    pub break_section_ids: Vec<String>,

    /// Geometry and colours of the branded footer strip.
    pub footer: FooterStyle,

    /// Left-hand footer text.
    pub footer_left_text: String,

    /// Screenshot resolution. Range: 36–600. Default: 110.
    pub screenshot_dpi: u32,

    /// Skip stage 3 entirely.
    pub skip_screenshots: bool,

    /// Explicit Chrome/Chromium executable. `None` lets chromiumoxide search.
    pub chrome_executable: Option<PathBuf>,

    /// Optional observer for stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            html_path: PathBuf::from("index.html"),
            output_path: PathBuf::from("Inkline-RHF-Website-Consolidation-Proposal.pdf"),
            screenshot_dir: PathBuf::from("pdf_pages"),
            page: PageGeometry::default(),
            viewport: Viewport::default(),
            navigation_timeout_ms: 60_000,
            render_settle_ms: 3_000,
            image_settle_ms: 2_000,
            break_section_ids: BREAK_SECTION_IDS.iter().map(|s| s.to_string()).collect(),
            footer: FooterStyle::default(),
            footer_left_text: DEFAULT_FOOTER_LEFT_TEXT.to_string(),
            screenshot_dpi: 110,
            skip_screenshots: false,
            chrome_executable: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("html_path", &self.html_path)
            .field("output_path", &self.output_path)
            .field("screenshot_dir", &self.screenshot_dir)
            .field("page", &self.page)
            .field("viewport", &self.viewport)
            .field("navigation_timeout_ms", &self.navigation_timeout_ms)
            .field("render_settle_ms", &self.render_settle_ms)
            .field("image_settle_ms", &self.image_settle_ms)
            .field("break_section_ids", &self.break_section_ids)
            .field("footer", &self.footer)
            .field("screenshot_dpi", &self.screenshot_dpi)
            .field("skip_screenshots", &self.skip_screenshots)
            .field("chrome_executable", &self.chrome_executable)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn html_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.html_path = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.screenshot_dir = dir.into();
        self
    }

    pub fn page(mut self, page: PageGeometry) -> Self {
        self.config.page = page;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport = Viewport { width, height };
        self
    }

    pub fn navigation_timeout_ms(mut self, ms: u64) -> Self {
        self.config.navigation_timeout_ms = ms;
        self
    }

    pub fn render_settle_ms(mut self, ms: u64) -> Self {
        self.config.render_settle_ms = ms;
        self
    }

    pub fn image_settle_ms(mut self, ms: u64) -> Self {
        self.config.image_settle_ms = ms;
        self
    }

    pub fn break_section_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.break_section_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn footer(mut self, footer: FooterStyle) -> Self {
        self.config.footer = footer;
        self
    }

    pub fn footer_left_text(mut self, text: impl Into<String>) -> Self {
        self.config.footer_left_text = text.into();
        self
    }

    pub fn screenshot_dpi(mut self, dpi: u32) -> Self {
        self.config.screenshot_dpi = dpi;
        self
    }

    pub fn skip_screenshots(mut self, v: bool) -> Self {
        self.config.skip_screenshots = v;
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, ProposalPdfError> {
        let c = &self.config;
        if c.html_path.as_os_str().is_empty() || c.output_path.as_os_str().is_empty() {
            return Err(ProposalPdfError::InvalidConfig(
                "HTML and output paths must not be empty".into(),
            ));
        }
        if !(36..=600).contains(&c.screenshot_dpi) {
            return Err(ProposalPdfError::InvalidConfig(format!(
                "Screenshot DPI must be 36–600, got {}",
                c.screenshot_dpi
            )));
        }
        if c.page.width.to_points() <= 0.0 || c.page.height.to_points() <= 0.0 {
            return Err(ProposalPdfError::InvalidConfig(format!(
                "Page size must be positive, got {} × {}",
                c.page.width, c.page.height
            )));
        }
        if c.page.margin_bottom.to_points() + 1e-6 < c.footer.height_pt() {
            return Err(ProposalPdfError::InvalidConfig(format!(
                "Bottom margin {} is smaller than the {}mm footer strip",
                c.page.margin_bottom, c.footer.height_mm
            )));
        }
        if c.viewport.width == 0 || c.viewport.height == 0 {
            return Err(ProposalPdfError::InvalidConfig(
                "Viewport dimensions must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Geometry ─────────────────────────────────────────────────────────────

/// A print length in one of the units used by the CSS `@page` model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Length {
    Inches(f64),
    Millimetres(f64),
    Points(f64),
    /// CSS pixels, 96 to the inch.
    Pixels(f64),
}

impl Length {
    pub fn to_inches(self) -> f64 {
        match self {
            Length::Inches(v) => v,
            Length::Millimetres(v) => v / MM_PER_INCH,
            Length::Points(v) => v / POINTS_PER_INCH,
            Length::Pixels(v) => v / PIXELS_PER_INCH,
        }
    }

    pub fn to_points(self) -> f64 {
        self.to_inches() * POINTS_PER_INCH
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Inches(v) => write!(f, "{v}in"),
            Length::Millimetres(v) => write!(f, "{v}mm"),
            Length::Points(v) => write!(f, "{v}pt"),
            Length::Pixels(v) => write!(f, "{v}px"),
        }
    }
}

/// Paper size and margins for Chromium's print-to-PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: Length,
    pub height: Length,
    pub margin_top: Length,
    pub margin_right: Length,
    pub margin_bottom: Length,
    pub margin_left: Length,
}

impl PageGeometry {
    pub fn width_inches(&self) -> f64 {
        self.width.to_inches()
    }

    pub fn height_inches(&self) -> f64 {
        self.height.to_inches()
    }

    pub fn margin_top_inches(&self) -> f64 {
        self.margin_top.to_inches()
    }

    pub fn margin_right_inches(&self) -> f64 {
        self.margin_right.to_inches()
    }

    pub fn margin_bottom_inches(&self) -> f64 {
        self.margin_bottom.to_inches()
    }

    pub fn margin_left_inches(&self) -> f64 {
        self.margin_left.to_inches()
    }
}

impl Default for PageGeometry {
    /// US Legal, 8.5 × 14 in. The bottom margin reserves the 10mm footer
    /// strip plus 4mm of breathing room.
    fn default() -> Self {
        Self {
            width: Length::Inches(8.5),
            height: Length::Inches(14.0),
            margin_top: Length::Millimetres(14.0),
            margin_right: Length::Millimetres(0.0),
            margin_bottom: Length::Millimetres(FooterStyle::DEFAULT_HEIGHT_MM + 4.0),
            margin_left: Length::Millimetres(0.0),
        }
    }
}

/// Browser viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1100,
            height: 900,
        }
    }
}

// ── Footer ───────────────────────────────────────────────────────────────

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Medium grey, `#8E8E8E`.
    pub const GREY_MED: Rgb = Rgb(142, 142, 142);
    /// Cerulean accent, `#1399CC`.
    pub const CERULEAN: Rgb = Rgb(19, 153, 204);
    /// Near-black, `#101010`.
    pub const BLACK: Rgb = Rgb(16, 16, 16);

    /// Channels as 0–1 floats, the form PDF colour operators take.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// The branded footer strip drawn by stage 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterStyle {
    /// Strip height in millimetres. Default: 10.
    pub height_mm: f64,
    /// Strip fill.
    pub fill: Rgb,
    /// Colour of the left text and the version prefix.
    pub text_color: Rgb,
    /// Colour of the "Page N of M" run.
    pub page_number_color: Rgb,
    /// Helvetica size in points. Default: 6.5.
    pub font_size: f32,
    /// Distance from the left and right page edges in points. Default: 28.
    pub inset_pt: f32,
    /// Baseline offset below the strip's vertical centre, in points. Default: 2.
    pub baseline_drop_pt: f32,
}

impl FooterStyle {
    pub const DEFAULT_HEIGHT_MM: f64 = 10.0;

    /// Strip height in PDF points (~28.35 for 10mm).
    pub fn height_pt(&self) -> f64 {
        Length::Millimetres(self.height_mm).to_points()
    }
}

impl Default for FooterStyle {
    fn default() -> Self {
        Self {
            height_mm: Self::DEFAULT_HEIGHT_MM,
            fill: Rgb::BLACK,
            text_color: Rgb::GREY_MED,
            page_number_color: Rgb::CERULEAN,
            font_size: 6.5,
            inset_pt: 28.0,
            baseline_drop_pt: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legal_paper() {
        let c = PipelineConfig::default();
        assert_eq!(c.page.width.to_points(), 612.0);
        assert_eq!(c.page.height.to_points(), 1008.0);
        assert_eq!(c.page.margin_bottom, Length::Millimetres(14.0));
        assert_eq!(c.screenshot_dpi, 110);
        assert_eq!(c.break_section_ids.len(), 8);
        assert_eq!(c.break_section_ids[0], "approach");
        assert_eq!(c.break_section_ids[7], "next-steps");
    }

    #[test]
    fn footer_height_in_points() {
        let f = FooterStyle::default();
        assert!((f.height_pt() - 28.3465).abs() < 1e-3, "got {}", f.height_pt());
    }

    #[test]
    fn length_conversions() {
        assert!((Length::Millimetres(25.4).to_inches() - 1.0).abs() < 1e-12);
        assert_eq!(Length::Points(36.0).to_inches(), 0.5);
        assert_eq!(Length::Inches(8.5).to_string(), "8.5in");
        assert_eq!(Length::Millimetres(14.0).to_string(), "14mm");
        assert_eq!(Length::Pixels(96.0).to_inches(), 1.0);
        assert_eq!(Length::Pixels(48.0).to_points(), 36.0);
        assert_eq!(Length::Pixels(1100.0).to_string(), "1100px");
    }

    #[test]
    fn page_geometry_in_inches() {
        let page = PageGeometry::default();
        assert_eq!(page.width_inches(), 8.5);
        assert_eq!(page.height_inches(), 14.0);
        assert!((page.margin_top_inches() - 14.0 / 25.4).abs() < 1e-12);
        assert!((page.margin_bottom_inches() - 14.0 / 25.4).abs() < 1e-12);
        assert_eq!(page.margin_left_inches(), 0.0);
        assert_eq!(page.margin_right_inches(), 0.0);

        let px = PageGeometry {
            margin_left: Length::Pixels(48.0),
            ..PageGeometry::default()
        };
        assert_eq!(px.margin_left_inches(), 0.5);
    }

    #[test]
    fn rgb_hex_and_unit() {
        assert_eq!(Rgb::CERULEAN.to_string(), "#1399CC");
        assert_eq!(Rgb(0, 87, 184).to_string(), "#0057B8");
        let [r, g, b] = Rgb::BLACK.to_unit();
        assert!((r - 16.0 / 255.0).abs() < 1e-6);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn builder_rejects_out_of_range_dpi() {
        let err = PipelineConfig::builder().screenshot_dpi(10).build().unwrap_err();
        assert!(matches!(err, ProposalPdfError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_margin_smaller_than_footer() {
        let page = PageGeometry {
            margin_bottom: Length::Millimetres(5.0),
            ..PageGeometry::default()
        };
        let err = PipelineConfig::builder().page(page).build().unwrap_err();
        assert!(err.to_string().contains("footer"), "got: {err}");
    }

    #[test]
    fn builder_overrides_paths() {
        let c = PipelineConfig::builder()
            .html_path("/srv/site/index.html")
            .output_path("/tmp/out.pdf")
            .screenshot_dir("/tmp/shots")
            .skip_screenshots(true)
            .build()
            .unwrap();
        assert_eq!(c.html_path, PathBuf::from("/srv/site/index.html"));
        assert_eq!(c.output_path, PathBuf::from("/tmp/out.pdf"));
        assert!(c.skip_screenshots);
    }

    #[test]
    fn debug_hides_callback() {
        let c = PipelineConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn PipelineProgressCallback>"));
    }
}
