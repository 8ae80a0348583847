//! Stage 1: drive headless Chromium to print the proposal to PDF.
//!
//! The page is loaded from disk, given time to settle, then prepared for
//! print in place: lazy images are forced to load, the print stylesheet is
//! injected, major sections get forced page breaks and portfolio cards are
//! expanded with their long-form narrative. Finally Chromium's own
//! print-to-PDF produces the document at US-Legal size.
//!
//! chromiumoxide splits a session into a `Browser` handle and a `Handler`
//! stream that must be polled for any CDP call to make progress; the handler
//! runs on its own task for the lifetime of the browser.

use crate::config::{PageGeometry, PipelineConfig};
use crate::error::ProposalPdfError;
use crate::output::RenderReport;
use crate::pipeline::input::ResolvedHtml;
use crate::portfolio::{self, PortfolioTable};
use crate::scripts;
use crate::stylesheet::print_css;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Grace period for the CDP handler to drain after the browser closes.
const HANDLER_SHUTDOWN: Duration = Duration::from_secs(5);

/// Render `html` to `config.output_path`.
pub async fn render_pdf(
    html: &ResolvedHtml,
    config: &PipelineConfig,
) -> Result<RenderReport, ProposalPdfError> {
    let (mut browser, mut handler) = Browser::launch(browser_config(config)?)
        .await
        .map_err(|e| ProposalPdfError::BrowserLaunch {
            detail: e.to_string(),
        })?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("CDP handler: {}", e);
            }
        }
    });

    let session = print_page(&browser, html, config).await;

    if let Err(e) = browser.close().await {
        warn!("Browser did not close cleanly: {}", e);
    }
    let _ = browser.wait().await;
    if tokio::time::timeout(HANDLER_SHUTDOWN, handler_task).await.is_err() {
        debug!("CDP handler still running after close; abandoning it");
    }

    let (mut report, pdf) = session?;

    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ProposalPdfError::write_failed(parent, e))?;
        }
    }
    tokio::fs::write(&config.output_path, &pdf)
        .await
        .map_err(|e| ProposalPdfError::write_failed(&config.output_path, e))?;

    report.pdf_bytes = pdf.len() as u64;
    info!(
        "PDF: {}  ({:.1} MB)",
        config
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        report.pdf_megabytes()
    );
    Ok(report)
}

/// Load, prepare and print the page. Returns the report and the PDF bytes.
async fn print_page(
    browser: &Browser,
    html: &ResolvedHtml,
    config: &PipelineConfig,
) -> Result<(RenderReport, Vec<u8>), ProposalPdfError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ProposalPdfError::BrowserLaunch {
            detail: format!("could not open a tab: {e}"),
        })?;

    info!("Loading: {}", html.url);
    let nav_timeout = Duration::from_millis(config.navigation_timeout_ms);
    match tokio::time::timeout(nav_timeout, page.goto(html.url.as_str())).await {
        Err(_) => {
            return Err(ProposalPdfError::NavigationTimeout {
                url: html.url.clone(),
                timeout_ms: config.navigation_timeout_ms,
            })
        }
        Ok(Err(e)) => {
            return Err(ProposalPdfError::NavigationFailed {
                url: html.url.clone(),
                detail: e.to_string(),
            })
        }
        Ok(Ok(_)) => {}
    }

    info!("Waiting for page render...");
    sleep(Duration::from_millis(config.render_settle_ms)).await;

    let lazy_images_fixed: usize =
        evaluate(&page, "fix_lazy_images", scripts::FIX_LAZY_IMAGES).await?;
    info!("Removed lazy loading from {} images", lazy_images_fixed);

    sleep(Duration::from_millis(config.image_settle_ms)).await;

    let _: bool = evaluate(&page, "inject_css", &scripts::inject_css(print_css())).await?;

    let sections_marked: usize = evaluate(
        &page,
        "mark_section_breaks",
        &scripts::mark_section_breaks(&config.break_section_ids),
    )
    .await?;
    info!("Marked {} sections with page breaks", sections_marked);

    let cards_expanded = expand_portfolio(&page, &html.source).await?;
    info!("Expanded {} portfolio cards for PDF", cards_expanded);

    info!("Rendering PDF...");
    let pdf = page
        .pdf(print_params(&config.page))
        .await
        .map_err(|e| ProposalPdfError::PdfExportFailed {
            detail: e.to_string(),
        })?;

    Ok((
        RenderReport {
            lazy_images_fixed,
            sections_marked,
            cards_expanded,
            pdf_bytes: 0,
        },
        pdf,
    ))
}

/// Evaluate the page's portfolio table and expand the matching cards.
///
/// A page without a table, or with one the browser cannot evaluate, simply
/// gets no expanded cards.
async fn expand_portfolio(page: &Page, source: &str) -> Result<usize, ProposalPdfError> {
    let Some(literal) = portfolio::extract_portfolio_literal(source) else {
        debug!("No portfolioData declaration in page source");
        return Ok(0);
    };

    let table: PortfolioTable =
        match evaluate(page, "evaluate_portfolio", &scripts::evaluate_literal(literal)).await {
            Ok(value) => portfolio::table_from_value(value),
            Err(e) => {
                warn!("portfolioData could not be evaluated: {}", e);
                return Ok(0);
            }
        };
    debug!("portfolioData has {} entries", table.len());

    evaluate(
        page,
        "expand_portfolio_cards",
        &scripts::expand_portfolio_cards(&table),
    )
    .await
}

/// Run `js` in the page and deserialise its return value.
async fn evaluate<T: DeserializeOwned>(
    page: &Page,
    step: &'static str,
    js: &str,
) -> Result<T, ProposalPdfError> {
    let result = page
        .evaluate(js)
        .await
        .map_err(|e| ProposalPdfError::ScriptFailed {
            step,
            detail: e.to_string(),
        })?;
    result
        .into_value::<T>()
        .map_err(|e| ProposalPdfError::ScriptFailed {
            step,
            detail: format!("unexpected return value: {e}"),
        })
}

fn browser_config(config: &PipelineConfig) -> Result<BrowserConfig, ProposalPdfError> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .window_size(config.viewport.width, config.viewport.height)
        .viewport(CdpViewport {
            width: config.viewport.width,
            height: config.viewport.height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        })
        .request_timeout(Duration::from_millis(config.navigation_timeout_ms));

    if let Some(ref exe) = config.chrome_executable {
        builder = builder.chrome_executable(exe);
    }

    builder
        .build()
        .map_err(|detail| ProposalPdfError::BrowserLaunch { detail })
}

/// Print options: fixed paper and margins, backgrounds on, no browser
/// header/footer (stage 2 draws its own), and the CSS `@page` size ignored.
pub fn print_params(page: &PageGeometry) -> PrintToPdfParams {
    PrintToPdfParams {
        paper_width: Some(page.width_inches()),
        paper_height: Some(page.height_inches()),
        margin_top: Some(page.margin_top_inches()),
        margin_right: Some(page.margin_right_inches()),
        margin_bottom: Some(page.margin_bottom_inches()),
        margin_left: Some(page.margin_left_inches()),
        print_background: Some(true),
        display_header_footer: Some(false),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_params_for_legal_paper() {
        let p = print_params(&PageGeometry::default());
        assert_eq!(p.paper_width, Some(8.5));
        assert_eq!(p.paper_height, Some(14.0));
        assert_eq!(p.margin_left, Some(0.0));
        assert_eq!(p.margin_right, Some(0.0));
        let top = p.margin_top.unwrap();
        let bottom = p.margin_bottom.unwrap();
        assert!((top - 14.0 / 25.4).abs() < 1e-9, "top = {top}");
        assert!((bottom - 14.0 / 25.4).abs() < 1e-9, "bottom = {bottom}");
        assert_eq!(p.print_background, Some(true));
        assert_eq!(p.display_header_footer, Some(false));
        assert_eq!(p.prefer_css_page_size, Some(false));
    }

    #[test]
    fn browser_config_accepts_explicit_executable() {
        let config = PipelineConfig::builder()
            .chrome_executable("/usr/bin/chromium")
            .build()
            .unwrap();
        assert!(browser_config(&config).is_ok());
    }
}
