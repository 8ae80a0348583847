//! CLI binary for proposal-pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints results. With no arguments it renders
//! `index.html` in the current directory using the production defaults.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use proposal_pdf::{
    generate, inspect, PdfSummary, PipelineConfig, PipelineProgressCallback, ProgressCallback,
    Stage,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the browser and footer stages run, switching to a page bar
/// once stage 3 reports its first screenshot.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading HTML…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_pipeline_start(&self, stages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating proposal PDF ({stages} stages)…"))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(format!("Stage {}", stage.number()));
        self.bar.set_message(stage.title());
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar.println(format!(
            "  {} {:<42} {}",
            green("✓"),
            stage.title(),
            dim(detail)
        ));
    }

    fn on_page_rasterized(&self, page_num: usize, total_pages: usize) {
        if page_num == 1 {
            self.activate_bar(total_pages);
        }
        self.bar.set_position(page_num as u64);
    }

    fn on_pipeline_complete(&self, page_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages generated",
            green("✔"),
            bold(&page_count.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Production run: ./index.html → Inkline-RHF-Website-Consolidation-Proposal.pdf
  proposal-pdf

  # Explicit input and output
  proposal-pdf site/index.html -o out/Proposal.pdf

  # Skip the QA screenshots (no PDFium needed)
  proposal-pdf --skip-screenshots

  # Higher resolution screenshots into a custom directory
  proposal-pdf --dpi 200 --screenshots qa/pages

  # Use a specific Chrome build
  proposal-pdf --chrome "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"

  # Page count and size of an existing PDF
  proposal-pdf --inspect-only Proposal.pdf

  # Machine-readable run summary
  proposal-pdf --json > run.json

ENVIRONMENT VARIABLES:
  PROPOSAL_PDF_CHROME         Chrome/Chromium executable (otherwise auto-detected)
  PDFIUM_LIB_PATH             Path to an existing libpdfium — skips auto-download
  PROPOSAL_PDF_PDFIUM_CACHE   Override the default pdfium cache directory
  RUST_LOG                    Log filter, e.g. RUST_LOG=proposal_pdf=debug

  PDFium (~30 MB) is downloaded automatically the first time screenshots are
  taken and cached under ~/.cache/proposal-pdf/.
"#;

#[derive(Parser, Debug)]
#[command(
    name = "proposal-pdf",
    version,
    about = "Render the proposal web page to a branded US-Legal PDF with page screenshots",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Proposal HTML document.
    #[arg(env = "PROPOSAL_PDF_HTML", default_value = "index.html")]
    html: PathBuf,

    /// Output PDF path.
    #[arg(
        short,
        long,
        env = "PROPOSAL_PDF_OUTPUT",
        default_value = "Inkline-RHF-Website-Consolidation-Proposal.pdf"
    )]
    output: PathBuf,

    /// Directory receiving page_NN.png screenshots.
    #[arg(long, env = "PROPOSAL_PDF_SCREENSHOTS", default_value = "pdf_pages")]
    screenshots: PathBuf,

    /// Screenshot resolution.
    #[arg(long, env = "PROPOSAL_PDF_DPI", default_value_t = 110,
          value_parser = clap::value_parser!(u32).range(36..=600))]
    dpi: u32,

    /// Chrome/Chromium executable.
    #[arg(long, env = "PROPOSAL_PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Stop after the footer stage.
    #[arg(long, env = "PROPOSAL_PDF_SKIP_SCREENSHOTS")]
    skip_screenshots: bool,

    /// Print page count and size of an existing PDF, then exit.
    #[arg(long, value_name = "PDF")]
    inspect_only: Option<PathBuf>,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "PROPOSAL_PDF_JSON")]
    json: bool,

    /// Disable the progress display.
    #[arg(long, env = "PROPOSAL_PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Debug logging.
    #[arg(short, long, env = "PROPOSAL_PDF_VERBOSE")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, env = "PROPOSAL_PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress display replaces the INFO stage log; verbose wins over both.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.inspect_only.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if let Some(ref pdf) = cli.inspect_only {
        let summary = inspect(pdf).await.context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        } else {
            print_summary(&summary);
        }
        return Ok(());
    }

    // ── Ensure PDFium engine is available ───────────────────────────────
    // Only stage 3 needs it. The first run downloads the library (~30 MB)
    // into the cache; later runs find it with a path check.
    if !cli.skip_screenshots && !pdfium_auto::is_pdfium_cached() {
        ensure_pdfium(cli.quiet)?;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run pipeline ─────────────────────────────────────────────────────
    let output = generate(&config).await.context("PDF generation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        let s = &output.summary;
        eprintln!(
            "{}  {}  {} pages  {:.1} MB  {}",
            green("✔"),
            bold(&s.path.display().to_string()),
            s.page_count,
            s.file_size_megabytes(),
            dim(&s.page_size_line()),
        );
        if !output.screenshots.is_empty() {
            eprintln!(
                "   {} screenshots  →  {}",
                output.screenshots.len(),
                config.screenshot_dir.display()
            );
        }
        eprintln!(
            "   {}",
            dim(&format!(
                "{} lazy images · {} section breaks · {} portfolio cards · {}ms total",
                output.report.lazy_images_fixed,
                output.report.sections_marked,
                output.report.cards_expanded,
                output.stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

fn ensure_pdfium(quiet: bool) -> Result<()> {
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

fn print_summary(s: &PdfSummary) {
    println!("File:       {}", s.path.display());
    println!("Pages:      {}", s.page_count);
    println!("Size:       {:.1} MB", s.file_size_megabytes());
    println!("Page size:  {}", s.page_size_line());
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .html_path(&cli.html)
        .output_path(&cli.output)
        .screenshot_dir(&cli.screenshots)
        .screenshot_dpi(cli.dpi)
        .skip_screenshots(cli.skip_screenshots);

    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_executable(chrome);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
