//! CLI binary for slideforge.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `JobRequest` and prints the run summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use slideforge::{
    JobProgressCallback, JobRequest, NumberPosition, Operation, ProgressCallback, RunSummary,
    Stage,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one live progress bar re-armed at each stage
/// boundary, with per-file log lines printed above it. Works correctly when
/// files complete out-of-order (concurrent enhancement).
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set per stage by
    /// `on_stage_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Collecting input files…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, prefix: String, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_style(progress_style);
        self.bar.set_prefix(prefix);
        self.bar.set_position(0);
        self.bar.set_length(total as u64);
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_files} input file(s)…"))
        ));
    }

    fn on_stage_start(&self, stage: Stage, total_files: usize) {
        self.activate_bar(stage.to_string(), total_files);
    }

    fn on_file_complete(&self, _stage: Stage, file_name: &str) {
        self.bar
            .println(format!("  {} {}", green("✓"), file_name));
        self.bar.inc(1);
    }

    fn on_file_error(&self, _stage: Stage, file_name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar
            .println(format!("  {} {}  {}", red("✗"), file_name, red(&msg)));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, succeeded: usize, failed: usize) {
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file(s) processed successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {} file(s) processed  ({} failed)",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full workflow: enhance, merge 3 slides per A4 sheet, number the pages
  slideforge full slides/ -o printable -n lecture

  # Enhance every PDF in a directory (writes <name>_enhanced.pdf each)
  slideforge enhance slides/ -o enhanced

  # Enhance and also append everything into one combined PDF
  slideforge enhance slides/ -o enhanced --combine -n course

  # Merge slides onto A4 sheets without enhancement
  slideforge merge slides/ -o out -n handout --slides-per-page 2

  # Stamp page numbers on a single PDF, continuing from page 17
  slideforge number report.pdf -o out --position bottom-left --start-page 17

  # Pack a directory of scans into one PDF, no numbering
  slideforge images scans/ -o out -n archive --position none

  # Machine-readable summary
  slideforge full slides/ -o out --json > summary.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH    Path to an existing libpdfium shared library
  RUST_LOG           Tracing filter override (e.g. slideforge=debug)

The pdfium shared library is resolved from PDFIUM_LIB_PATH, then the
working directory, then the system library path.
"#;

/// Prepare slide decks and scans for printing.
#[derive(Parser, Debug)]
#[command(
    name = "slideforge",
    version,
    about = "Enhance, merge, number, and assemble PDFs from slides and scans",
    long_about = "Prepare lecture-slide PDFs and scanned images for printing: invert and \
sharpen dark slides, stack several slides per A4 sheet, stamp running page numbers, and \
pack image sets into PDFs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output the run summary as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Input PDF/image file or directory.
    input: PathBuf,

    /// Directory receiving all outputs (created if missing).
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Base name (no extension) for derived output files.
    #[arg(short = 'n', long, default_value = "output")]
    name: String,

    /// Rasterisation DPI (72-400).
    #[arg(long, default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PositionArg {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    None,
}

impl From<PositionArg> for NumberPosition {
    fn from(v: PositionArg) -> Self {
        match v {
            PositionArg::TopLeft => NumberPosition::TopLeft,
            PositionArg::TopRight => NumberPosition::TopRight,
            PositionArg::BottomLeft => NumberPosition::BottomLeft,
            PositionArg::BottomRight => NumberPosition::BottomRight,
            PositionArg::Center => NumberPosition::Center,
            PositionArg::None => NumberPosition::None,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enhance each PDF for printing (invert, boost contrast, sharpen).
    Enhance {
        #[command(flatten)]
        common: CommonArgs,

        /// Also append all enhanced documents into one combined PDF.
        #[arg(long)]
        combine: bool,

        /// Number of files enhanced concurrently.
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,
    },

    /// Stack slide pages onto A4 sheets.
    Merge {
        #[command(flatten)]
        common: CommonArgs,

        /// Slides stacked per A4 sheet (1-8).
        #[arg(long, default_value_t = 3,
              value_parser = clap::value_parser!(u32).range(1..=8))]
        slides_per_page: u32,
    },

    /// Stamp a running page number onto a single PDF.
    Number {
        #[command(flatten)]
        common: CommonArgs,

        /// Page-number anchor.
        #[arg(long, value_enum, default_value = "bottom-right")]
        position: PositionArg,

        /// First printed page number.
        #[arg(long, default_value_t = 1,
              value_parser = clap::value_parser!(u32).range(1..))]
        start_page: u32,
    },

    /// Pack a set of images into one PDF, one full page per image.
    Images {
        #[command(flatten)]
        common: CommonArgs,

        /// Page-number anchor, or `none` to skip numbering.
        #[arg(long, value_enum, default_value = "none")]
        position: PositionArg,

        /// First printed page number.
        #[arg(long, default_value_t = 1,
              value_parser = clap::value_parser!(u32).range(1..))]
        start_page: u32,
    },

    /// Full workflow: enhance, merge onto A4 sheets, number the pages.
    Full {
        #[command(flatten)]
        common: CommonArgs,

        /// Page-number anchor, or `none` to skip numbering.
        #[arg(long, value_enum, default_value = "bottom-right")]
        position: PositionArg,

        /// First printed page number.
        #[arg(long, default_value_t = 1,
              value_parser = clap::value_parser!(u32).range(1..))]
        start_page: u32,

        /// Slides stacked per A4 sheet (1-8).
        #[arg(long, default_value_t = 3,
              value_parser = clap::value_parser!(u32).range(1..=8))]
        slides_per_page: u32,

        /// Number of files enhanced concurrently.
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn JobProgressCallback>)
    } else {
        None
    };

    let request = build_request(&cli, progress_cb)?;
    let summary = slideforge::run(request)
        .await
        .context("Processing failed")?;

    print_summary(&cli, &summary)?;
    Ok(())
}

/// Map CLI args to a `JobRequest`.
fn build_request(cli: &Cli, progress: Option<ProgressCallback>) -> Result<JobRequest> {
    let mut builder = match &cli.command {
        Command::Enhance {
            common,
            combine,
            concurrency,
        } => JobRequest::builder(Operation::Enhance, &common.input, &common.output_dir)
            .base_name(&common.name)
            .dpi(common.dpi)
            .combine(*combine)
            .concurrency(*concurrency),

        Command::Merge {
            common,
            slides_per_page,
        } => JobRequest::builder(Operation::MergeSlides, &common.input, &common.output_dir)
            .base_name(&common.name)
            .dpi(common.dpi)
            .slides_per_page(*slides_per_page),

        Command::Number {
            common,
            position,
            start_page,
        } => JobRequest::builder(Operation::AddPageNumbers, &common.input, &common.output_dir)
            .base_name(&common.name)
            .position((*position).into())
            .start_page(*start_page),

        Command::Images {
            common,
            position,
            start_page,
        } => JobRequest::builder(Operation::ImagesToPdf, &common.input, &common.output_dir)
            .base_name(&common.name)
            .dpi(common.dpi)
            .position((*position).into())
            .start_page(*start_page),

        Command::Full {
            common,
            position,
            start_page,
            slides_per_page,
            concurrency,
        } => JobRequest::builder(Operation::Full, &common.input, &common.output_dir)
            .base_name(&common.name)
            .dpi(common.dpi)
            .position((*position).into())
            .start_page(*start_page)
            .slides_per_page(*slides_per_page)
            .concurrency(*concurrency),
    };

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid arguments")
}

fn print_summary(cli: &Cli, summary: &RunSummary) -> Result<()> {
    if cli.json {
        let json =
            serde_json::to_string_pretty(summary).context("Failed to serialise run summary")?;
        println!("{json}");
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    for output in &summary.outputs {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&output.display().to_string()),
            dim(&format!("{}ms", summary.duration_ms)),
        );
    }

    if !summary.is_clean() {
        eprintln!(
            "{} {} input file(s) were excluded:",
            cyan("⚠"),
            red(&summary.failed_count().to_string())
        );
        for stage in &summary.stages {
            for failure in &stage.failed {
                eprintln!("   {} {}", red("✗"), failure.reason);
            }
        }
    }

    Ok(())
}
