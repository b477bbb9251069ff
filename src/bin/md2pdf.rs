//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, finds a default input when none is given, and opens
//! the finished PDF.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf::config::DEFAULT_MONO_FONT;
use md2pdf::{
    convert_async, derive_output_path, ConversionConfig, ConversionProgressCallback, Engine,
    HostEnvironment, Md2PdfError, ProgressCallback, Stage, SystemHost,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

/// Tried in order when no input file is given.
const DEFAULT_INPUTS: &[&str] = &["./example.md", "./README.md", "./docs/example.md"];

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the pipeline stage currently running.
struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Checking pandoc…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl ConversionProgressCallback for SpinnerProgress {
    fn on_conversion_start(&self, source: &Path) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_prefix(format!("Converting {name}"));
    }

    fn on_stage(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_conversion_complete(&self, _output: &Path) {
        self.bar.finish_and_clear();
    }

    fn on_conversion_failed(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the source (notes.pdf)
  md2pdf notes.md

  # Explicit output, table of contents
  md2pdf notes.md -o build/notes.pdf --toc

  # Pick the CJK font and engine
  md2pdf --mainfont "Noto Serif CJK SC" --engine lualatex paper.md

  # No argument: uses ./example.md, ./README.md or ./docs/example.md
  md2pdf

REQUIREMENTS:
  pandoc           https://pandoc.org/installing.html
  A LaTeX engine   TeX Live, MacTeX or MiKTeX (xelatex by default)

FONTS:
  Windows  SimSun
  macOS    PingFang SC
  Linux    first installed of: Noto Sans CJK SC, WenQuanYi Micro Hei,
           AR PL KaitiM GB, SimSun (fallback: AR PL KaitiM GB)
"#;

/// Convert Markdown to PDF through pandoc and LaTeX.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown to PDF through pandoc and LaTeX, with CJK font support",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    input: Option<PathBuf>,

    /// Output PDF path (default: input path with a .pdf extension).
    #[arg(short, long, env = "MD2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// CJK main font (default: chosen for this platform).
    #[arg(long, env = "MD2PDF_MAINFONT")]
    mainfont: Option<String>,

    /// Monospace font for code.
    #[arg(long, env = "MD2PDF_MONOFONT", default_value = DEFAULT_MONO_FONT)]
    monofont: String,

    /// PDF engine.
    #[arg(long, env = "MD2PDF_ENGINE", value_enum, default_value = "xelatex")]
    engine: EngineArg,

    /// Generate a table of contents.
    #[arg(long, env = "MD2PDF_TOC")]
    toc: bool,

    /// Enable DEBUG-level logs and pandoc --verbose.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Like --verbose, plus scratch paths and the generated template.
    #[arg(long, env = "MD2PDF_DEBUG")]
    debug: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,

    /// Do not open the PDF after conversion.
    #[arg(long, env = "MD2PDF_NO_OPEN")]
    no_open: bool,

    /// Print the conversion result as JSON.
    #[arg(long)]
    json: bool,

    /// pandoc executable.
    #[arg(long, env = "MD2PDF_PANDOC", default_value = "pandoc")]
    pandoc: String,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EngineArg {
    Xelatex,
    Pdflatex,
    Lualatex,
}

impl From<EngineArg> for Engine {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Xelatex => Engine::Xelatex,
            EngineArg::Pdflatex => Engine::Pdflatex,
            EngineArg::Lualatex => Engine::Lualatex,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match try_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", red("✘"));
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers INFO-level progress, so only warnings get through
    // while it is shown.
    let show_progress = !cli.quiet && !cli.json && !cli.verbose && !cli.debug;
    let filter = if cli.verbose || cli.debug {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
    if cli.debug {
        debug!("Debug mode enabled");
    }

    // ── Resolve input ────────────────────────────────────────────────────
    let input = match cli.input.clone() {
        Some(path) => path,
        None => match discover_default_input() {
            Some(path) => {
                info!("Using default input file: {}", path.display());
                path
            }
            None => match tokio::task::block_in_place(prompt_for_input)? {
                Some(path) => path,
                None => {
                    eprintln!("Cancelled.");
                    return Ok(ExitCode::SUCCESS);
                }
            },
        },
    };
    let input = std::path::absolute(&input)
        .with_context(|| format!("Failed to resolve {}", input.display()))?;
    let output = match &cli.output {
        Some(path) => std::path::absolute(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?,
        None => derive_output_path(&input),
    };
    debug!("Input: {}  Output: {}", input.display(), output.display());

    // ── Interrupt handling ───────────────────────────────────────────────
    // First Ctrl+C raises the cancel flag; the conversion stops at the next
    // stage boundary and its scratch directories are dropped on the way out.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
                eprintln!("\nInterrupted, cleaning up... (press Ctrl+C again to force)");
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(i32::from(EXIT_INTERRUPTED));
                }
            }
        });
    }

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(|| Arc::new(SpinnerProgress::new()));
    let config = build_config(&cli, Arc::clone(&cancel), spinner.clone())?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert_async(input, Some(output), config).await;
    if let Some(spinner) = &spinner {
        spinner.bar.finish_and_clear();
    }

    let output = match result {
        Ok(output) => output,
        Err(Md2PdfError::Interrupted) => {
            eprintln!("Operation interrupted");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
        Err(_) if cancel.load(Ordering::SeqCst) => {
            eprintln!("Operation interrupted");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Conversion failed")),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(ExitCode::SUCCESS);
    }

    if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&output.output_path.display().to_string()),
            dim(&format!(
                "{} · {} · {}ms",
                output.stats.engine, output.stats.main_font, output.stats.total_duration_ms
            )),
        );
    } else {
        println!("{}", output.output_path.display());
    }

    if !cli.no_open {
        open_in_viewer(&output.output_path, cli.quiet);
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    cancel: Arc<AtomicBool>,
    progress: Option<Arc<SpinnerProgress>>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .engine(cli.engine.clone().into())
        .mono_font(cli.monofont.clone())
        .toc(cli.toc)
        .verbose(cli.verbose)
        .debug(cli.debug)
        .pandoc_program(cli.pandoc.clone())
        .cancel_flag(cancel);

    if let Some(font) = &cli.mainfont {
        builder = builder.main_font(font.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}

/// First conventional Markdown file present in the working directory.
fn discover_default_input() -> Option<PathBuf> {
    DEFAULT_INPUTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Ask for a path on stdin. `None` on EOF or an empty answer.
fn prompt_for_input() -> Result<Option<PathBuf>> {
    eprintln!("No input file given; enter the path of a Markdown file:");
    eprint!("> ");
    io::stderr().flush().ok();

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let answer = line.trim();
    if read == 0 || answer.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(answer)))
}

/// Best effort; the PDF is already written, so failures are only reported.
fn open_in_viewer(path: &Path, quiet: bool) {
    let host = SystemHost;
    if !host.has_display() {
        if !quiet {
            eprintln!(
                "{}",
                dim("No graphical environment detected; open the PDF manually.")
            );
        }
        return;
    }
    match host.open_file(path) {
        Ok(()) => info!("Opened {}", path.display()),
        Err(e) => debug!("Could not open {}: {}", path.display(), e),
    }
}
