//! # md2pdf
//!
//! Convert Markdown documents to PDF through pandoc and a LaTeX engine, with
//! CJK fonts picked for the host platform.
//!
//! There is no rendering engine in this crate. It prepares what pandoc needs
//! and interprets what comes back:
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Check     pandoc + LaTeX engine on PATH, source exists
//!  ├─ 2. Font      platform default or first installed CJK family
//!  ├─ 3. Rewrite   inline `code` → escaped \texttt{} (scratch copy)
//!  ├─ 4. Template  CJK-aware LaTeX template (scratch file)
//!  ├─ 5. pandoc    --pdf-engine xelatex --template … (child process)
//!  └─ 6. Output    PDF path, or LaTeX diagnostics on failure
//! ```
//!
//! Both scratch directories are removed before the call returns, whatever
//! the outcome.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().toc(true).build()?;
//!     let output = convert("notes.md", &config)?;
//!     println!("wrote {}", output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod fonts;
pub mod host;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod runner;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, Engine};
pub use convert::{convert, convert_async, convert_to_file, derive_output_path};
pub use error::{Md2PdfError, PreprocessError};
pub use fonts::resolve_cjk_font;
pub use host::{HostEnvironment, Platform, SystemHost};
pub use output::{ConversionOutput, ConversionStats};
pub use progress::{ConversionProgressCallback, ProgressCallback, Stage};
pub use runner::{ConverterOutput, ExternalConverter, SystemConverter};
