//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The external collaborators (the host
//! platform and the pandoc process) are part of the config as optional trait
//! objects, so tests and embedders can swap them without touching the
//! pipeline.

use crate::error::Md2PdfError;
use crate::host::HostEnvironment;
use crate::progress::ProgressCallback;
use crate::runner::ExternalConverter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Monospace font bound to pandoc's `monofont` variable by default.
pub const DEFAULT_MONO_FONT: &str = "DejaVu Sans Mono";

/// Default external converter program.
pub const DEFAULT_PANDOC_PROGRAM: &str = "pandoc";

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2pdf::{ConversionConfig, Engine};
///
/// let config = ConversionConfig::builder()
///     .engine(Engine::Lualatex)
///     .main_font("Noto Sans CJK SC")
///     .toc(true)
///     .build()
///     .unwrap();
/// assert!(config.toc);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// CJK main font. If None, resolved from the host platform.
    pub main_font: Option<String>,

    /// Monospace font for code. Default: `DejaVu Sans Mono`.
    pub mono_font: String,

    /// LaTeX engine pandoc drives. Default: [`Engine::Xelatex`].
    pub engine: Engine,

    /// Emit a table of contents. Default: false.
    pub toc: bool,

    /// Pass `--verbose` to pandoc and log its output. Default: false.
    pub verbose: bool,

    /// Like `verbose`, plus scratch paths and the assembled template are logged.
    pub debug: bool,

    /// Converter executable name or path. Default: `pandoc`.
    pub pandoc_program: String,

    /// Parent directory for scratch directories. If None, the system temp dir.
    pub scratch_root: Option<PathBuf>,

    /// Host platform services. If None, [`crate::host::SystemHost`].
    pub host: Option<Arc<dyn HostEnvironment>>,

    /// Pre-constructed converter. If None, a [`crate::runner::SystemConverter`]
    /// running `pandoc_program`.
    pub converter: Option<Arc<dyn ExternalConverter>>,

    /// Raised by the caller to abort the conversion at the next stage boundary.
    pub cancel_flag: Option<Arc<AtomicBool>>,

    /// Stage-event receiver for progress display.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            main_font: None,
            mono_font: DEFAULT_MONO_FONT.to_string(),
            engine: Engine::default(),
            toc: false,
            verbose: false,
            debug: false,
            pandoc_program: DEFAULT_PANDOC_PROGRAM.to_string(),
            scratch_root: None,
            host: None,
            converter: None,
            cancel_flag: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("main_font", &self.main_font)
            .field("mono_font", &self.mono_font)
            .field("engine", &self.engine)
            .field("toc", &self.toc)
            .field("verbose", &self.verbose)
            .field("debug", &self.debug)
            .field("pandoc_program", &self.pandoc_program)
            .field("scratch_root", &self.scratch_root)
            .field("host", &self.host.as_ref().map(|_| "<dyn HostEnvironment>"))
            .field("converter", &self.converter.as_ref().map(|_| "<dyn ExternalConverter>"))
            .field("cancel_flag", &self.cancel_flag.is_some())
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether pandoc should run with `--verbose`.
    pub fn is_verbose(&self) -> bool {
        self.verbose || self.debug
    }

    /// Whether the caller has asked us to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn main_font(mut self, font: impl Into<String>) -> Self {
        self.config.main_font = Some(font.into());
        self
    }

    pub fn mono_font(mut self, font: impl Into<String>) -> Self {
        self.config.mono_font = font.into();
        self
    }

    pub fn engine(mut self, engine: Engine) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn toc(mut self, v: bool) -> Self {
        self.config.toc = v;
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.config.verbose = v;
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.config.debug = v;
        self
    }

    pub fn pandoc_program(mut self, program: impl Into<String>) -> Self {
        self.config.pandoc_program = program.into();
        self
    }

    pub fn scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_root = Some(dir.into());
        self
    }

    pub fn host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.config.host = Some(host);
        self
    }

    pub fn converter(mut self, converter: Arc<dyn ExternalConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel_flag = Some(flag);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if c.main_font.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(Md2PdfError::InvalidConfig("main font must not be empty".into()));
        }
        if c.mono_font.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig("mono font must not be empty".into()));
        }
        if c.pandoc_program.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig(
                "pandoc program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// LaTeX engine pandoc hands the generated `.tex` to.
///
/// The template loads `fontspec`/`xeCJK`, so only the Unicode engines
/// (`xelatex`, `lualatex`) typeset CJK text; `pdflatex` is accepted for
/// plain-Latin documents with a compatible template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Xelatex,
    Pdflatex,
    Lualatex,
}

impl Engine {
    /// Program name probed on `PATH` and passed to `--pdf-engine`.
    pub fn program(self) -> &'static str {
        match self {
            Engine::Xelatex => "xelatex",
            Engine::Pdflatex => "pdflatex",
            Engine::Lualatex => "lualatex",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for Engine {
    type Err = Md2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xelatex" => Ok(Engine::Xelatex),
            "pdflatex" => Ok(Engine::Pdflatex),
            "lualatex" => Ok(Engine::Lualatex),
            other => Err(Md2PdfError::InvalidConfig(format!(
                "unknown PDF engine '{other}' (expected xelatex, pdflatex or lualatex)"
            ))),
        }
    }
}
