//! Error types for the md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`]: **Fatal**: the conversion cannot produce a PDF
//!   (pandoc missing, source missing, template unwritable, pandoc failed).
//!   Returned as `Err(Md2PdfError)` from the top-level `convert*` functions.
//!
//! * [`PreprocessError`]: **Recoverable**: the inline-code rewrite could not
//!   be performed. The orchestrator logs it and hands pandoc the original,
//!   unmodified source instead.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Dependency errors ─────────────────────────────────────────────────
    /// The external document converter is not on `PATH`.
    #[error("'{program}' was not found on PATH.\nInstallation guide: https://pandoc.org/installing.html")]
    ConverterNotFound { program: String },

    /// The selected LaTeX engine is not on `PATH`.
    #[error("PDF engine '{engine}' was not found on PATH; install a LaTeX distribution.\n{hint}")]
    EngineNotFound { engine: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Source Markdown file does not exist.
    #[error("Input file not found: '{path}'")]
    SourceNotFound { path: PathBuf },

    // ── Scratch / template errors ─────────────────────────────────────────
    /// A scratch directory could not be created.
    #[error("Failed to create scratch directory: {0}")]
    ScratchCreateFailed(#[source] std::io::Error),

    /// The LaTeX template could not be written; pandoc cannot run without it.
    #[error("Failed to write template file '{path}': {source}")]
    TemplateWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── External process errors ───────────────────────────────────────────
    /// The converter process could not be started at all.
    #[error("Failed to launch '{program}': {source}")]
    ConverterSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran and exited unsuccessfully.
    ///
    /// `latex_errors` holds the LaTeX-level lines pulled out of `stderr`
    /// (see [`crate::pipeline::diagnostics`]); they are listed separately in
    /// the `Display` output.
    #[error("{}", format_converter_failure(*status, latex_errors, hint.as_deref()))]
    ConverterFailed {
        status: Option<i32>,
        stderr: String,
        latex_errors: Vec<String>,
        hint: Option<String>,
    },

    /// The caller raised the cancel flag (e.g. Ctrl+C) mid-conversion.
    #[error("Conversion interrupted")]
    Interrupted,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// LaTeX diagnostics captured from a failed converter run, if any.
    pub fn latex_errors(&self) -> &[String] {
        match self {
            Md2PdfError::ConverterFailed { latex_errors, .. } => latex_errors,
            _ => &[],
        }
    }
}

fn format_converter_failure(status: Option<i32>, latex_errors: &[String], hint: Option<&str>) -> String {
    let mut msg = match status {
        Some(code) => format!("pandoc conversion failed with exit status {code}"),
        None => "pandoc conversion was terminated by a signal".to_string(),
    };
    if !latex_errors.is_empty() {
        msg.push_str("\nLaTeX errors:");
        for line in latex_errors {
            msg.push_str("\n  ");
            msg.push_str(line);
        }
    }
    if let Some(hint) = hint {
        msg.push_str("\nPossible fix: ");
        msg.push_str(hint);
    }
    msg
}

/// A non-fatal pre-processing failure.
///
/// Never returned from the public `convert*` functions; the orchestrator
/// degrades to the unmodified source when it sees one.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Source could not be read (missing, unreadable, or not UTF-8).
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scratch directory could not be created.
    #[error("Failed to create scratch directory: {0}")]
    ScratchCreateFailed(#[source] std::io::Error),

    /// Rewritten Markdown could not be written to the scratch directory.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
