//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one step. Only the first two touch the
//! filesystem, and each of those owns its own scratch directory.
//!
//! ## Data Flow
//!
//! ```text
//! preprocess ──▶ template ──▶ invocation ──▶ (pandoc) ──▶ diagnostics
//! (scratch .md)  (scratch .tex)  (argv)                    (on failure)
//! ```
//!
//! 1. [`preprocess`] : rewrite inline code spans into escaped `\texttt{}`
//! 2. [`template`]   : assemble the LaTeX template for the resolved font
//! 3. [`invocation`] : build the pandoc argument list
//! 4. [`diagnostics`]: pull LaTeX error lines out of a failed run's stderr

pub mod diagnostics;
pub mod invocation;
pub mod preprocess;
pub mod template;

use std::path::Path;
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = "md2pdf-";

/// Create a fresh, exclusively owned scratch directory.
///
/// Every call gets a distinct directory, so concurrent conversions never
/// share scratch paths.
pub(crate) fn scratch_dir(root: Option<&Path>) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    match root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
}
