//! Result types returned by a successful conversion.

use crate::config::Engine;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A finished conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the PDF was written.
    pub output_path: PathBuf,
    pub stats: ConversionStats,
    /// pandoc's captured standard output.
    pub converter_stdout: String,
    /// pandoc's captured standard error (warnings on success).
    pub converter_stderr: String,
}

/// Facts about how the conversion ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionStats {
    /// CJK main font the template was built with.
    pub main_font: String,
    pub engine: Engine,
    /// false when pre-processing failed and the original source was used.
    pub preprocessed: bool,
    pub toc: bool,
    pub total_duration_ms: u64,
    /// Time spent inside pandoc and the LaTeX engine.
    pub converter_duration_ms: u64,
}
