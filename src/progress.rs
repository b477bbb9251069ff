//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to be told
//! when each pipeline stage begins. The CLI uses it to drive a spinner; the
//! library knows nothing about how events are displayed.
//!
//! # Example
//!
//! ```rust
//! use md2pdf::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     stages: Mutex<Vec<Stage>>,
//! }
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_stage(&self, stage: Stage) {
//!         self.stages.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Recorder::default()))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Pipeline stages reported through [`ConversionProgressCallback::on_stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Rewriting inline code spans into a scratch copy.
    Preprocess,
    /// Writing the LaTeX template.
    Template,
    /// pandoc and the LaTeX engine are running.
    Typeset,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Preprocess => "Preprocessing Markdown",
            Stage::Template => "Writing template",
            Stage::Typeset => "Typesetting",
        })
    }
}

/// Called by the conversion pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after the dependency and input checks pass.
    fn on_conversion_start(&self, source: &Path) {
        let _ = source;
    }

    /// Called when `stage` begins.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the PDF has been written.
    fn on_conversion_complete(&self, output: &Path) {
        let _ = output;
    }

    /// Called when a conversion that had started fails.
    fn on_conversion_failed(&self, error: &str) {
        let _ = error;
    }
}

/// Convenience alias for the trait object stored in the config.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// A no-op callback; the pipeline uses it when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}
