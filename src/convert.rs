//! Conversion entry points: the orchestrator.
//!
//! A conversion runs strictly in sequence:
//!
//! ```text
//! check pandoc + engine ──▶ check source ──▶ resolve font
//!   ──▶ preprocess (best effort) ──▶ write template ──▶ run pandoc
//!   ──▶ interpret exit status
//! ```
//!
//! Nothing touches the filesystem until the three checks pass. The two
//! scratch directories are owned by [`PreprocessedDocument`] and
//! [`TemplateArtifact`]; they are closed explicitly once pandoc returns and
//! dropped (and therefore removed) on every early-return or panic path.

use crate::config::{ConversionConfig, Engine};
use crate::error::Md2PdfError;
use crate::fonts;
use crate::host::{HostEnvironment, Platform, SystemHost};
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::diagnostics;
use crate::pipeline::invocation::PandocInvocation;
use crate::pipeline::preprocess::{self, PreprocessedDocument};
use crate::pipeline::template::{self, TemplateArtifact, TemplateOptions};
use crate::progress::{ConversionProgressCallback, NoopProgressCallback, Stage};
use crate::runner::{display_command, ExternalConverter, SystemConverter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extension of the derived destination file.
pub const OUTPUT_EXTENSION: &str = "pdf";

/// Convert a Markdown file to a PDF next to it.
///
/// The destination is [`derive_output_path`]`(source)`.
///
/// # Errors
/// Every failure is fatal for this call and no PDF is produced:
/// - pandoc or the LaTeX engine not installed
/// - source file missing
/// - template could not be written
/// - pandoc exited unsuccessfully (LaTeX lines in
///   [`Md2PdfError::latex_errors`])
/// - the cancel flag was raised
pub fn convert(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    run_conversion(source.as_ref(), None, config)
}

/// Convert a Markdown file to a PDF at `output`.
pub fn convert_to_file(
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    run_conversion(source.as_ref(), Some(output.as_ref()), config)
}

/// Async wrapper around [`convert_to_file`] / [`convert`].
///
/// The conversion blocks on a child process, so it runs on tokio's blocking
/// pool. A panic inside the conversion surfaces as [`Md2PdfError::Internal`];
/// the scratch directories are still removed as the stack unwinds.
pub async fn convert_async(
    source: impl Into<PathBuf>,
    output: Option<PathBuf>,
    config: ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    let source = source.into();
    tokio::task::spawn_blocking(move || run_conversion(&source, output.as_deref(), &config))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("Conversion task panicked: {e}")))?
}

/// Default destination: same directory and base name, `.pdf` extension.
pub fn derive_output_path(source: &Path) -> PathBuf {
    source.with_extension(OUTPUT_EXTENSION)
}

/// Install guidance for a missing LaTeX engine.
pub fn engine_install_hint(platform: Platform) -> String {
    match platform {
        Platform::Linux => {
            "On Ubuntu/Debian run: sudo apt install texlive-xetex texlive-fonts-recommended".into()
        }
        Platform::MacOs => "On macOS install MacTeX: https://tug.org/mactex/".into(),
        Platform::Windows | Platform::Other => {
            "On Windows install MiKTeX: https://miktex.org/download".into()
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run_conversion(
    source: &Path,
    output: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    let host: Arc<dyn HostEnvironment> = config
        .host
        .clone()
        .unwrap_or_else(|| Arc::new(SystemHost));
    let converter: Arc<dyn ExternalConverter> = config
        .converter
        .clone()
        .unwrap_or_else(|| Arc::new(SystemConverter::new(config.pandoc_program.clone())));
    let progress: Arc<dyn ConversionProgressCallback> = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));

    // ── Step 1: External dependencies ────────────────────────────────────
    check_dependencies(host.as_ref(), converter.program(), config.engine)?;

    // ── Step 2: Source ───────────────────────────────────────────────────
    if !source.is_file() {
        return Err(Md2PdfError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derive_output_path(source));

    info!("Starting conversion: {} -> {}", source.display(), output_path.display());
    progress.on_conversion_start(source);

    let result = execute(
        source,
        output_path,
        config,
        host.as_ref(),
        converter.as_ref(),
        progress.as_ref(),
    );
    match &result {
        Ok(out) => progress.on_conversion_complete(&out.output_path),
        Err(e) => progress.on_conversion_failed(&e.to_string()),
    }
    result
}

fn check_dependencies(
    host: &dyn HostEnvironment,
    program: &str,
    engine: Engine,
) -> Result<(), Md2PdfError> {
    if !host.is_program_available(program) {
        return Err(Md2PdfError::ConverterNotFound {
            program: program.to_string(),
        });
    }
    if !host.is_program_available(engine.program()) {
        return Err(Md2PdfError::EngineNotFound {
            engine: engine.program().to_string(),
            hint: engine_install_hint(host.platform()),
        });
    }
    Ok(())
}

fn execute(
    source: &Path,
    output_path: PathBuf,
    config: &ConversionConfig,
    host: &dyn HostEnvironment,
    converter: &dyn ExternalConverter,
    progress: &dyn ConversionProgressCallback,
) -> Result<ConversionOutput, Md2PdfError> {
    let total_start = Instant::now();
    let scratch_root = config.scratch_root.as_deref();

    // ── Step 3: Font ─────────────────────────────────────────────────────
    let main_font = match &config.main_font {
        Some(font) => font.clone(),
        None => fonts::resolve_cjk_font(host),
    };
    debug!("Using CJK main font: {}", main_font);

    // ── Step 4: Preprocess (best effort) ─────────────────────────────────
    ensure_not_cancelled(config)?;
    progress.on_stage(Stage::Preprocess);
    let preprocessed = match preprocess::preprocess(source, scratch_root) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!("Preprocessing failed, using the original file: {}", e);
            None
        }
    };
    let input_path = preprocessed
        .as_ref()
        .map(|doc| doc.path().to_path_buf())
        .unwrap_or_else(|| source.to_path_buf());
    if config.debug {
        debug!("pandoc input: {}", input_path.display());
    }

    // ── Step 5: Template ─────────────────────────────────────────────────
    ensure_not_cancelled(config)?;
    progress.on_stage(Stage::Template);
    let options = TemplateOptions {
        main_font,
        resource_root: source_dir(source),
        extra_resource_dirs: preprocessed
            .iter()
            .map(|doc| doc.dir().to_path_buf())
            .collect(),
        path_separator: host.path_separator(),
        title: source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        toc: config.toc,
    };
    let template = template::write_template(&options, scratch_root)?;
    if config.debug {
        debug!(
            "Template {}:\n{}",
            template.path().display(),
            template::render_template(&options)
        );
    }

    // ── Step 6: pandoc ───────────────────────────────────────────────────
    ensure_not_cancelled(config)?;
    progress.on_stage(Stage::Typeset);
    let invocation = PandocInvocation {
        input: input_path,
        output: output_path.clone(),
        engine: config.engine,
        template: template.path().to_path_buf(),
        main_font: template.font().to_string(),
        mono_font: config.mono_font.clone(),
        resource_path: template.resource_path().to_string(),
        toc: config.toc,
        verbose: config.is_verbose(),
    };
    let args = invocation.to_args();
    info!("Running: {}", display_command(converter.program(), &args));

    let converter_start = Instant::now();
    let run = converter.run(&args);
    let converter_duration_ms = converter_start.elapsed().as_millis() as u64;

    let main_font = template.font().to_string();
    let preprocessed_ok = preprocessed.is_some();
    close_scratch(template, preprocessed);

    let run = run.map_err(|e| Md2PdfError::ConverterSpawnFailed {
        program: converter.program().to_string(),
        source: e,
    })?;

    // ── Step 7: Interpret ────────────────────────────────────────────────
    if config.is_cancelled() {
        return Err(Md2PdfError::Interrupted);
    }
    if config.is_verbose() {
        debug!("pandoc stdout: {}", run.stdout.trim_end());
        if !run.stderr.is_empty() {
            debug!("pandoc stderr: {}", run.stderr.trim_end());
        }
    }
    if !run.success() {
        warn!("pandoc failed: {}", run.stderr.trim_end());
        let latex_errors = diagnostics::extract_latex_errors(&run.stderr);
        let hint = diagnostics::remediation_hint(&run.stderr);
        return Err(Md2PdfError::ConverterFailed {
            status: run.status,
            stderr: run.stderr,
            latex_errors,
            hint,
        });
    }

    let stats = ConversionStats {
        main_font,
        engine: config.engine,
        preprocessed: preprocessed_ok,
        toc: config.toc,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        converter_duration_ms,
    };
    info!(
        "PDF generated: {} ({}ms)",
        output_path.display(),
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        output_path,
        stats,
        converter_stdout: run.stdout,
        converter_stderr: run.stderr,
    })
}

fn ensure_not_cancelled(config: &ConversionConfig) -> Result<(), Md2PdfError> {
    if config.is_cancelled() {
        return Err(Md2PdfError::Interrupted);
    }
    Ok(())
}

/// Absolute directory containing `source`.
fn source_dir(source: &Path) -> PathBuf {
    let absolute = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
    absolute
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Remove both scratch directories, logging rather than failing.
fn close_scratch(template: TemplateArtifact, preprocessed: Option<PreprocessedDocument>) {
    if let Err(e) = template.close() {
        warn!("Failed to remove template scratch directory: {}", e);
    }
    if let Some(doc) = preprocessed {
        if let Err(e) = doc.close() {
            warn!("Failed to remove preprocessing scratch directory: {}", e);
        }
    }
}
