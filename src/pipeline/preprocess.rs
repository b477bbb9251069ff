//! Pre-processing: rewrite inline code spans into literal LaTeX.
//!
//! pandoc's own handling of `` `code` `` inside the CJK template loses
//! characters that LaTeX treats as control syntax. Each inline span is
//! therefore replaced with a raw `\texttt{...}` whose contents have the
//! three brace/backslash specials escaped, in this order:
//!
//! 1. `\` → `\\`
//! 2. `{` → `\{`
//! 3. `}` → `\}`
//!
//! Backslashes go first so the ones introduced by the brace rules are not
//! doubled. Fenced code blocks are copied through untouched.
//!
//! The rewritten copy lives in its own scratch directory, owned by the
//! returned [`PreprocessedDocument`] and removed when it is dropped.

use crate::error::PreprocessError;
use crate::pipeline::scratch_dir;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// A rewritten copy of the source Markdown in an exclusively owned scratch dir.
#[derive(Debug)]
pub struct PreprocessedDocument {
    dir: TempDir,
    path: PathBuf,
}

impl PreprocessedDocument {
    /// Path of the rewritten Markdown file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The scratch directory holding it.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the scratch directory now, reporting any failure.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Write a rewritten copy of `source` into a fresh scratch directory.
///
/// The copy keeps the source's file name. Any failure is recoverable: the
/// caller should carry on with the original file.
pub fn preprocess(
    source: &Path,
    scratch_root: Option<&Path>,
) -> Result<PreprocessedDocument, PreprocessError> {
    let content = std::fs::read_to_string(source).map_err(|e| PreprocessError::ReadFailed {
        path: source.to_path_buf(),
        source: e,
    })?;

    let rewritten = rewrite_inline_code(&content);

    let dir = scratch_dir(scratch_root).map_err(PreprocessError::ScratchCreateFailed)?;
    let file_name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "input.md".into());
    let path = dir.path().join(file_name);

    std::fs::write(&path, rewritten).map_err(|e| PreprocessError::WriteFailed {
        path: path.clone(),
        source: e,
    })?;

    debug!("Preprocessed Markdown: {} -> {}", source.display(), path.display());
    Ok(PreprocessedDocument { dir, path })
}

/// Rewrite every inline code span outside fenced blocks into `\texttt{...}`.
pub fn rewrite_inline_code(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + content.len() / 8);
    let mut prose = String::new();
    let mut fence: Option<Fence> = None;

    for line in content.split_inclusive('\n') {
        match fence {
            Some(open) => {
                out.push_str(line);
                if open.is_closed_by(line) {
                    fence = None;
                }
            }
            None => {
                if let Some(open) = Fence::opening(line) {
                    flush_prose(&mut prose, &mut out);
                    out.push_str(line);
                    fence = Some(open);
                } else {
                    prose.push_str(line);
                }
            }
        }
    }
    flush_prose(&mut prose, &mut out);
    out
}

/// Escape the LaTeX specials in a code span, backslash first.
pub fn escape_code(code: &str) -> String {
    code.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
}

fn flush_prose(prose: &mut String, out: &mut String) {
    if prose.is_empty() {
        return;
    }
    let replaced = RE_INLINE_CODE.replace_all(prose, |caps: &Captures| {
        format!("\\texttt{{{}}}", escape_code(&caps[1]))
    });
    out.push_str(&replaced);
    prose.clear();
}

/// An open fenced code block: marker character and run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn opening(line: &str) -> Option<Fence> {
        let rest = strip_indent(line);
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        // A backtick fence's info string may not contain backticks.
        if marker == '`' && rest[len..].contains('`') {
            return None;
        }
        Some(Fence { marker, len })
    }

    fn is_closed_by(self, line: &str) -> bool {
        let rest = strip_indent(line);
        let len = rest.chars().take_while(|c| *c == self.marker).count();
        len >= self.len && rest[len..].trim().is_empty()
    }
}

/// Drop any leading indentation. Fences nested in list items are indented
/// by the item's content offset, which can be four columns or more.
fn strip_indent(line: &str) -> &str {
    line.trim_start_matches([' ', '\t'])
}
