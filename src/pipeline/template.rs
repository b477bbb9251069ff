//! LaTeX template assembly for pandoc.
//!
//! pandoc's built-in LaTeX template knows nothing about CJK fonts, so each
//! conversion writes its own. The template is a pandoc template (`$body$`,
//! `$if(toc)$`, ...) wrapped around a fixed preamble: A4 article with a
//! 2.5cm margin, `xeCJK` bound to the resolved font for the main, sans and
//! mono roles, coloured hyperlinks, numbered `listings` code, a `fancyhdr`
//! header/footer, and an image clamp that scales oversized graphics down to
//! the text block while keeping their aspect ratio.
//!
//! Interpolated values are escaped twice over: LaTeX specials where the
//! value is typeset text (the title), and `$` → `$$` everywhere, since a bare
//! `$` opens a pandoc template directive.

use crate::error::Md2PdfError;
use crate::pipeline::scratch_dir;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// File name of the template inside its scratch directory.
pub const TEMPLATE_FILE_NAME: &str = "template.tex";

const PREAMBLE: &str = r#"\documentclass[12pt, a4paper]{article}
\usepackage{fontspec}
\usepackage{xeCJK}
\usepackage{geometry}
\usepackage{hyperref}
\usepackage{listings}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage{graphicx}
\usepackage{float}
\usepackage{grffile}
\usepackage{fancyhdr}
\usepackage{color}
\usepackage{xcolor}
\usepackage{booktabs}
\usepackage[normalem]{ulem}
\usepackage{enumerate}
\usepackage{longtable}
\usepackage{array}
\usepackage{multirow}
\usepackage{makecell}
\usepackage{footnote}
\usepackage{caption}
\usepackage{subcaption}
\usepackage{tikz}
\usepackage{enumitem}
\usepackage{url}
\usepackage{soul}
\usepackage{fvextra}
\usepackage{upquote}
\usepackage{microtype}
\usepackage{needspace}
\usepackage{fancyvrb}

\graphicspath{{@GRAPHICS_PATH@}}

\setCJKmainfont{@MAIN_FONT@}
\setCJKsansfont{@MAIN_FONT@}
\setCJKmonofont{@MAIN_FONT@}
\CJKspace

\geometry{margin=2.5cm}

\lstset{
    basicstyle=\ttfamily\small,
    breaklines=true,
    frame=single,
    numbers=left,
    numberstyle=\tiny\color{gray},
    keywordstyle=\color{blue},
    commentstyle=\color{green!50!black},
    stringstyle=\color{red}
}

\hypersetup{
    colorlinks=true,
    linkcolor=blue,
    filecolor=magenta,
    urlcolor=cyan
}

\pagestyle{fancy}
\fancyhf{}
\lhead{\leftmark}
\rhead{\thepage}
\cfoot{\thepage}

% pandoc emits \tightlist in compact lists
\providecommand{\tightlist}{\setlength{\itemsep}{0pt}\setlength{\parskip}{0pt}}

\DeclareGraphicsExtensions{.pdf,.png,.jpg,.jpeg}
\makeatletter
\def\maxwidth{\ifdim\Gin@nat@width>\linewidth\linewidth\else\Gin@nat@width\fi}
\def\maxheight{\ifdim\Gin@nat@height>\textheight\textheight\else\Gin@nat@height\fi}
\makeatother
\setkeys{Gin}{width=\maxwidth,height=\maxheight,keepaspectratio}
"#;

/// The pandoc directive block that emits a table of contents.
pub const TOC_BLOCK: &str = "$if(toc)$\n\\tableofcontents\n\\newpage\n$endif$\n";

/// Inputs for one template.
#[derive(Debug, Clone)]
pub struct TemplateOptions {
    /// CJK font for the main, sans and mono roles.
    pub main_font: String,
    /// Absolute directory relative image references resolve against.
    pub resource_root: PathBuf,
    /// Further directories appended to pandoc's resource path, in order.
    pub extra_resource_dirs: Vec<PathBuf>,
    /// Separator for the resource path string.
    pub path_separator: char,
    /// Document title; emitted only when the document sets `title`.
    pub title: Option<String>,
    /// Whether to include the table-of-contents block.
    pub toc: bool,
}

impl TemplateOptions {
    /// pandoc `--resource-path` value: the resource root, the extra
    /// directories, then the working directory.
    pub fn resource_path(&self) -> String {
        let sep = self.path_separator.to_string();
        std::iter::once(self.resource_root.as_path())
            .chain(self.extra_resource_dirs.iter().map(PathBuf::as_path))
            .map(|p| p.display().to_string())
            .chain(std::iter::once(".".to_string()))
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

/// A written template in an exclusively owned scratch directory.
#[derive(Debug)]
pub struct TemplateArtifact {
    dir: TempDir,
    path: PathBuf,
    font: String,
    resource_path: String,
}

impl TemplateArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Font the template was built for.
    pub fn font(&self) -> &str {
        &self.font
    }

    /// Resource search string matching the template's graphics path.
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Remove the scratch directory now, reporting any failure.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Assemble the full template text.
pub fn render_template(opts: &TemplateOptions) -> String {
    let graphics_path = format!("{}/", to_tex_path(&opts.resource_root));
    let mut tex = PREAMBLE
        .replace("@GRAPHICS_PATH@", &escape_template(&graphics_path))
        .replace("@MAIN_FONT@", &escape_template(&opts.main_font));

    tex.push_str("\n\\begin{document}\n");
    if let Some(title) = &opts.title {
        tex.push_str("$if(title)$\n\\title{");
        tex.push_str(&escape_template(&escape_latex_text(title)));
        tex.push_str("}\n\\maketitle\n$endif$\n");
    }
    if opts.toc {
        tex.push_str(TOC_BLOCK);
    }
    tex.push_str("$body$\n\\end{document}\n");
    tex
}

/// Write the template into a fresh scratch directory.
///
/// Failure here is fatal for the conversion: pandoc cannot run without it.
pub fn write_template(
    opts: &TemplateOptions,
    scratch_root: Option<&Path>,
) -> Result<TemplateArtifact, Md2PdfError> {
    let dir = scratch_dir(scratch_root).map_err(Md2PdfError::ScratchCreateFailed)?;
    let path = dir.path().join(TEMPLATE_FILE_NAME);
    let tex = render_template(opts);

    std::fs::write(&path, &tex).map_err(|e| Md2PdfError::TemplateWriteFailed {
        path: path.clone(),
        source: e,
    })?;
    debug!("Wrote template ({} bytes): {}", tex.len(), path.display());

    Ok(TemplateArtifact {
        dir,
        path,
        font: opts.main_font.clone(),
        resource_path: opts.resource_path(),
    })
}

/// LaTeX wants forward slashes in `\graphicspath`, even on Windows.
fn to_tex_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Double every `$` so pandoc's template engine reads it as a literal.
fn escape_template(value: &str) -> String {
    value.replace('$', "$$")
}

/// Escape text so LaTeX typesets it verbatim.
pub fn escape_latex_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '{' | '}' | '$' | '&' | '#' | '_' | '%' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(toc: bool, title: Option<&str>) -> TemplateOptions {
        TemplateOptions {
            main_font: "Noto Sans CJK SC".into(),
            resource_root: PathBuf::from("/docs/guide"),
            extra_resource_dirs: vec![PathBuf::from("/tmp/md2pdf-abc")],
            path_separator: ':',
            title: title.map(String::from),
            toc,
        }
    }

    #[test]
    fn toc_block_only_when_requested() {
        let with = render_template(&opts(true, None));
        let without = render_template(&opts(false, None));
        assert!(with.contains(TOC_BLOCK));
        assert!(with.contains("\\tableofcontents"));
        assert!(!without.contains("\\tableofcontents"));
        assert!(!without.contains("$if(toc)$"));
    }

    #[test]
    fn title_block_is_conditional_and_escaped() {
        let tex = render_template(&opts(false, Some("my_notes #1.md")));
        assert!(tex.contains("$if(title)$\n\\title{my\\_notes \\#1.md}\n\\maketitle\n$endif$"));
        assert!(!render_template(&opts(false, None)).contains("\\maketitle"));
    }

    #[test]
    fn font_bound_to_all_cjk_roles() {
        let tex = render_template(&opts(false, None));
        for role in ["main", "sans", "mono"] {
            assert!(tex.contains(&format!("\\setCJK{role}font{{Noto Sans CJK SC}}")));
        }
    }

    #[test]
    fn layout_directives_present() {
        let tex = render_template(&opts(false, None));
        assert!(tex.contains("\\graphicspath{{/docs/guide/}}"));
        assert!(tex.contains("\\geometry{margin=2.5cm}"));
        assert!(tex.contains("\\hypersetup{"));
        assert!(tex.contains("numbers=left"));
        assert!(tex.contains("keywordstyle=\\color{blue}"));
        assert!(tex.contains("\\pagestyle{fancy}"));
        assert!(tex.contains("\\setkeys{Gin}{width=\\maxwidth,height=\\maxheight,keepaspectratio}"));
        assert!(tex.contains("$body$"));
        assert!(tex.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn dollar_signs_are_doubled() {
        let mut o = opts(false, Some("cost $5"));
        o.resource_root = PathBuf::from("/home/u/$work");
        let tex = render_template(&o);
        assert!(tex.contains("\\graphicspath{{/home/u/$$work/}}"));
        assert!(tex.contains("\\title{cost \\$$5}"));
    }

    #[test]
    fn windows_paths_use_forward_slashes() {
        assert_eq!(to_tex_path(Path::new(r"C:\docs\img")), "C:/docs/img");
    }

    #[test]
    fn resource_path_joins_with_separator() {
        assert_eq!(opts(false, None).resource_path(), "/docs/guide:/tmp/md2pdf-abc:.");
        let mut o = opts(false, None);
        o.path_separator = ';';
        o.extra_resource_dirs.clear();
        assert_eq!(o.resource_path(), "/docs/guide;.");
    }

    #[test]
    fn escape_latex_text_handles_every_special() {
        assert_eq!(
            escape_latex_text(r"a\b~c^d{e}$&#_%"),
            r"a\textbackslash{}b\textasciitilde{}c\textasciicircum{}d\{e\}\$\&\#\_\%"
        );
    }

    #[test]
    fn write_template_creates_and_removes_scratch() {
        let root = tempfile::tempdir().unwrap();
        let artifact = write_template(&opts(true, None), Some(root.path())).unwrap();
        assert_eq!(artifact.path().file_name().unwrap(), TEMPLATE_FILE_NAME);
        assert_eq!(artifact.font(), "Noto Sans CJK SC");
        assert_eq!(artifact.resource_path(), "/docs/guide:/tmp/md2pdf-abc:.");
        let written = std::fs::read_to_string(artifact.path()).unwrap();
        assert!(written.contains("\\tableofcontents"));

        let dir = artifact.dir().to_path_buf();
        artifact.close().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn write_template_fails_fatally_on_bad_root() {
        let err = write_template(&opts(false, None), Some(Path::new("/nonexistent/scratch/root")))
            .unwrap_err();
        assert!(matches!(err, Md2PdfError::ScratchCreateFailed(_)));
    }
}
