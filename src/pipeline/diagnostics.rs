//! LaTeX diagnostics in a failed pandoc run.
//!
//! When the LaTeX engine fails, pandoc forwards the engine log on stderr.
//! The useful lines are TeX's own error lines, which start with `!`, and
//! any line mentioning an undefined control sequence.

const UNDEFINED_CONTROL_SEQUENCE: &str = "Undefined control sequence";

/// Trimmed LaTeX error lines from `stderr`, in order of appearance.
pub fn extract_latex_errors(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter(|line| line.starts_with('!') || line.contains(UNDEFINED_CONTROL_SEQUENCE))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// A remediation hint for well-known failures.
pub fn remediation_hint(stderr: &str) -> Option<String> {
    if stderr.contains(UNDEFINED_CONTROL_SEQUENCE) {
        return Some(
            "a LaTeX command is undefined; check whether an additional LaTeX package needs to be installed"
                .to_string(),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "Error producing PDF.\n\
                       ! Undefined control sequence.\n\
                       l.42 \\foo\n\
                       \n\
                       ! LaTeX Error: File `xeCJK.sty' not found.\n\
                       see log: Undefined control sequence in line 7  \n";

    #[test]
    fn picks_bang_lines_and_undefined_sequences() {
        assert_eq!(
            extract_latex_errors(LOG),
            vec![
                "! Undefined control sequence.",
                "! LaTeX Error: File `xeCJK.sty' not found.",
                "see log: Undefined control sequence in line 7",
            ]
        );
    }

    #[test]
    fn indented_bang_is_not_an_error_line() {
        assert!(extract_latex_errors("   ! not at start\n").is_empty());
    }

    #[test]
    fn nothing_to_extract() {
        assert!(extract_latex_errors("pandoc: doc.md: openBinaryFile: does not exist").is_empty());
        assert!(extract_latex_errors("").is_empty());
    }

    #[test]
    fn hint_only_for_undefined_sequences() {
        assert!(remediation_hint(LOG).unwrap().contains("LaTeX package"));
        assert!(remediation_hint("! Emergency stop.").is_none());
    }
}
