//! CJK main-font resolution.
//!
//! Windows and macOS ship a usable CJK font under a fixed name. Everywhere
//! else we look for the files of a short list of common CJK families in the
//! host's font directories and take the first family that is installed.
//!
//! Probing is an in-process directory walk: each candidate family carries the
//! file-name prefixes its font files are distributed under (family names and
//! file names rarely agree, e.g. *AR PL KaitiM GB* ships as `gkai00mp.ttf`).

use crate::host::{HostEnvironment, Platform};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Font used on Windows hosts.
pub const WINDOWS_CJK_FONT: &str = "SimSun";

/// Font used on macOS hosts.
pub const MACOS_CJK_FONT: &str = "PingFang SC";

/// Font returned when no candidate is installed.
pub const FALLBACK_CJK_FONT: &str = "AR PL KaitiM GB";

/// Candidate families in preference order, each with the normalised
/// file-name prefixes its font files use.
pub const CJK_FONT_CANDIDATES: &[(&str, &[&str])] = &[
    ("Noto Sans CJK SC", &["notosanscjk", "notosanssc"]),
    ("WenQuanYi Micro Hei", &["wqymicrohei", "wenquanyimicrohei"]),
    ("AR PL KaitiM GB", &["gkai00mp", "arplkaitimgb"]),
    ("SimSun", &["simsun"]),
];

// Distro font trees nest vendor/family directories a few levels deep.
const MAX_PROBE_DEPTH: usize = 4;

const FONT_EXTENSIONS: &[&str] = &["ttf", "ttc", "otf", "otc"];

/// Resolve the default CJK main font for `host`.
///
/// Pure with respect to the host's platform and font-directory contents:
/// calling it twice against the same filesystem yields the same name, and
/// the result is never empty.
pub fn resolve_cjk_font(host: &dyn HostEnvironment) -> String {
    let font = match host.platform() {
        Platform::Windows => WINDOWS_CJK_FONT,
        Platform::MacOs => MACOS_CJK_FONT,
        Platform::Linux | Platform::Other => probe_installed(&host.font_dirs()),
    };
    debug!("Resolved CJK font: {}", font);
    font.to_string()
}

/// First candidate with a matching font file under any of `dirs`, else the fallback.
fn probe_installed(dirs: &[std::path::PathBuf]) -> &'static str {
    let stems: Vec<String> = dirs
        .iter()
        .filter(|d| d.is_dir())
        .flat_map(|d| font_file_stems(d))
        .collect();

    CJK_FONT_CANDIDATES
        .iter()
        .find(|(_, prefixes)| {
            stems
                .iter()
                .any(|stem| prefixes.iter().any(|p| stem.starts_with(p)))
        })
        .map(|(family, _)| *family)
        .unwrap_or(FALLBACK_CJK_FONT)
}

/// Normalised stems of every font file below `dir`.
fn font_file_stems(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .max_depth(MAX_PROBE_DEPTH)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| FONT_EXTENSIONS.contains(&x.to_ascii_lowercase().as_str()))
        })
        .filter_map(|e| e.path().file_stem().and_then(|s| s.to_str()).map(normalise))
        .collect()
}

/// Lower-case and drop separators so `Noto Sans CJK` and `NotoSansCJK-Regular` line up.
fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FakeHost {
        platform: Platform,
        font_dirs: Vec<PathBuf>,
    }

    impl HostEnvironment for FakeHost {
        fn platform(&self) -> Platform {
            self.platform
        }
        fn font_dirs(&self) -> Vec<PathBuf> {
            self.font_dirs.clone()
        }
        fn is_program_available(&self, _program: &str) -> bool {
            true
        }
        fn has_display(&self) -> bool {
            false
        }
        fn open_file(&self, _path: &Path) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn host(platform: Platform, dirs: Vec<PathBuf>) -> FakeHost {
        FakeHost {
            platform,
            font_dirs: dirs,
        }
    }

    #[test]
    fn windows_and_macos_use_fixed_fonts() {
        assert_eq!(resolve_cjk_font(&host(Platform::Windows, vec![])), "SimSun");
        assert_eq!(resolve_cjk_font(&host(Platform::MacOs, vec![])), "PingFang SC");
    }

    #[test]
    fn linux_without_fonts_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let h = host(Platform::Linux, vec![tmp.path().to_path_buf(), PathBuf::from("/nonexistent/fonts")]);
        assert_eq!(resolve_cjk_font(&h), FALLBACK_CJK_FONT);
    }

    #[test]
    fn linux_picks_first_installed_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("truetype/wqy");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("wqy-microhei.ttc"), b"").unwrap();
        std::fs::write(tmp.path().join("simsun.ttf"), b"").unwrap();

        let h = host(Platform::Linux, vec![tmp.path().to_path_buf()]);
        assert_eq!(resolve_cjk_font(&h), "WenQuanYi Micro Hei");
    }

    #[test]
    fn candidate_order_beats_directory_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("SimSun.ttf"), b"").unwrap();
        std::fs::write(second.path().join("NotoSansCJK-Regular.ttc"), b"").unwrap();

        let h = host(
            Platform::Other,
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert_eq!(resolve_cjk_font(&h), "Noto Sans CJK SC");
    }

    #[test]
    fn non_font_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("NotoSansCJK-README.txt"), b"").unwrap();
        let h = host(Platform::Linux, vec![tmp.path().to_path_buf()]);
        assert_eq!(resolve_cjk_font(&h), FALLBACK_CJK_FONT);
    }

    #[test]
    fn resolution_is_stable_and_non_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("gkai00mp.ttf"), b"").unwrap();
        let h = host(Platform::Linux, vec![tmp.path().to_path_buf()]);
        let a = resolve_cjk_font(&h);
        let b = resolve_cjk_font(&h);
        assert_eq!(a, b);
        assert_eq!(a, "AR PL KaitiM GB");
        assert!(!a.is_empty());
    }

    #[test]
    fn normalise_strips_separators_and_case() {
        assert_eq!(normalise("Noto Sans_CJK-Regular"), "notosanscjkregular");
    }
}
