//! Host-environment capability: everything platform-conditional lives here.
//!
//! Font fallback, the `--resource-path` separator, program discovery and
//! opening the finished PDF all depend on the operating system. Routing them
//! through [`HostEnvironment`] keeps the pipeline platform-agnostic and lets
//! tests substitute a fake host with a fixed platform and font directories.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Operating-system family, as far as md2pdf cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }

    /// Separator used to join directories in pandoc's `--resource-path`.
    pub fn path_separator(self) -> char {
        match self {
            Platform::Windows => ';',
            _ => ':',
        }
    }
}

/// Platform services consumed by the conversion pipeline.
pub trait HostEnvironment: Send + Sync {
    /// Which OS family we are on.
    fn platform(&self) -> Platform;

    /// Separator for multi-directory search strings.
    fn path_separator(&self) -> char {
        self.platform().path_separator()
    }

    /// Directories searched, in order, when probing for installed fonts.
    fn font_dirs(&self) -> Vec<PathBuf>;

    /// Whether an executable called `program` can be found.
    fn is_program_available(&self, program: &str) -> bool;

    /// Whether a graphical session is available to show a viewer in.
    fn has_display(&self) -> bool;

    /// Open `path` with the platform's default viewer.
    fn open_file(&self, path: &Path) -> std::io::Result<()>;
}

/// The real host, backed by `which`, `dirs` and `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostEnvironment for SystemHost {
    fn platform(&self) -> Platform {
        Platform::current()
    }

    fn font_dirs(&self) -> Vec<PathBuf> {
        let mut found = vec![
            PathBuf::from("/usr/share/fonts"),
            PathBuf::from("/usr/local/share/fonts"),
        ];
        if let Some(home) = dirs::home_dir() {
            found.push(home.join(".fonts"));
            found.push(home.join(".local/share/fonts"));
        }
        found
    }

    fn is_program_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn has_display(&self) -> bool {
        match self.platform() {
            Platform::Windows | Platform::MacOs => true,
            _ => std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some(),
        }
    }

    fn open_file(&self, path: &Path) -> std::io::Result<()> {
        let mut cmd = match self.platform() {
            Platform::Windows => {
                let mut c = Command::new("cmd");
                // The empty string is the window title `start` expects first.
                c.args(["/C", "start", ""]).arg(path);
                c
            }
            Platform::MacOs => {
                let mut c = Command::new("open");
                c.arg(path);
                c
            }
            _ => {
                let mut c = Command::new("xdg-open");
                c.arg(path);
                c
            }
        };
        cmd.stdout(Stdio::null()).stderr(Stdio::null()).spawn().map(|_| ())
    }
}
