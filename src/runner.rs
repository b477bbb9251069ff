//! The external-converter capability.
//!
//! pandoc is modelled as something that takes an argument list and gives
//! back an exit status plus captured output. [`SystemConverter`] runs the
//! real program; tests provide their own [`ExternalConverter`] to simulate
//! success, LaTeX failures, or a converter that never starts.

use std::ffi::OsString;
use std::process::{Command, Stdio};
use tracing::debug;

/// What a finished converter run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ConverterOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs the external document converter to completion.
pub trait ExternalConverter: Send + Sync {
    /// Program name, used in log lines and error messages.
    fn program(&self) -> &str;

    /// Run with `args` and block until exit, capturing stdout and stderr.
    ///
    /// `Err` means the process could not be started; a process that starts
    /// and fails is an `Ok` with a non-zero status.
    fn run(&self, args: &[OsString]) -> std::io::Result<ConverterOutput>;
}

/// Spawns the converter as a child process.
#[derive(Debug, Clone)]
pub struct SystemConverter {
    program: String,
}

impl SystemConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ExternalConverter for SystemConverter {
    fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[OsString]) -> std::io::Result<ConverterOutput> {
        debug!("Spawning {} with {} arguments", self.program, args.len());
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ConverterOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render an argument list as a single shell-ish line for logging.
pub fn display_command(program: &str, args: &[OsString]) -> String {
    let mut line = String::from(program);
    for arg in args {
        let arg = arg.to_string_lossy();
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(&arg);
            line.push('"');
        } else {
            line.push_str(&arg);
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_zero_status() {
        let ok = ConverterOutput {
            status: Some(0),
            ..Default::default()
        };
        let failed = ConverterOutput {
            status: Some(43),
            ..Default::default()
        };
        let killed = ConverterOutput::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[test]
    fn display_command_quotes_spaces() {
        let args: Vec<OsString> = vec!["in.md".into(), "-V".into(), "CJKmainfont=PingFang SC".into()];
        assert_eq!(
            display_command("pandoc", &args),
            "pandoc in.md -V \"CJKmainfont=PingFang SC\""
        );
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let conv = SystemConverter::new("md2pdf-no-such-converter");
        assert_eq!(conv.program(), "md2pdf-no-such-converter");
        assert!(conv.run(&[]).is_err());
    }
}
