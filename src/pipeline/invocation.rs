//! pandoc argument list assembly.

use crate::config::Engine;
use std::ffi::OsString;
use std::path::PathBuf;

/// Everything that varies between pandoc invocations.
#[derive(Debug, Clone)]
pub struct PandocInvocation {
    pub input: PathBuf,
    pub output: PathBuf,
    pub engine: Engine,
    pub template: PathBuf,
    pub main_font: String,
    pub mono_font: String,
    pub resource_path: String,
    pub toc: bool,
    pub verbose: bool,
}

impl PandocInvocation {
    /// Build the argument vector (program name excluded).
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.input.clone().into(),
            "-o".into(),
            self.output.clone().into(),
            "--pdf-engine".into(),
            self.engine.program().into(),
            "--template".into(),
            self.template.clone().into(),
            "-V".into(),
            format!("CJKmainfont={}", self.main_font).into(),
            "-V".into(),
            format!("monofont={}", self.mono_font).into(),
            "--standalone".into(),
            "--resource-path".into(),
            self.resource_path.clone().into(),
        ];
        if self.toc {
            args.push("--toc".into());
        }
        // No re-wrapping, so image lines survive intact; embedded media lands
        // next to the working directory.
        args.push("--wrap=none".into());
        args.push("--extract-media=.".into());
        if self.verbose {
            args.push("--verbose".into());
        }
        args
    }
}
