// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::signal::StopSignal;
use crate::types::{RestartMode, RetryBudget};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [programs.web]
/// cmd = "/usr/bin/python3"
/// args = ["-m", "http.server"]
/// numprocs = 2
/// autorestart = "always"
/// startretries = 3
/// stopsignal = "TERM"
/// env = { PORT = "8080" }
/// ```
///
/// The `[programs]` table is mandatory; every field of a program except
/// `cmd` is optional and gets a default during validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// All programs from `[programs.<name>]`.
    #[serde(default)]
    pub programs: Option<BTreeMap<String, RawProgramConfig>>,
}

/// `[programs.<name>]` section, exactly as written by the user.
///
/// Presence matters for defaulting, so every field is an `Option`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProgramConfig {
    pub cmd: Option<String>,
    pub args: Option<Vec<String>>,
    pub numprocs: Option<i64>,
    pub umask: Option<u32>,
    pub workingdir: Option<PathBuf>,
    pub autostart: Option<bool>,
    /// `"never"`, `"always"` or `"sometimes"`.
    pub autorestart: Option<String>,
    pub exitcodes: Option<Vec<i32>>,
    pub startretries: Option<i64>,
    /// Seconds a process must stay up to count as started.
    pub starttime: Option<u64>,
    pub stopsignal: Option<String>,
    /// Seconds to wait after `stopsignal` before killing.
    pub stoptime: Option<u64>,
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
    pub env: Option<BTreeMap<String, String>>,
}

/// Fully-defaulted description of how to run one program.
///
/// Equality is structural over every field; the reconciler relies on this to
/// decide whether a program changed between two config loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSpec {
    pub name: String,
    pub cmd: String,
    pub args: Vec<String>,
    pub numprocs: usize,
    pub umask: u32,
    pub workingdir: PathBuf,
    pub autostart: bool,
    pub autorestart: RestartMode,
    /// Always sorted ascending.
    pub exitcodes: Vec<i32>,
    pub startretries: RetryBudget,
    pub starttime: Duration,
    pub stopsignal: StopSignal,
    pub stoptime: Duration,
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

pub const DEFAULT_UMASK: u32 = 0o022;
pub const DEFAULT_WORKINGDIR: &str = "./";
pub const DEFAULT_STOPTIME_SECS: u64 = 1;

impl ProgramSpec {
    /// Name of the `index`-th instance of this program.
    pub fn instance_name(&self, index: usize) -> String {
        format!("{} - {}", self.name, index)
    }

    pub fn is_expected_exit(&self, code: i32) -> bool {
        self.exitcodes.binary_search(&code).is_ok()
    }
}

impl fmt::Display for ProgramSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  - {}", self.name)?;
        writeln!(f, "      cmd: {}", self.cmd)?;
        if !self.args.is_empty() {
            writeln!(f, "      args: {:?}", self.args)?;
        }
        writeln!(f, "      numprocs: {}", self.numprocs)?;
        writeln!(f, "      umask: {:03o}", self.umask)?;
        writeln!(f, "      workingdir: {}", self.workingdir.display())?;
        writeln!(f, "      autostart: {}", self.autostart)?;
        writeln!(f, "      autorestart: {}", self.autorestart)?;
        writeln!(f, "      exitcodes: {:?}", self.exitcodes)?;
        writeln!(f, "      startretries: {}", self.startretries)?;
        writeln!(f, "      starttime: {}s", self.starttime.as_secs())?;
        writeln!(f, "      stopsignal: {}", self.stopsignal)?;
        writeln!(f, "      stoptime: {}s", self.stoptime.as_secs())?;
        for (label, path) in [
            ("stdin", &self.stdin),
            ("stdout", &self.stdout),
            ("stderr", &self.stderr),
        ] {
            if let Some(path) = path {
                writeln!(f, "      {label}: {}", path.display())?;
            }
        }
        if !self.env.is_empty() {
            writeln!(f, "      env: {:?}", self.env)?;
        }
        Ok(())
    }
}

/// Validated configuration: program name -> spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    programs: BTreeMap<String, ProgramSpec>,
}

impl ConfigFile {
    /// Build from already-validated specs. Prefer `ConfigFile::try_from`.
    pub fn new_unchecked(programs: BTreeMap<String, ProgramSpec>) -> Self {
        Self { programs }
    }

    pub fn programs(&self) -> &BTreeMap<String, ProgramSpec> {
        &self.programs
    }

    pub fn program(&self, name: &str) -> Option<&ProgramSpec> {
        self.programs.get(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
