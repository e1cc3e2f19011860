#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use taskmaster::config::{ConfigFile, RawConfigFile, RawProgramConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    programs: BTreeMap<String, RawProgramConfig>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            programs: BTreeMap::new(),
        }
    }

    pub fn with_program(mut self, name: &str, program: RawProgramConfig) -> Self {
        self.programs.insert(name.to_string(), program);
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        RawConfigFile {
            programs: Some(self.programs),
        }
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.build_raw()).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RawProgramConfig`.
pub struct ProgramConfigBuilder {
    program: RawProgramConfig,
}

impl ProgramConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            program: RawProgramConfig {
                cmd: Some(cmd.to_string()),
                ..Default::default()
            },
        }
    }

    /// `/bin/sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new("/bin/sh").args(&["-c", script])
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.program.args = Some(args.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn numprocs(mut self, n: i64) -> Self {
        self.program.numprocs = Some(n);
        self
    }

    pub fn umask(mut self, mask: u32) -> Self {
        self.program.umask = Some(mask);
        self
    }

    pub fn workingdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.program.workingdir = Some(dir.into());
        self
    }

    pub fn autostart(mut self, val: bool) -> Self {
        self.program.autostart = Some(val);
        self
    }

    pub fn autorestart(mut self, mode: &str) -> Self {
        self.program.autorestart = Some(mode.to_string());
        self
    }

    pub fn exitcodes(mut self, codes: &[i32]) -> Self {
        self.program.exitcodes = Some(codes.to_vec());
        self
    }

    pub fn startretries(mut self, n: i64) -> Self {
        self.program.startretries = Some(n);
        self
    }

    pub fn starttime(mut self, secs: u64) -> Self {
        self.program.starttime = Some(secs);
        self
    }

    pub fn stopsignal(mut self, sig: &str) -> Self {
        self.program.stopsignal = Some(sig.to_string());
        self
    }

    pub fn stoptime(mut self, secs: u64) -> Self {
        self.program.stoptime = Some(secs);
        self
    }

    pub fn stdout(mut self, path: impl Into<PathBuf>) -> Self {
        self.program.stdout = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.program
            .env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> RawProgramConfig {
        self.program
    }
}
