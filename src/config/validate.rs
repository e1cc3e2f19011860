// src/config/validate.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::config::model::{
    ConfigFile, DEFAULT_STOPTIME_SECS, DEFAULT_UMASK, DEFAULT_WORKINGDIR, ProgramSpec,
    RawConfigFile, RawProgramConfig,
};
use crate::config::signal::StopSignal;
use crate::errors::{Result, TaskmasterError};
use crate::types::{RestartMode, RetryBudget};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskmasterError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let raw_programs = raw.programs.ok_or_else(|| {
            TaskmasterError::ConfigError(
                "config must contain a [programs] table".to_string(),
            )
        })?;

        let mut programs = BTreeMap::new();
        for (name, program) in raw_programs {
            let spec = ProgramSpec::from_raw(&name, program)?;
            programs.insert(name, spec);
        }

        Ok(ConfigFile::new_unchecked(programs))
    }
}

impl ProgramSpec {
    /// Fill defaults for everything the user left out and validate the rest.
    pub fn from_raw(name: &str, raw: RawProgramConfig) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(TaskmasterError::ConfigError(
                "program names must not be empty".to_string(),
            ));
        }

        let cmd = match raw.cmd {
            Some(cmd) if !cmd.trim().is_empty() => cmd,
            _ => {
                return Err(TaskmasterError::ConfigError(format!(
                    "program '{name}' is missing `cmd`"
                )));
            }
        };

        let numprocs = match raw.numprocs {
            Some(n) if n > 0 => usize::try_from(n).map_err(|_| {
                TaskmasterError::ConfigError(format!(
                    "program '{name}' has too many processes: {n}"
                ))
            })?,
            Some(n) => {
                debug!(program = %name, numprocs = n, "non-positive numprocs; using 1");
                1
            }
            None => 1,
        };

        let autorestart = match raw.autorestart {
            Some(mode) => mode.parse::<RestartMode>().map_err(|e| {
                TaskmasterError::ConfigError(format!("program '{name}': {e}"))
            })?,
            None => RestartMode::default(),
        };

        let startretries = RetryBudget::from_raw(raw.startretries.unwrap_or(0))
            .map_err(|e| TaskmasterError::ConfigError(format!("program '{name}': {e}")))?;

        let stopsignal = match raw.stopsignal {
            Some(sig) => sig.parse::<StopSignal>()?,
            None => StopSignal::default(),
        };

        let mut exitcodes = raw.exitcodes.unwrap_or_else(|| vec![0]);
        exitcodes.sort_unstable();

        Ok(ProgramSpec {
            name: name.to_string(),
            cmd,
            args: raw.args.unwrap_or_default(),
            numprocs,
            umask: raw.umask.unwrap_or(DEFAULT_UMASK),
            workingdir: raw
                .workingdir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKINGDIR)),
            autostart: raw.autostart.unwrap_or(true),
            autorestart,
            exitcodes,
            startretries,
            starttime: Duration::from_secs(raw.starttime.unwrap_or(0)),
            stopsignal,
            stoptime: Duration::from_secs(raw.stoptime.unwrap_or(DEFAULT_STOPTIME_SECS)),
            stdin: raw.stdin,
            stdout: raw.stdout,
            stderr: raw.stderr,
            env: raw.env.unwrap_or_default(),
        })
    }
}
