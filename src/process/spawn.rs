// src/process/spawn.rs

//! OS process plumbing: building the child command and stopping it.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::stat::{Mode, umask};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::ProgramSpec;
use crate::process::policy::ExitOutcome;

/// Shared critical section around spawn-time environment assembly.
///
/// One lock for the whole supervisor: the inherited environment is
/// process-wide, not per child.
pub type SpawnLock = Arc<Mutex<()>>;

pub fn new_spawn_lock() -> SpawnLock {
    Arc::new(Mutex::new(()))
}

#[derive(Debug, Error)]
pub enum SpawnError {
    /// The command could not be prepared (redirect files, working directory).
    #[error("unable to configure process: {0:#}")]
    Configure(anyhow::Error),

    /// The OS refused to execute the binary.
    #[error("unable to start process: {0}")]
    Launch(#[source] std::io::Error),
}

impl SpawnError {
    pub fn outcome(&self) -> ExitOutcome {
        match self {
            SpawnError::Configure(_) => ExitOutcome::ConfigError,
            SpawnError::Launch(_) => ExitOutcome::UnableToStart,
        }
    }
}

/// Spawn one child for `spec` while holding the shared spawn lock.
pub async fn spawn(spec: &ProgramSpec, lock: &SpawnLock) -> Result<Child, SpawnError> {
    let _env_guard = lock.lock().await;

    let mut cmd = build_command(spec).map_err(SpawnError::Configure)?;
    cmd.spawn().map_err(SpawnError::Launch)
}

/// Build the command for `spec`: binary, args, working directory,
/// environment overrides, redirections and umask.
pub fn build_command(spec: &ProgramSpec) -> anyhow::Result<Command> {
    if !spec.workingdir.is_dir() {
        return Err(anyhow!(
            "working directory {:?} does not exist",
            spec.workingdir
        ));
    }

    let mut cmd = Command::new(&spec.cmd);
    cmd.args(&spec.args)
        .current_dir(&spec.workingdir)
        .envs(&spec.env)
        .stdin(input_stdio(spec.stdin.as_deref())?)
        .stdout(output_stdio(spec.stdout.as_deref())?)
        .stderr(output_stdio(spec.stderr.as_deref())?)
        .kill_on_drop(true);

    let mask = Mode::from_bits_truncate(spec.umask as nix::libc::mode_t);
    // SAFETY: umask(2) is async-signal-safe and touches no memory of the parent.
    unsafe {
        cmd.pre_exec(move || {
            umask(mask);
            Ok(())
        });
    }

    Ok(cmd)
}

fn input_stdio(path: Option<&Path>) -> anyhow::Result<Stdio> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening stdin file {:?}", path))?;
            Ok(Stdio::from(file))
        }
        None => Ok(Stdio::null()),
    }
}

fn output_stdio(path: Option<&Path>) -> anyhow::Result<Stdio> {
    match path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening output file {:?}", path))?;
            Ok(Stdio::from(file))
        }
        None => Ok(Stdio::null()),
    }
}

/// Ask `child` to stop with `signal`, then force-kill it if it is still alive
/// after `grace`. Returns the final exit status.
pub async fn terminate(
    child: &mut Child,
    signal: Signal,
    grace: Duration,
) -> anyhow::Result<ExitStatus> {
    if let Some(pid) = child.id() {
        let pid = i32::try_from(pid).context("pid does not fit in pid_t")?;
        match kill(Pid::from_raw(pid), signal) {
            Ok(()) => debug!(pid, %signal, "sent stop signal"),
            Err(Errno::ESRCH) => debug!(pid, "process already gone"),
            Err(e) => warn!(pid, %signal, error = %e, "failed to send stop signal"),
        }
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status.context("waiting for process after stop signal"),
        Err(_) => {
            warn!(
                pid = child.id(),
                grace_secs = grace.as_secs_f64(),
                "process ignored stop signal; killing"
            );
            child.kill().await.context("killing process")?;
            child.wait().await.context("reaping killed process")
        }
    }
}
