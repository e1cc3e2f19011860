// src/process/record.rs

//! One supervised instance of a program.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use crate::config::ProgramSpec;
use crate::process::policy::ExitOutcome;

/// Lifecycle state of a process record.
///
/// ```text
/// stopped -> setup -> running -> {done, crashed, unable to start}
/// stopped -> {unable to start, unable to configure}   spawn failed
/// {setup, running} -> stopping -> killed
/// ```
///
/// A retry goes back to `setup` on the same record. `killed` is terminal for
/// the record. `stopped` is only seen before the first spawn, or after a run
/// loop unwound with a child attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessStatus {
    #[default]
    Stopped,
    Setup,
    Running,
    Done,
    Crashed,
    UnableToStart,
    UnableToConfigure,
    Killed,
    Stopping,
}

impl ProcessStatus {
    /// Whether a child may currently be alive for this status.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ProcessStatus::Setup | ProcessStatus::Running | ProcessStatus::Stopping
        )
    }
}

impl From<ExitOutcome> for ProcessStatus {
    fn from(outcome: ExitOutcome) -> Self {
        match outcome {
            ExitOutcome::Ok => ProcessStatus::Done,
            ExitOutcome::Crash => ProcessStatus::Crashed,
            ExitOutcome::UnableToStart => ProcessStatus::UnableToStart,
            ExitOutcome::ConfigError => ProcessStatus::UnableToConfigure,
            ExitOutcome::Killed => ProcessStatus::Killed,
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessStatus::Stopped => "stopped",
            ProcessStatus::Setup => "setup",
            ProcessStatus::Running => "running",
            ProcessStatus::Done => "done",
            ProcessStatus::Crashed => "crashed",
            ProcessStatus::UnableToStart => "unable to start",
            ProcessStatus::UnableToConfigure => "unable to configure",
            ProcessStatus::Killed => "killed",
            ProcessStatus::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Mutable runtime attributes of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessState {
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub crashes: u32,
    pub restarts: u32,
    pub exit_code: Option<i32>,
    pub start_time: Option<SystemTime>,
    pub stop_time: Option<SystemTime>,
    pub stop_duration: Option<Duration>,
}

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

/// A single instance (`"<program> - <index>"`) of a program.
///
/// The spec is a snapshot taken at creation and can never be replaced; a
/// changed program always yields a new record. Runtime attributes sit behind
/// a mutex that is only ever held for short, non-async sections.
#[derive(Debug)]
pub struct ProcessRecord {
    id: u64,
    name: String,
    spec: Arc<ProgramSpec>,
    state: Mutex<ProcessState>,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>, spec: Arc<ProgramSpec>) -> Self {
        Self {
            id: NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            spec,
            state: Mutex::new(ProcessState::default()),
        }
    }

    /// Create every instance record of `spec`, in index order.
    pub fn instances_of(spec: &Arc<ProgramSpec>) -> Vec<Arc<ProcessRecord>> {
        (0..spec.numprocs)
            .map(|index| Arc::new(ProcessRecord::new(spec.instance_name(index), Arc::clone(spec))))
            .collect()
    }

    /// Unique identity of this record, distinct even between records that
    /// share a name.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &ProgramSpec {
        &self.spec
    }

    /// Copy of the current runtime attributes.
    pub fn snapshot(&self) -> ProcessState {
        self.lock().clone()
    }

    pub fn status(&self) -> ProcessStatus {
        self.lock().status
    }

    pub fn set_status(&self, status: ProcessStatus) {
        self.lock().status = status;
    }

    /// A child has been spawned.
    pub(crate) fn mark_spawned(&self, pid: Option<u32>) {
        let mut state = self.lock();
        state.pid = pid;
        state.status = ProcessStatus::Setup;
        state.start_time = Some(SystemTime::now());
        state.stop_time = None;
        state.stop_duration = None;
    }

    /// Fold one attempt's outcome into the record.
    ///
    /// Crashes and failed starts are counted whether or not a retry follows.
    pub(crate) fn apply_outcome(&self, outcome: ExitOutcome, exit_code: Option<i32>) {
        let mut state = self.lock();
        state.status = outcome.into();
        state.pid = None;
        if exit_code.is_some() {
            state.exit_code = exit_code;
        }
        if outcome.counts_as_crash() {
            state.crashes = state.crashes.saturating_add(1);
        }
    }

    pub(crate) fn record_restart(&self) {
        let mut state = self.lock();
        state.restarts = state.restarts.saturating_add(1);
    }

    pub(crate) fn record_stop(&self, requested_at: SystemTime) {
        let mut state = self.lock();
        let now = SystemTime::now();
        state.stop_time = Some(now);
        state.stop_duration = now.duration_since(requested_at).ok();
    }

    fn lock(&self) -> MutexGuard<'_, ProcessState> {
        // Poisoning leaves the counters intact.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.snapshot();
        let pid = state.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        write!(f, "{} {} {}", self.name, pid, state.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawProgramConfig;

    fn spec(numprocs: i64) -> Arc<ProgramSpec> {
        let raw = RawProgramConfig {
            cmd: Some("/bin/true".to_string()),
            numprocs: Some(numprocs),
            ..Default::default()
        };
        Arc::new(ProgramSpec::from_raw("web", raw).unwrap())
    }

    #[test]
    fn instances_are_named_by_index() {
        let records = ProcessRecord::instances_of(&spec(3));
        let names: Vec<_> = records.iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["web - 0", "web - 1", "web - 2"]);
        assert!(records.iter().all(|r| r.status() == ProcessStatus::Stopped));
    }

    #[test]
    fn record_ids_are_unique() {
        let s = spec(1);
        let a = ProcessRecord::new("web - 0", Arc::clone(&s));
        let b = ProcessRecord::new("web - 0", s);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn crash_outcomes_are_counted() {
        let record = ProcessRecord::new("web - 0", spec(1));
        record.apply_outcome(ExitOutcome::Crash, Some(3));
        record.apply_outcome(ExitOutcome::UnableToStart, None);
        record.apply_outcome(ExitOutcome::Ok, Some(0));
        record.apply_outcome(ExitOutcome::Killed, None);

        let state = record.snapshot();
        assert_eq!(state.crashes, 2);
        assert_eq!(state.exit_code, Some(0));
        assert_eq!(state.status, ProcessStatus::Killed);
    }

    #[test]
    fn counters_saturate() {
        let record = ProcessRecord::new("web - 0", spec(1));
        {
            let mut state = record.lock();
            state.crashes = u32::MAX;
            state.restarts = u32::MAX;
        }
        record.apply_outcome(ExitOutcome::UnableToStart, None);
        record.record_restart();

        let state = record.snapshot();
        assert_eq!(state.crashes, u32::MAX);
        assert_eq!(state.restarts, u32::MAX);
    }

    #[test]
    fn display_shows_name_pid_and_status() {
        let record = ProcessRecord::new("web - 0", spec(1));
        assert_eq!(record.to_string(), "web - 0 - stopped");
        record.mark_spawned(Some(42));
        record.set_status(ProcessStatus::Running);
        assert_eq!(record.to_string(), "web - 0 42 running");
    }

    #[test]
    fn status_strings() {
        assert_eq!(ProcessStatus::UnableToStart.to_string(), "unable to start");
        assert_eq!(ProcessStatus::UnableToConfigure.to_string(), "unable to configure");
        assert_eq!(ProcessStatus::from(ExitOutcome::Ok), ProcessStatus::Done);
    }
}
