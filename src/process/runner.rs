// src/process/runner.rs

//! The run loop that owns one process record from spawn to terminal state.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::process::Child;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::process::policy::{ExitOutcome, RestartDecision, RestartPolicy, classify_exit};
use crate::process::record::{ProcessRecord, ProcessStatus};
use crate::process::spawn::{self, SpawnLock};

/// Pause between two attempts of the same record.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Sent once by every run loop when it finishes.
#[derive(Debug, Clone)]
pub struct Completion {
    pub record: Arc<ProcessRecord>,
    /// Registration the run loop was started under.
    pub generation: u64,
}

/// Channel on which run loops report their own termination.
pub type DoneSender = mpsc::UnboundedSender<Completion>;
pub type DoneReceiver = mpsc::UnboundedReceiver<Completion>;

/// Reports the record on the done channel when dropped, so the report fires
/// on every exit path of the run loop, unwinding included.
struct CompletionGuard {
    record: Arc<ProcessRecord>,
    generation: u64,
    done_tx: DoneSender,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.record.status().is_live() {
            // Only reachable when the loop unwound with a child attached;
            // kill_on_drop has already taken care of the child.
            self.record.set_status(ProcessStatus::Stopped);
        }
        let report = Completion {
            record: Arc::clone(&self.record),
            generation: self.generation,
        };
        if self.done_tx.send(report).is_err() {
            debug!(
                process = %self.record.name(),
                "done listener gone; dropping completion report"
            );
        }
    }
}

/// Run `record` until the restart policy gives up or `cancel` fires.
///
/// Every attempt is classified and folded into the record. A
/// [`Completion`] carrying `generation` is sent on `done_tx` exactly once
/// when this future completes.
pub async fn run_process(
    record: Arc<ProcessRecord>,
    generation: u64,
    cancel: CancellationToken,
    spawn_lock: SpawnLock,
    done_tx: DoneSender,
) {
    let _guard = CompletionGuard {
        record: Arc::clone(&record),
        generation,
        done_tx,
    };
    let mut policy = RestartPolicy::for_spec(record.spec());

    loop {
        let outcome = run_once(&record, &cancel, &spawn_lock).await;

        match policy.decide(outcome) {
            RestartDecision::Retry => {
                record.record_restart();
                debug!(
                    process = %record.name(),
                    ?outcome,
                    remaining = %policy.remaining(),
                    "retrying process"
                );
                // A cancel during the pause is picked up by the next attempt.
                tokio::select! {
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                    _ = cancel.cancelled() => {}
                }
            }
            RestartDecision::Stop => {
                let state = record.snapshot();
                info!(
                    process = %record.name(),
                    ?outcome,
                    status = %state.status,
                    crashes = state.crashes,
                    restarts = state.restarts,
                    "process run loop finished"
                );
                break;
            }
        }
    }
}

/// One spawn-and-wait attempt.
async fn run_once(
    record: &ProcessRecord,
    cancel: &CancellationToken,
    spawn_lock: &SpawnLock,
) -> ExitOutcome {
    if cancel.is_cancelled() {
        record.apply_outcome(ExitOutcome::Killed, None);
        return ExitOutcome::Killed;
    }

    let spec = record.spec();
    let mut child = match spawn::spawn(spec, spawn_lock).await {
        Ok(child) => child,
        Err(err) => {
            let outcome = err.outcome();
            warn!(process = %record.name(), cmd = %spec.cmd, error = %err, "spawn failed");
            record.apply_outcome(outcome, None);
            return outcome;
        }
    };

    let started = Instant::now();
    record.mark_spawned(child.id());
    info!(process = %record.name(), pid = child.id(), cmd = %spec.cmd, "process spawned");

    let startup = tokio::time::sleep(spec.starttime);
    tokio::pin!(startup);
    let mut started_up = spec.starttime.is_zero();
    if started_up {
        record.set_status(ProcessStatus::Running);
    }

    loop {
        tokio::select! {
            status = child.wait() => {
                return match status {
                    Ok(status) => {
                        let outcome = classify_exit(status, spec, started.elapsed());
                        info!(
                            process = %record.name(),
                            exit_code = status.code(),
                            ?outcome,
                            "process exited"
                        );
                        record.apply_outcome(outcome, status.code());
                        outcome
                    }
                    Err(e) => {
                        error!(process = %record.name(), error = %e, "waiting for process failed");
                        record.apply_outcome(ExitOutcome::Crash, None);
                        ExitOutcome::Crash
                    }
                };
            }

            _ = &mut startup, if !started_up => {
                started_up = true;
                record.set_status(ProcessStatus::Running);
                debug!(process = %record.name(), "process survived its start time");
            }

            _ = cancel.cancelled() => {
                return stop(record, &mut child).await;
            }
        }
    }
}

/// Deliver the configured stop signal, wait out the grace period and reap.
async fn stop(record: &ProcessRecord, child: &mut Child) -> ExitOutcome {
    let spec = record.spec();
    let requested_at = SystemTime::now();
    record.set_status(ProcessStatus::Stopping);
    info!(
        process = %record.name(),
        signal = %spec.stopsignal,
        grace_secs = spec.stoptime.as_secs(),
        "stopping process"
    );

    let exit_code = match spawn::terminate(child, spec.stopsignal.signal(), spec.stoptime).await {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(process = %record.name(), error = %e, "failed to stop process cleanly");
            None
        }
    };

    record.apply_outcome(ExitOutcome::Killed, exit_code);
    record.record_stop(requested_at);
    ExitOutcome::Killed
}
