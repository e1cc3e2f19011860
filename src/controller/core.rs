// src/controller/core.rs

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::controller::handle::ControllerHandle;
use crate::controller::registry::Registry;
use crate::controller::ControllerCommand;
use crate::process::{
    Completion, DoneReceiver, DoneSender, ProcessRecord, SpawnLock, new_spawn_lock, run_process,
};

/// Command channel capacity; senders wait when the dispatcher falls behind.
const COMMAND_BUFFER: usize = 64;

/// The dispatch loop and everything it owns.
///
/// - `root` is never cancelled; every run loop gets its own child token, so
///   cancelling one never touches a sibling.
/// - `tracker` counts outstanding run loops for `kill_all`.
/// - `spawn_lock` is shared by every run loop for the spawn step.
pub struct Controller {
    command_rx: mpsc::Receiver<ControllerCommand>,
    done_tx: DoneSender,
    done_rx: DoneReceiver,
    registry: Arc<Registry>,
    root: CancellationToken,
    tracker: TaskTracker,
    spawn_lock: SpawnLock,
    shutdown_tx: watch::Sender<bool>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("registry", &self.registry)
            .field("outstanding", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

/// Spawn a controller on the current runtime and return its handle.
pub fn spawn_controller() -> ControllerHandle {
    let (controller, handle) = Controller::new();
    tokio::spawn(controller.run());
    handle
}

impl Controller {
    /// Build a controller and the handle that talks to it. The controller
    /// does nothing until [`Controller::run`] is polled.
    pub fn new() -> (Self, ControllerHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let registry = Arc::new(Registry::new());

        let handle = ControllerHandle::new(command_tx, Arc::clone(&registry), shutdown_rx);
        let controller = Self {
            command_rx,
            done_tx,
            done_rx,
            registry,
            root: CancellationToken::new(),
            tracker: TaskTracker::new(),
            spawn_lock: new_spawn_lock(),
            shutdown_tx,
        };
        (controller, handle)
    }

    /// Main dispatch loop.
    ///
    /// Runs until a `KillAll` arrives or every handle is dropped; either way
    /// all run loops are torn down before the shutdown waiters are released.
    pub async fn run(self) {
        let Controller {
            mut command_rx,
            done_tx,
            done_rx,
            registry,
            root,
            tracker,
            spawn_lock,
            shutdown_tx,
        } = self;

        info!("controller started");

        // Completion reports are drained independently so a slow dispatcher
        // never holds up registry cleanup.
        let listener = tokio::spawn(listen_for_done(done_rx, Arc::clone(&registry)));

        loop {
            match command_rx.recv().await {
                Some(ControllerCommand::Start(record)) => {
                    start_process(record, &registry, &root, &tracker, &spawn_lock, &done_tx);
                }
                Some(ControllerCommand::Stop(name)) => {
                    stop_process(&name, &registry);
                }
                Some(ControllerCommand::KillAll) => {
                    info!("kill-all requested");
                    break;
                }
                None => {
                    info!("all controller handles dropped; shutting down");
                    break;
                }
            }
        }

        // Refuse new commands before the slow part; anything already
        // buffered is dropped with a diagnostic.
        command_rx.close();
        while let Ok(command) = command_rx.try_recv() {
            warn!(?command, "controller shutting down; dropping command");
        }

        let cancelled = registry.cancel_all();
        info!(cancelled, outstanding = tracker.len(), "killing all processes");

        tracker.close();
        tracker.wait().await;

        // Every run loop has exited and sent its report; once our sender is
        // gone the listener drains the rest and finishes.
        drop(done_tx);
        if let Err(e) = listener.await {
            debug!(error = %e, "done listener ended abnormally");
        }

        shutdown_tx.send_replace(true);
        info!("controller stopped");
    }
}

fn start_process(
    record: Arc<ProcessRecord>,
    registry: &Registry,
    root: &CancellationToken,
    tracker: &TaskTracker,
    spawn_lock: &SpawnLock,
    done_tx: &DoneSender,
) {
    let token = root.child_token();
    let generation = match registry.try_register(&record, token.clone()) {
        Ok(generation) => generation,
        Err(refusal) => {
            info!(process = %record.name(), %refusal, "not starting process");
            return;
        }
    };

    info!(process = %record.name(), generation, "running process");
    tracker.spawn(run_process(
        record,
        generation,
        token,
        Arc::clone(spawn_lock),
        done_tx.clone(),
    ));
}

fn stop_process(name: &str, registry: &Registry) {
    if registry.cancel(name) {
        info!(process = %name, "canceling process");
    } else {
        info!(process = %name, "unable to cancel process; not running");
    }
}

async fn listen_for_done(mut done_rx: DoneReceiver, registry: Arc<Registry>) {
    while let Some(Completion { record, generation }) = done_rx.recv().await {
        if registry.release(&record, generation) {
            debug!(process = %record.name(), "registry slot released");
        } else {
            debug!(
                process = %record.name(),
                "completion from a cancelled or replaced instance"
            );
        }
    }
    debug!("done listener finished");
}
