// src/supervisor.rs

//! The long-running supervisor: owns the known process state, reloads the
//! configuration on request and tears everything down on shutdown.

use std::path::{Path, PathBuf};

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::ControllerHandle;
use crate::errors::Result;
use crate::process::ProcessMap;
use crate::reconcile;

/// Requests handled by [`Supervisor::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Re-read the config file and reconcile.
    Reload,
    /// Log the state of every record.
    Status,
    /// Kill everything and exit.
    Shutdown,
}

#[derive(Debug)]
pub struct Supervisor {
    config_path: PathBuf,
    state: ProcessMap,
    controller: ControllerHandle,
}

impl Supervisor {
    /// A supervisor with no known processes yet. Call [`Supervisor::reload`]
    /// to bring up the configured programs.
    pub fn new(config_path: impl Into<PathBuf>, controller: ControllerHandle) -> Self {
        Self {
            config_path: config_path.into(),
            state: ProcessMap::new(),
            controller,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn state(&self) -> &ProcessMap {
        &self.state
    }

    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    /// Reconcile the running processes with the config file.
    ///
    /// On error the previous state is kept.
    pub async fn reload(&mut self) -> Result<()> {
        let mut sink = self.controller.clone();
        let state = reconcile::reload(&self.config_path, &self.state, &mut sink).await?;
        self.state = state;
        info!(programs = self.state.len(), "configuration applied");
        Ok(())
    }

    /// Log one line per record.
    pub fn log_status(&self) {
        for (program, snaps) in self.state.snapshot() {
            for snap in snaps {
                info!(
                    program = %program,
                    process = %snap.name,
                    pid = ?snap.state.pid,
                    status = %snap.state.status,
                    crashes = snap.state.crashes,
                    restarts = snap.state.restarts,
                    exit_code = ?snap.state.exit_code,
                    "status"
                );
            }
        }
    }

    /// Stop every process and wait until the controller has finished.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down");
        if let Err(e) = self.controller.request_kill_all().await {
            // Already gone; nothing left to kill.
            debug!(error = %e, "controller closed before kill-all");
        }
        self.controller.wait_for_shutdown().await;
        Ok(())
    }

    /// Handle events until a shutdown is requested or every sender is gone,
    /// then shut down.
    pub async fn run(mut self, mut events: mpsc::Receiver<SupervisorEvent>) -> Result<()> {
        while let Some(event) = events.recv().await {
            match event {
                SupervisorEvent::Reload => {
                    info!(path = %self.config_path.display(), "reloading configuration");
                    if let Err(e) = self.reload().await {
                        warn!(error = %e, "reload failed; keeping previous configuration");
                    }
                }
                SupervisorEvent::Status => self.log_status(),
                SupervisorEvent::Shutdown => break,
            }
        }
        self.shutdown().await
    }
}

/// Translate process signals into supervisor events.
///
/// - `SIGINT`, `SIGTERM`: [`SupervisorEvent::Shutdown`]
/// - `SIGHUP`: [`SupervisorEvent::Reload`]
/// - `SIGUSR1`: [`SupervisorEvent::Status`]
pub fn spawn_signal_listener(events_tx: mpsc::Sender<SupervisorEvent>) -> Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut user1 = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(()) = interrupt.recv() => SupervisorEvent::Shutdown,
                Some(()) = terminate.recv() => SupervisorEvent::Shutdown,
                Some(()) = hangup.recv() => SupervisorEvent::Reload,
                Some(()) = user1.recv() => SupervisorEvent::Status,
                else => break,
            };
            debug!(?event, "signal received");
            let shutdown = event == SupervisorEvent::Shutdown;
            if events_tx.send(event).await.is_err() || shutdown {
                break;
            }
        }
    }))
}
