// src/controller/handle.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::controller::ControllerCommand;
use crate::controller::registry::Registry;
use crate::errors::{Result, TaskmasterError};
use crate::process::ProcessRecord;
use crate::reconcile::{CommandSink, ReconcileCommand};

/// Cloneable command surface of a running [`Controller`](super::Controller).
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    command_tx: mpsc::Sender<ControllerCommand>,
    registry: Arc<Registry>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ControllerHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<ControllerCommand>,
        registry: Arc<Registry>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            command_tx,
            registry,
            shutdown_rx,
        }
    }

    pub async fn request_start(&self, record: Arc<ProcessRecord>) -> Result<()> {
        self.send(ControllerCommand::Start(record)).await
    }

    pub async fn request_stop(&self, name: impl Into<String>) -> Result<()> {
        self.send(ControllerCommand::Stop(name.into())).await
    }

    pub async fn request_kill_all(&self) -> Result<()> {
        self.send(ControllerCommand::KillAll).await
    }

    /// Resolve once the controller has torn down every run loop and stopped.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown_rx.clone();
        // An error means the controller task is gone, which is shutdown too.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Whether a live, un-cancelled run loop is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Whether a run loop for `record` has not reported done yet. Such a
    /// record cannot be started again.
    pub fn has_live_run(&self, record: &ProcessRecord) -> bool {
        self.registry.is_busy(record)
    }

    /// Names with a live run loop, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        self.registry.names()
    }

    async fn send(&self, command: ControllerCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| TaskmasterError::ControllerClosed)
    }
}

impl CommandSink for ControllerHandle {
    fn submit(
        &mut self,
        command: ReconcileCommand,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match command {
                ReconcileCommand::Start(record) => self.request_start(record).await,
                ReconcileCommand::Stop(record) => self.request_stop(record.name()).await,
            }
        })
    }
}
