// src/reconcile/apply.rs

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tracing::{error, info};

use crate::config::load_and_validate;
use crate::errors::Result;
use crate::process::ProcessMap;
use crate::reconcile::plan::{ReconcilePlan, plan};
use crate::reconcile::ReconcileCommand;

/// Where reconcile commands go.
///
/// Production code uses [`ControllerHandle`](crate::controller::ControllerHandle);
/// tests can record commands instead of running processes.
pub trait CommandSink: Send {
    fn submit(
        &mut self,
        command: ReconcileCommand,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Submit `commands` to `sink` in order, stopping at the first failure.
pub async fn apply<S: CommandSink + ?Sized>(
    commands: Vec<ReconcileCommand>,
    sink: &mut S,
) -> Result<()> {
    for command in commands {
        sink.submit(command).await?;
    }
    Ok(())
}

/// Load `path`, reconcile it against `previous` and issue the commands.
///
/// On a load or validation error nothing is issued and the error is
/// returned; the caller keeps `previous` as its known state.
pub async fn reload<S: CommandSink + ?Sized>(
    path: impl AsRef<Path>,
    previous: &ProcessMap,
    sink: &mut S,
) -> Result<ProcessMap> {
    let path = path.as_ref();
    let desired = load_and_validate(path).inspect_err(|e| {
        error!(path = %path.display(), error = %e, "error parsing config file");
    })?;

    let ReconcilePlan { commands, state } = plan(previous, &desired);
    info!(
        path = %path.display(),
        programs = desired.len(),
        commands = commands.len(),
        "applying new configuration"
    );

    apply(commands, sink).await?;
    Ok(state)
}
