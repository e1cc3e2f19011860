// src/lib.rs

pub mod cli;
pub mod config;
pub mod controller;
pub mod errors;
pub mod logging;
pub mod process;
pub mod reconcile;
pub mod supervisor;
pub mod types;
pub mod watch;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::controller::spawn_controller;
use crate::supervisor::{Supervisor, SupervisorEvent, spawn_signal_listener};

/// Supervisor event channel capacity.
const EVENT_BUFFER: usize = 16;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (the first load is fatal on error)
/// - the controller and the initial reconcile
/// - (optional) config file watcher
/// - signal handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();

    if args.dry_run {
        let cfg = load_and_validate(&config_path)?;
        print_dry_run(&cfg);
        return Ok(());
    }

    let controller = spawn_controller();
    let mut supervisor = Supervisor::new(&config_path, controller);

    if let Err(e) = supervisor.reload().await {
        error!(error = %e, "initial configuration failed");
        supervisor.shutdown().await?;
        return Err(e.into());
    }

    let (events_tx, events_rx) = mpsc::channel::<SupervisorEvent>(EVENT_BUFFER);

    // Kept alive for the lifetime of the supervisor loop.
    let _watcher_handle = if args.watch {
        Some(watch::spawn_config_watcher(&config_path, events_tx.clone())?)
    } else {
        None
    };

    let signals = spawn_signal_listener(events_tx)?;
    info!(path = %config_path.display(), "taskmaster running");

    let result = supervisor.run(events_rx).await;
    signals.abort();
    result.map_err(Into::into)
}

/// Simple dry-run output: print every program with its resolved settings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("taskmaster dry-run");
    println!();
    println!("programs ({}):", cfg.len());
    for spec in cfg.programs().values() {
        print!("{spec}");
    }

    debug!("dry-run complete (no execution)");
}
