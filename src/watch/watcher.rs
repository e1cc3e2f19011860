// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::supervisor::SupervisorEvent;
use crate::watch::hash::ContentFingerprint;

/// Handle for the config watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping it stops
/// watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `config_path` and send [`SupervisorEvent::Reload`] whenever its
/// content changes.
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by renaming over the file are still picked up.
pub fn spawn_config_watcher(
    config_path: impl Into<PathBuf>,
    events_tx: mpsc::Sender<SupervisorEvent>,
) -> Result<WatcherHandle> {
    let config_path = config_path.into();
    let config_path = config_path.canonicalize().unwrap_or(config_path);
    let dir = watch_dir(&config_path);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("taskmaster: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("taskmaster: config watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching directory {:?}", dir))?;

    info!(path = %config_path.display(), "config watcher started");

    let mut fingerprint = ContentFingerprint::of(&config_path);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_relevant(&event, &config_path) {
                continue;
            }
            debug!(?event, "config file event");

            match fingerprint.refresh(&config_path) {
                Ok(true) => {
                    info!(path = %config_path.display(), "config file changed; requesting reload");
                    if events_tx.send(SupervisorEvent::Reload).await.is_err() {
                        break;
                    }
                }
                Ok(false) => debug!("config file touched but content unchanged"),
                // Mid-save; a later event will pick up the final content.
                Err(e) => warn!(error = %e, "could not read config file"),
            }
        }
        debug!("config watcher loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

fn watch_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_relevant(event: &Event, config_path: &Path) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    let file_name = config_path.file_name();
    event
        .paths
        .iter()
        .any(|p| p == config_path || (file_name.is_some() && p.file_name() == file_name))
}
