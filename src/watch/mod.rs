// src/watch/mod.rs

//! Config file watching.
//!
//! Turns changes to the programs file into reload requests for the
//! supervisor loop:
//! - [`watcher`] wires up a `notify` watcher on the file's directory.
//! - [`hash`] fingerprints the file so that touching it without changing
//!   its content does not trigger a reload.

pub mod hash;
pub mod watcher;

pub use hash::{ContentFingerprint, compute_file_hash};
pub use watcher::{WatcherHandle, spawn_config_watcher};
