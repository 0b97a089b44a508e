//! Save files for snapshots.
//!
//! Files ending in `.ron` hold the readable text encoding; anything else
//! gets the compact binary one.

use std::path::Path;

use thiserror::Error;
use warband_core::error::GameError;
use warband_core::snapshot::Snapshot;

use crate::scenario::ScenarioError;

/// Error type for headless runs.
#[derive(Error, Debug)]
pub enum RunError {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The core rejected a snapshot.
    #[error(transparent)]
    Game(#[from] GameError),
    /// The scenario could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// On-disk snapshot encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// RON text.
    Ron,
    /// bincode.
    Binary,
}

impl SaveFormat {
    /// Pick the encoding from a path's extension.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Binary,
        }
    }
}

/// Write a snapshot to `path`.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), RunError> {
    let format = SaveFormat::for_path(path);
    match format {
        SaveFormat::Ron => std::fs::write(path, snapshot.to_ron()?)?,
        SaveFormat::Binary => std::fs::write(path, snapshot.to_bytes()?)?,
    }
    tracing::info!(path = %path.display(), ?format, tick = snapshot.tick, "Snapshot saved");
    Ok(())
}

/// Read a snapshot from `path`.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, RunError> {
    let snapshot = match SaveFormat::for_path(path) {
        SaveFormat::Ron => Snapshot::from_ron(&std::fs::read_to_string(path)?)?,
        SaveFormat::Binary => Snapshot::from_bytes(&std::fs::read(path)?)?,
    };
    tracing::info!(path = %path.display(), tick = snapshot.tick, "Snapshot loaded");
    Ok(snapshot)
}
