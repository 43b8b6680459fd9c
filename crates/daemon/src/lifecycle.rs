// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, socket binding, shutdown cleanup.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::env;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix socket the HTTP API listens on
    pub socket_path: PathBuf,
    /// Path to the persisted state file
    pub state_path: PathBuf,
}

impl Config {
    /// Resolve configuration from flags, falling back to the state dir for
    /// the state file.
    pub fn load(
        socket_path: PathBuf,
        state_path: Option<PathBuf>,
    ) -> Result<Self, LifecycleError> {
        let state_path = match state_path {
            Some(path) => path,
            None => env::state_dir()?.join("state.json"),
        };
        Ok(Self { socket_path, state_path })
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind the API socket, removing any stale socket file first.
pub fn bind_socket(path: &Path) -> Result<UnixListener, LifecycleError> {
    if path.exists() {
        warn!(path = %path.display(), "removing stale socket file");
        fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let listener = UnixListener::bind(path)
        .map_err(|e| LifecycleError::BindFailed(path.to_path_buf(), e))?;
    info!(path = %path.display(), "listening");
    Ok(listener)
}

/// Remove the socket file on shutdown; best effort.
pub fn remove_socket(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "failed to remove socket file");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
