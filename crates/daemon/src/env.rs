// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Default Unix socket path inside the extension VM.
pub const DEFAULT_SOCKET_PATH: &str = "/run/guest/ext.sock";

/// Resolve state directory: BURROW_STATE_DIR > XDG_STATE_HOME/burrow > ~/.local/state/burrow
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("BURROW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("burrow"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/burrow"))
}

/// Extension version forwarded as client info to the tunnel service.
pub fn extension_version() -> String {
    std::env::var("BURROW_EXTENSION_VERSION")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}

/// Periodic converge interval (default 10s, via `BURROW_CONVERGE_INTERVAL_MS`).
pub fn converge_interval() -> Duration {
    std::env::var("BURROW_CONVERGE_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Container-bridge gateway host upstreams are dialed through.
/// Overridable for non-default bridge networks via `BURROW_BRIDGE_HOST`.
pub fn bridge_host() -> String {
    std::env::var("BURROW_BRIDGE_HOST")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "172.17.0.1".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
