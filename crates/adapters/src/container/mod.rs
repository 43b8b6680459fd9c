// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runtime seam.
//!
//! The daemon only ever asks one question of the container runtime: does
//! this container exist and is it running. The production inspector speaks
//! the Docker Engine API over its Unix socket with a minimal HTTP/1.0
//! client; HTTP/1.0 keeps the response un-chunked and connection-closed.

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeContainerInspector;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// What the runtime reports about a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub running: bool,
}

#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    #[error("container runtime unreachable: {0}")]
    Unreachable(String),

    #[error("container not found: {0}")]
    NotFound(String),

    #[error("malformed container runtime response: {0}")]
    Malformed(String),
}

/// Looks up container state in the container runtime.
#[async_trait]
pub trait ContainerInspector: Send + Sync {
    async fn inspect(&self, container_id: &str) -> Result<ContainerInfo, ContainerError>;
}

/// Inspector talking to the Docker Engine API over its Unix socket.
pub struct DockerInspector {
    socket_path: PathBuf,
}

impl DockerInspector {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }
}

impl Default for DockerInspector {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_SOCKET)
    }
}

#[async_trait]
impl ContainerInspector for DockerInspector {
    async fn inspect(&self, container_id: &str) -> Result<ContainerInfo, ContainerError> {
        // Container ids and names are path segments in the Engine API.
        if container_id.is_empty()
            || !container_id.chars().all(|c| c.is_ascii_alphanumeric() || "_.-".contains(c))
        {
            return Err(ContainerError::NotFound(container_id.to_string()));
        }

        let request = format!("GET /containers/{container_id}/json HTTP/1.0\r\nHost: docker\r\n\r\n");
        let response = timeout(REQUEST_TIMEOUT, self.round_trip(&request))
            .await
            .map_err(|_| ContainerError::Unreachable("request timed out".to_string()))??;

        parse_inspect_response(container_id, &response)
    }
}

impl DockerInspector {
    async fn round_trip(&self, request: &str) -> Result<Vec<u8>, ContainerError> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| ContainerError::Unreachable(e.to_string()))?;
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| ContainerError::Unreachable(e.to_string()))?;

        let mut response = Vec::new();
        stream
            .read_to_end(&mut response)
            .await
            .map_err(|e| ContainerError::Unreachable(e.to_string()))?;
        Ok(response)
    }
}

fn parse_inspect_response(
    container_id: &str,
    response: &[u8],
) -> Result<ContainerInfo, ContainerError> {
    let text = String::from_utf8_lossy(response);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return Err(ContainerError::Malformed("no header/body separator".to_string()));
    };

    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| ContainerError::Malformed("bad status line".to_string()))?;

    match status {
        200 => {
            let json: serde_json::Value = serde_json::from_str(body)
                .map_err(|e| ContainerError::Malformed(e.to_string()))?;
            let running = json["State"]["Running"].as_bool().unwrap_or(false);
            Ok(ContainerInfo { id: container_id.to_string(), running })
        }
        404 => Err(ContainerError::NotFound(container_id.to_string())),
        other => Err(ContainerError::Malformed(format!("unexpected status {other}"))),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
