// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunnel service seam.
//!
//! The engine drives these traits; a concrete backend binds them to a vendor
//! SDK. Session lifetime is owned by the caller through a
//! [`CancellationToken`] so that a hung remote call can always be abandoned
//! by cancelling rather than by blocking on a disconnect.

mod noop;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use noop::NoopTunnelFactory;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTunnelFactory, ForwardCall, RecordedAgentOptions};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors from the tunnel backend.
#[derive(Debug, Clone, Error)]
pub enum TunnelError {
    #[error("tunnel backend unavailable: {0}")]
    Unavailable(String),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("forward failed: {0}")]
    Forward(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Events emitted by a live agent session.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    ConnectSucceeded,
    /// `error` is `None` for a deliberate disconnect and carries the cause
    /// for a transient connection loss.
    Disconnected { error: Option<String> },
    HeartbeatReceived { latency: Duration },
}

/// Options for creating an agent session.
#[derive(Clone)]
pub struct AgentOptions {
    /// Client info reported to the tunnel service.
    pub client_name: String,
    pub client_version: String,
    pub auth_token: Option<String>,
    pub connect_url: Option<String>,
    /// Channel the session emits [`AgentEvent`]s on.
    pub events: mpsc::Sender<AgentEvent>,
}

/// Local address a forwarder delivers traffic to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub scheme: String,
    pub host: String,
    pub port: String,
    /// Skip certificate verification when dialing the upstream over TLS.
    pub tls_skip_verify: bool,
}

impl Upstream {
    pub fn addr(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr())
    }
}

/// Options for creating a forwarder. Optional fields are only applied when
/// set; pooling is always applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwarderOptions {
    pub url: Option<String>,
    pub binding: Option<String>,
    pub pooling_enabled: bool,
    pub traffic_policy: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<String>,
}

/// Creates agent sessions.
pub trait TunnelFactory: Send + Sync {
    fn create_agent(&self, opts: AgentOptions) -> Result<Arc<dyn TunnelAgent>, TunnelError>;
}

/// A session to the remote tunnel service.
#[async_trait]
pub trait TunnelAgent: Send + Sync {
    /// Connect the session. `session` spans the lifetime of the whole
    /// session, not just the dial; cancelling it tears the session down.
    async fn connect(&self, session: CancellationToken) -> Result<(), TunnelError>;

    /// Open a public endpoint forwarding to `upstream`.
    async fn forward(
        &self,
        session: CancellationToken,
        upstream: Upstream,
        opts: ForwarderOptions,
    ) -> Result<Arc<dyn Forwarder>, TunnelError>;
}

/// A single public-endpoint → local-upstream binding owned by an agent.
#[async_trait]
pub trait Forwarder: Send + Sync {
    fn id(&self) -> String;

    /// Public URL of the remote endpoint.
    fn url(&self) -> String;

    /// Best-effort close; errors are swallowed by the backend.
    async fn close(&self);
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
