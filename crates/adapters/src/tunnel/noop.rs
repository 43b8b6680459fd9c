// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-backend tunnel factory.
//!
//! Used when no vendor SDK is linked into the build. Agents are created but
//! every connect fails with a clear error, so the daemon runs and the agent
//! status reports offline with `lastError` set instead of silently lying.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{
    AgentOptions, Forwarder, ForwarderOptions, TunnelAgent, TunnelError, TunnelFactory, Upstream,
};

pub struct NoopTunnelFactory;

impl TunnelFactory for NoopTunnelFactory {
    fn create_agent(&self, _opts: AgentOptions) -> Result<Arc<dyn TunnelAgent>, TunnelError> {
        Ok(Arc::new(NoopTunnelAgent))
    }
}

struct NoopTunnelAgent;

#[async_trait]
impl TunnelAgent for NoopTunnelAgent {
    async fn connect(&self, _session: CancellationToken) -> Result<(), TunnelError> {
        Err(TunnelError::Unavailable("no tunnel backend configured".to_string()))
    }

    async fn forward(
        &self,
        _session: CancellationToken,
        _upstream: Upstream,
        _opts: ForwarderOptions,
    ) -> Result<Arc<dyn Forwarder>, TunnelError> {
        Err(TunnelError::Unavailable("no tunnel backend configured".to_string()))
    }
}
