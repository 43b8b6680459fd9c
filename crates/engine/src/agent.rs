// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session state machine.

use std::sync::Arc;

use burrow_adapters::AgentOptions;
use burrow_core::{AgentConfig, AgentState, Clock, EndpointId, ExpectedState};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::reconciler::{Reconciler, RuntimeState, CONNECT_WAIT};
use crate::EngineError;

impl<C: Clock> Reconciler<C> {
    pub(crate) async fn converge_agent(
        &self,
        rt: &mut RuntimeState,
        config: AgentConfig,
    ) -> Result<(), EngineError> {
        match config.expected_state {
            ExpectedState::Offline => self.handle_agent_offline(rt).await,
            ExpectedState::Online => self.handle_agent_online(rt, &config).await?,
        }
        rt.agent_config = config;
        Ok(())
    }

    async fn handle_agent_offline(&self, rt: &mut RuntimeState) {
        self.disconnect_agent(rt).await;
        self.status.set_agent_offline(None);
    }

    async fn handle_agent_online(
        &self,
        rt: &mut RuntimeState,
        config: &AgentConfig,
    ) -> Result<(), EngineError> {
        let config_changed = agent_config_changed(&rt.agent_config, config);
        let was_offline = self.status.agent_state() == AgentState::Offline;

        // A held handle is stale when the config changed, or when the
        // runtime status says offline while the handle still exists (the
        // remote side disconnected deliberately). Either way the session and
        // every forwarder it owned are dead; tear down and rebuild.
        if rt.agent.is_some() && (config_changed || was_offline) {
            self.disconnect_agent(rt).await;
        }

        let created = rt.agent.is_none();
        if created {
            self.create_agent(rt, config)?;
        }

        if created || config_changed || was_offline {
            self.connect_agent(rt).await;
        }
        Ok(())
    }

    fn create_agent(&self, rt: &mut RuntimeState, config: &AgentConfig) -> Result<(), EngineError> {
        let opts = AgentOptions {
            client_name: self.config.client_name.clone(),
            client_version: self.config.client_version.clone(),
            auth_token: Some(config.auth_token.clone()).filter(|t| !t.is_empty()),
            connect_url: config.connect_url.clone().filter(|u| !u.is_empty()),
            events: self.event_tx.clone(),
        };

        match self.tunnels.create_agent(opts) {
            Ok(agent) => {
                rt.agent = Some(agent);
                Ok(())
            }
            Err(e) => {
                self.status.set_agent_offline(Some(e.to_string()));
                Err(EngineError::Tunnel(e))
            }
        }
    }

    async fn connect_agent(&self, rt: &mut RuntimeState) {
        // Status flips to connecting before the dial so a hung attempt is
        // visible for what it is.
        self.status.set_agent_connecting(None);

        // The session token is owned here, never borrowed from a request:
        // the backend treats it as the lifetime of the whole session.
        let session = CancellationToken::new();
        rt.agent_cancel = Some(session.clone());

        let Some(agent) = rt.agent.clone() else {
            return;
        };

        let (done_tx, done_rx) = oneshot::channel::<()>();
        let status = Arc::clone(&self.status);
        let clock = self.clock.clone();
        tokio::spawn(async move {
            match agent.connect(session).await {
                Ok(()) => {
                    info!("agent connected");
                    status.set_agent_online(clock.now());
                }
                Err(e) => {
                    info!(error = %e, "agent connect failed");
                    status.set_agent_offline(Some(e.to_string()));
                }
            }
            let _ = done_tx.send(());
        });

        // Happy path: the dial completes quickly and the caller's response
        // already reports online. A slow dial leaves status at connecting;
        // the spawned task delivers the outcome whenever it lands.
        let _ = tokio::time::timeout(CONNECT_WAIT, done_rx).await;
    }

    /// Tear the session down by cancelling its token. Never calls a blocking
    /// disconnect on the backend; a hung remote call must not hang us.
    pub(crate) async fn disconnect_agent(&self, rt: &mut RuntimeState) {
        if let Some(cancel) = rt.agent_cancel.take() {
            cancel.cancel();
        }
        if rt.agent.take().is_some() {
            debug!("agent session dropped");
        }

        // Forwarders die with the session. Clear their bindings so the next
        // convergence pass rebuilds whatever is still desired online.
        let ids: Vec<EndpointId> = self.status.endpoint_ids();
        for id in ids {
            self.drop_endpoint(rt, &id).await;
        }
    }
}

/// Reconnection is required only when connection-affecting fields change.
fn agent_config_changed(last: &AgentConfig, next: &AgentConfig) -> bool {
    last.auth_token != next.auth_token || last.connect_url != next.connect_url
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
