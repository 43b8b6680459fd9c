// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-endpoint lifecycle: create, close, recreate on config change.

use std::collections::HashMap;
use std::sync::Arc;

use burrow_adapters::{Forwarder, TunnelError};
use burrow_core::{Clock, EndpointConfig, EndpointId, ExpectedState};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;
use tracing::debug;

use crate::reconciler::{Reconciler, RuntimeState, FORWARD_WAIT};
use crate::upstream;
use crate::EngineError;

/// Endpoint status message while no agent session exists to forward through.
pub(crate) const WAITING_FOR_AGENT: &str = "waiting for connection to ngrok cloud";

/// Completion of a forwarder build, delivered inline when it beats the
/// bounded wait and through the outcome queue otherwise.
pub(crate) struct ForwardOutcome {
    pub id: EndpointId,
    pub hash: String,
    pub result: Result<Arc<dyn Forwarder>, TunnelError>,
}

impl<C: Clock> Reconciler<C> {
    pub(crate) async fn converge_endpoints(
        &self,
        rt: &mut RuntimeState,
        configs: &HashMap<EndpointId, EndpointConfig>,
    ) -> Result<(), EngineError> {
        for (id, config) in configs {
            match config.expected_state {
                ExpectedState::Online => self.handle_endpoint_online(rt, id, config).await,
                ExpectedState::Offline => self.drop_endpoint(rt, id).await,
            }
        }

        // Garbage-collect runtime bindings for endpoints that no longer
        // exist in the desired configuration.
        let stale: Vec<EndpointId> = rt
            .forwarders
            .keys()
            .chain(rt.pending_forwards.keys())
            .filter(|id| !configs.contains_key(*id))
            .cloned()
            .collect();
        for id in stale {
            self.drop_endpoint(rt, &id).await;
        }
        Ok(())
    }

    async fn handle_endpoint_online(
        &self,
        rt: &mut RuntimeState,
        id: &EndpointId,
        config: &EndpointConfig,
    ) {
        let forwarder_exists = rt.forwarders.contains_key(id);
        let hash = forwarder_hash(config);
        let config_changed = rt.config_hashes.get(id) != Some(&hash);

        if !forwarder_exists || config_changed {
            self.create_or_update_endpoint(rt, id, config, hash, forwarder_exists, config_changed)
                .await;
        }
    }

    /// Close and evict an endpoint's runtime bindings, setting it offline.
    /// Used for desired-offline, deleted, and agent-teardown paths alike.
    pub(crate) async fn drop_endpoint(&self, rt: &mut RuntimeState, id: &EndpointId) {
        if let Some(forwarder) = rt.forwarders.remove(id) {
            debug!(endpoint = %id, "closing forwarder");
            forwarder.close().await;
        }
        rt.config_hashes.remove(id);
        rt.pending_forwards.remove(id);
        self.status.set_endpoint_offline(id);
    }

    async fn create_or_update_endpoint(
        &self,
        rt: &mut RuntimeState,
        id: &EndpointId,
        config: &EndpointConfig,
        hash: String,
        forwarder_exists: bool,
        config_changed: bool,
    ) {
        if forwarder_exists && config_changed {
            if let Some(forwarder) = rt.forwarders.remove(id) {
                debug!(endpoint = %id, "config changed, closing forwarder");
                forwarder.close().await;
            }
            rt.config_hashes.remove(id);
        }

        let Some(agent) = rt.agent.clone() else {
            self.status.set_endpoint_starting(id, WAITING_FOR_AGENT);
            return;
        };

        if rt.pending_forwards.contains_key(id) {
            // A build for this endpoint is already in flight.
            return;
        }

        self.status.set_endpoint_starting(id, "");
        rt.pending_forwards.insert(id.clone(), hash.clone());

        let session = rt.agent_cancel.clone().unwrap_or_default();
        let (done_tx, done_rx) = oneshot::channel::<ForwardOutcome>();
        let status = Arc::clone(&self.status);
        let outcome_tx = self.outcome_tx.clone();
        let detector = Arc::clone(&self.detector);
        let bridge_host = self.config.bridge_host.clone();
        let config = config.clone();
        let id = id.clone();

        tokio::spawn(async move {
            let target = upstream::build(detector.as_ref(), &bridge_host, &config).await;
            let opts = upstream::forwarder_options(&config);
            let result = agent.forward(session, target, opts).await;

            match &result {
                Ok(forwarder) => status.set_endpoint_online(&id, forwarder.url()),
                Err(e) => {
                    status.set_endpoint_failed(&id, format!("failed to create endpoint: {e}"));
                }
            }

            let outcome = ForwardOutcome { id, hash, result };
            if let Err(outcome) = done_tx.send(outcome) {
                // The inline wait expired; deliver through the queue so the
                // next pass records the binding under the coarse mutex.
                let _ = outcome_tx.send(outcome);
            }
        });

        match tokio::time::timeout(FORWARD_WAIT, done_rx).await {
            Ok(Ok(outcome)) => self.record_forward_outcome(rt, outcome),
            _ => {}
        }
    }

    pub(crate) fn drain_forward_outcomes(&self, rt: &mut RuntimeState) {
        while let Ok(outcome) = rt.outcomes.try_recv() {
            self.record_forward_outcome(rt, outcome);
        }
    }

    pub(crate) fn record_forward_outcome(&self, rt: &mut RuntimeState, outcome: ForwardOutcome) {
        let current = rt.pending_forwards.get(&outcome.id) == Some(&outcome.hash);
        if current {
            rt.pending_forwards.remove(&outcome.id);
        }

        match outcome.result {
            Ok(forwarder) => {
                if current {
                    rt.forwarders.insert(outcome.id.clone(), forwarder);
                    rt.config_hashes.insert(outcome.id, outcome.hash);
                } else {
                    // Superseded while in flight: the endpoint was dropped or
                    // reconfigured. The fresh forwarder must not leak.
                    tokio::spawn(async move { forwarder.close().await });
                }
            }
            Err(_) => {
                // Status was already set to failed by the forward task; the
                // entry stays eligible for retry on the next pass.
            }
        }
    }
}

/// Hash of the forwarder-relevant subset of an endpoint config. Changing any
/// of these fields requires recreating the forwarder; changing anything else
/// must not.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ForwarderFacet<'a> {
    url: &'a Option<String>,
    binding: &'a Option<String>,
    pooling_enabled: bool,
    traffic_policy: &'a Option<String>,
    metadata: &'a Option<String>,
    description: &'a Option<String>,
    target_port: &'a str,
}

pub fn forwarder_hash(config: &EndpointConfig) -> String {
    let facet = ForwarderFacet {
        url: &config.url,
        binding: &config.binding,
        pooling_enabled: config.pooling_enabled,
        traffic_policy: &config.traffic_policy,
        metadata: &config.metadata,
        description: &config.description,
        target_port: &config.target_port,
    };
    match serde_json::to_vec(&facet) {
        Ok(canonical) => format!("{:x}", Sha256::digest(&canonical)),
        // A struct of strings and bools cannot fail to serialize.
        Err(_) => String::new(),
    }
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod tests;
