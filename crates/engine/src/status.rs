// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live status board.
//!
//! Agent and endpoint status live behind their own narrow locks so that
//! readers and event handlers never wait on a convergence pass, and a
//! convergence pass blocked on a remote call never blocks them.

use std::collections::HashMap;

use burrow_core::{AgentState, AgentStatus, EndpointId, EndpointState, EndpointStatus};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Status message while an endpoint waits on a dead session's replacement.
pub(crate) const AGENT_DISCONNECTED: &str = "agent disconnected";

#[derive(Default)]
pub(crate) struct StatusBoard {
    agent: RwLock<AgentStatus>,
    endpoints: RwLock<HashMap<EndpointId, EndpointStatus>>,
}

impl StatusBoard {
    pub fn agent(&self) -> AgentStatus {
        self.agent.read().clone()
    }

    pub fn agent_state(&self) -> AgentState {
        self.agent.read().state
    }

    pub fn endpoints(&self) -> HashMap<EndpointId, EndpointStatus> {
        self.endpoints.read().clone()
    }

    pub fn endpoint_ids(&self) -> Vec<EndpointId> {
        self.endpoints.read().keys().cloned().collect()
    }

    pub fn set_agent_offline(&self, last_error: Option<String>) {
        *self.agent.write() = AgentStatus::offline(last_error);
    }

    pub fn set_agent_connecting(&self, last_error: Option<String>) {
        *self.agent.write() = AgentStatus::connecting(last_error);
    }

    pub fn set_agent_online(&self, connected_at: DateTime<Utc>) {
        *self.agent.write() = AgentStatus::online(connected_at);
    }

    /// Heartbeats only carry meaning for a live session.
    pub fn update_agent_latency(&self, latency_ms: u64) {
        let mut agent = self.agent.write();
        if agent.state == AgentState::Online {
            agent.latency = latency_ms;
        }
    }

    pub fn set_endpoint_offline(&self, id: &EndpointId) {
        self.endpoints.write().insert(id.clone(), EndpointStatus::offline());
    }

    pub fn set_endpoint_starting(&self, id: &EndpointId, last_error: &str) {
        self.endpoints.write().insert(id.clone(), EndpointStatus::starting(last_error));
    }

    pub fn set_endpoint_online(&self, id: &EndpointId, url: String) {
        self.endpoints.write().insert(id.clone(), EndpointStatus::online(url));
    }

    pub fn set_endpoint_failed(&self, id: &EndpointId, last_error: String) {
        self.endpoints.write().insert(id.clone(), EndpointStatus::failed(last_error));
    }

    /// Transient session loss: online endpoints wait it out, keeping their
    /// URL so a quick reconnect restores them unchanged.
    pub fn endpoints_agent_disconnected(&self) {
        let mut endpoints = self.endpoints.write();
        for status in endpoints.values_mut() {
            if status.state == EndpointState::Online {
                *status = EndpointStatus {
                    state: EndpointState::Starting,
                    url: status.url.clone(),
                    last_error: AGENT_DISCONNECTED.to_string(),
                };
            }
        }
    }

    /// The session is back: endpoints parked by a disconnect flip straight
    /// back online with the URL they already had.
    pub fn endpoints_agent_connected(&self) {
        let mut endpoints = self.endpoints.write();
        for status in endpoints.values_mut() {
            if status.state == EndpointState::Starting && status.last_error == AGENT_DISCONNECTED {
                *status = EndpointStatus {
                    state: EndpointState::Online,
                    url: status.url.clone(),
                    last_error: String::new(),
                };
            }
        }
    }

    /// Deliberate disconnect: every endpoint is down until the next
    /// convergence rebuilds whatever is still desired online.
    pub fn endpoints_all_offline(&self) {
        let mut endpoints = self.endpoints.write();
        for status in endpoints.values_mut() {
            *status = EndpointStatus::offline();
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
