// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted declarative configuration.
//!
//! These types are the durable record of user intent. Runtime status never
//! lives here; it is derived live by the engine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EndpointId;

/// Schema version of the persisted state file.
pub const STATE_VERSION: u32 = 1;

/// Desired on/off state for the agent or an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedState {
    Online,
    #[default]
    Offline,
}

impl ExpectedState {
    pub fn is_online(self) -> bool {
        matches!(self, ExpectedState::Online)
    }
}

/// Desired agent configuration: credentials, connect target, on/off intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default)]
    pub auth_token: String,
    #[serde(default, rename = "connectURL", skip_serializing_if = "Option::is_none")]
    pub connect_url: Option<String>,
    #[serde(default)]
    pub expected_state: ExpectedState,
}

/// Desired endpoint configuration, keyed by [`EndpointId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub id: EndpointId,
    pub container_id: String,
    pub target_port: String,
    /// Public URL hint for the remote endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(default)]
    pub pooling_enabled: bool,
    /// Opaque traffic-policy document; passed through to the tunnel service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default)]
    pub expected_state: ExpectedState,
    /// Stamped on every write that sets the endpoint online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started: Option<DateTime<Utc>>,
}

/// Root persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default)]
    pub agent_config: AgentConfig,
    #[serde(default)]
    pub endpoint_configs: HashMap<EndpointId, EndpointConfig>,
    pub version: u32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            agent_config: AgentConfig::default(),
            endpoint_configs: HashMap::new(),
            version: STATE_VERSION,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
