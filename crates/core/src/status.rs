// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live runtime status types.
//!
//! Never persisted; always derived from what the engine is actually doing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Runtime state of the agent session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Online,
    #[default]
    Offline,
    Connecting,
}

/// Runtime status of the agent session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub state: AgentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_error: String,
    /// Connection latency from the most recent heartbeat, in milliseconds.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub latency: u64,
}

impl AgentStatus {
    pub fn offline(last_error: Option<String>) -> Self {
        Self {
            state: AgentState::Offline,
            connected_at: None,
            last_error: last_error.unwrap_or_default(),
            latency: 0,
        }
    }

    pub fn connecting(last_error: Option<String>) -> Self {
        Self {
            state: AgentState::Connecting,
            connected_at: None,
            last_error: last_error.unwrap_or_default(),
            latency: 0,
        }
    }

    pub fn online(connected_at: DateTime<Utc>) -> Self {
        Self {
            state: AgentState::Online,
            connected_at: Some(connected_at),
            last_error: String::new(),
            latency: 0,
        }
    }
}

/// Runtime state of an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointState {
    Online,
    #[default]
    Offline,
    Starting,
    Failed,
}

/// Runtime status of an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    pub state: EndpointState,
    /// Public URL, populated once the forwarder is up.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_error: String,
}

impl EndpointStatus {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn starting(last_error: impl Into<String>) -> Self {
        Self {
            state: EndpointState::Starting,
            url: String::new(),
            last_error: last_error.into(),
        }
    }

    pub fn online(url: impl Into<String>) -> Self {
        Self { state: EndpointState::Online, url: url.into(), last_error: String::new() }
    }

    pub fn failed(last_error: impl Into<String>) -> Self {
        Self {
            state: EndpointState::Failed,
            url: String::new(),
            last_error: last_error.into(),
        }
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
