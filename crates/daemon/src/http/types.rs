// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DTO structs for the HTTP API.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::{
    AgentConfig, AgentStatus, EndpointConfig, EndpointId, EndpointStatus, ExpectedState, State,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error body shared by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

/// PUT /agent request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    #[serde(default)]
    pub auth_token: String,
    #[serde(default, rename = "connectURL")]
    pub connect_url: Option<String>,
    pub expected_state: ExpectedState,
}

impl AgentRequest {
    pub(crate) fn into_config(self) -> AgentConfig {
        AgentConfig {
            auth_token: self.auth_token,
            connect_url: self.connect_url.filter(|u| !u.is_empty()),
            expected_state: self.expected_state,
        }
    }
}

/// Agent config joined with live status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub auth_token: String,
    #[serde(default, rename = "connectURL", skip_serializing_if = "Option::is_none")]
    pub connect_url: Option<String>,
    pub expected_state: ExpectedState,
    pub status: AgentStatus,
}

impl AgentResponse {
    pub(crate) fn join(state: &State, status: AgentStatus) -> Self {
        Self {
            auth_token: state.agent_config.auth_token.clone(),
            connect_url: state.agent_config.connect_url.clone(),
            expected_state: state.agent_config.expected_state,
            status,
        }
    }
}

/// POST /endpoints and PUT /endpoints/{id} request body.
///
/// `expected_state` stays a raw string here so validation can produce the
/// precise per-field errors instead of a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRequest {
    #[serde(default)]
    pub container_id: String,
    #[serde(default)]
    pub target_port: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub binding: Option<String>,
    #[serde(default)]
    pub pooling_enabled: bool,
    #[serde(default)]
    pub traffic_policy: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub expected_state: String,
}

impl EndpointRequest {
    /// Validate required fields, returning the parsed desired state.
    pub(crate) fn validate(&self) -> Result<ExpectedState, Response> {
        if self.container_id.is_empty() {
            return Err(error_response(StatusCode::BAD_REQUEST, "containerId is required"));
        }
        if self.target_port.is_empty() {
            return Err(error_response(StatusCode::BAD_REQUEST, "targetPort is required"));
        }
        if self.expected_state.is_empty() {
            return Err(error_response(StatusCode::BAD_REQUEST, "expectedState is required"));
        }
        match self.expected_state.as_str() {
            "online" => Ok(ExpectedState::Online),
            "offline" => Ok(ExpectedState::Offline),
            _ => Err(error_response(
                StatusCode::BAD_REQUEST,
                "expectedState must be 'online' or 'offline'",
            )),
        }
    }
}

/// Endpoint config joined with live status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResponse {
    pub id: EndpointId,
    pub container_id: String,
    pub target_port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    pub pooling_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub expected_state: ExpectedState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started: Option<DateTime<Utc>>,
    pub status: EndpointStatus,
}

impl EndpointResponse {
    /// Join one persisted config with the live status map. An endpoint with
    /// no live entry is synthesized as offline.
    pub(crate) fn join(
        config: &EndpointConfig,
        statuses: &HashMap<EndpointId, EndpointStatus>,
    ) -> Self {
        let status = statuses.get(&config.id).cloned().unwrap_or_default();
        Self {
            id: config.id.clone(),
            container_id: config.container_id.clone(),
            target_port: config.target_port.clone(),
            url: config.url.clone(),
            binding: config.binding.clone(),
            pooling_enabled: config.pooling_enabled,
            traffic_policy: config.traffic_policy.clone(),
            description: config.description.clone(),
            metadata: config.metadata.clone(),
            expected_state: config.expected_state,
            last_started: config.last_started,
            status,
        }
    }
}

/// GET /endpoints response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsResponse {
    pub endpoints: Vec<EndpointResponse>,
}

/// POST /detect_protocol request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectProtocolRequest {
    #[serde(default)]
    pub container_id: String,
    #[serde(default)]
    pub port: String,
}

/// POST /detect_protocol response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectProtocolResponse {
    pub tcp: bool,
    pub http: bool,
    pub https: bool,
    pub tls: bool,
}

impl From<burrow_adapters::ProtocolCaps> for DetectProtocolResponse {
    fn from(caps: burrow_adapters::ProtocolCaps) -> Self {
        Self { tcp: caps.tcp, http: caps.http, https: caps.https, tls: caps.tls }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
