// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;

use super::*;

#[test]
fn agent_status_omits_empty_fields() {
    let status = AgentStatus::offline(None);
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["state"], "offline");
    assert!(json.get("connectedAt").is_none());
    assert!(json.get("lastError").is_none());
    assert!(json.get("latency").is_none());
}

#[test]
fn agent_status_online_carries_timestamp() {
    let now = Utc::now();
    let status = AgentStatus::online(now);
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["state"], "online");
    assert!(json.get("connectedAt").is_some());
}

#[test]
fn agent_status_serializes_latency_when_nonzero() {
    let status = AgentStatus { latency: 42, ..AgentStatus::online(Utc::now()) };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["latency"], 42);
}

#[test]
fn connecting_status_keeps_error_message() {
    let status = AgentStatus::connecting(Some("connection lost".to_string()));
    assert_eq!(status.state, AgentState::Connecting);
    assert_eq!(status.last_error, "connection lost");
    assert!(status.connected_at.is_none());
}

#[test]
fn endpoint_status_defaults_to_offline() {
    let status = EndpointStatus::offline();
    assert_eq!(status.state, EndpointState::Offline);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["state"], "offline");
    assert!(json.get("url").is_none());
    assert!(json.get("lastError").is_none());
}

#[test]
fn endpoint_status_online_keeps_url() {
    let status = EndpointStatus::online("https://x.example.dev");
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["state"], "online");
    assert_eq!(json["url"], "https://x.example.dev");
}

#[test]
fn endpoint_status_failed_keeps_error() {
    let status = EndpointStatus::failed("quota exceeded");
    assert_eq!(status.state, EndpointState::Failed);
    assert_eq!(status.last_error, "quota exceeded");
}
