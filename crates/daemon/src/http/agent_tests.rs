// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use burrow_core::{AgentState, EndpointState, ExpectedState};
use burrow_store::Store;
use serde_json::json;

use crate::http::test_fixtures::*;
use crate::http::{AgentResponse, EndpointsResponse, ErrorBody};

#[tokio::test]
async fn put_agent_online_connects_and_persists() {
    let app = test_app();

    let response = app.server.put("/agent").json(&agent_body("T", "online")).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: AgentResponse = response.json();
    assert_eq!(body.auth_token, "T");
    assert_eq!(body.expected_state, ExpectedState::Online);
    assert_eq!(body.status.state, AgentState::Online);
    assert!(body.status.connected_at.is_some());
    assert_eq!(body.status.last_error, "");

    let state = app.store.load().unwrap();
    assert_eq!(state.agent_config.auth_token, "T");
    assert_eq!(state.agent_config.expected_state, ExpectedState::Online);
    assert!(state.endpoint_configs.is_empty());
    assert_eq!(state.version, 1);
}

#[tokio::test]
async fn put_agent_twice_performs_one_create_and_one_connect() {
    let app = test_app();

    app.server.put("/agent").json(&agent_body("T", "online")).await;
    let response = app.server.put("/agent").json(&agent_body("T", "online")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AgentResponse = response.json();
    assert_eq!(body.status.state, AgentState::Online);

    // The second write is a no-op on the backend.
    assert_eq!(app.tunnels.create_count(), 1);
    assert_eq!(app.tunnels.connect_count(), 1);
}

#[tokio::test]
async fn get_agent_joins_config_and_live_status() {
    let app = test_app();
    app.server.put("/agent").json(&agent_body("T", "online")).await;

    let response = app.server.get("/agent").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: AgentResponse = response.json();
    assert_eq!(body.auth_token, "T");
    assert_eq!(body.status.state, AgentState::Online);
}

#[tokio::test]
async fn get_agent_on_fresh_state_is_offline() {
    let app = test_app();

    let response = app.server.get("/agent").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: AgentResponse = response.json();
    assert_eq!(body.auth_token, "");
    assert_eq!(body.expected_state, ExpectedState::Offline);
    assert_eq!(body.status.state, AgentState::Offline);
}

#[tokio::test]
async fn put_agent_offline_cascades_to_every_endpoint() {
    let app = test_app();
    app.server.put("/agent").json(&agent_body("T", "online")).await;
    app.server.post("/endpoints").json(&endpoint_body("c1", "8080", "online")).await;
    assert_eq!(app.tunnels.forward_count(), 1);

    let response = app.server.put("/agent").json(&agent_body("T", "offline")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AgentResponse = response.json();
    assert_eq!(body.status.state, AgentState::Offline);

    // The same atomic write took the endpoint's desired state offline.
    let state = app.store.load().unwrap();
    for endpoint in state.endpoint_configs.values() {
        assert_eq!(endpoint.expected_state, ExpectedState::Offline);
    }

    let listed: EndpointsResponse = app.server.get("/endpoints").await.json();
    assert_eq!(listed.endpoints.len(), 1);
    assert_eq!(listed.endpoints[0].expected_state, ExpectedState::Offline);
    assert_eq!(listed.endpoints[0].status.state, EndpointState::Offline);
    assert_eq!(app.tunnels.closed_forwarders().len(), 1);
}

#[tokio::test]
async fn connect_failure_keeps_desired_state_and_reports_error() {
    let app = test_app();
    app.tunnels.fail_next_connect("bad credentials");

    let response = app.server.put("/agent").json(&agent_body("T", "online")).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: AgentResponse = response.json();
    // The stated intent is durable even though the remote side refused.
    assert_eq!(body.expected_state, ExpectedState::Online);
    assert_eq!(body.status.state, AgentState::Offline);
    assert!(body.status.last_error.contains("bad credentials"));
}

#[tokio::test]
async fn token_change_rebuilds_session_and_forwarders() {
    let app = test_app();
    app.server.put("/agent").json(&agent_body("A", "online")).await;
    app.server.post("/endpoints").json(&endpoint_body("c1", "8080", "online")).await;
    assert_eq!(app.tunnels.forward_count(), 1);

    let response = app.server.put("/agent").json(&agent_body("B", "online")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: AgentResponse = response.json();
    assert_eq!(body.status.state, AgentState::Online);

    assert!(app.tunnels.session_tokens()[0].is_cancelled());
    assert_eq!(app.tunnels.closed_forwarders().len(), 1);
    assert_eq!(app.tunnels.forward_count(), 2);
    assert_eq!(app.tunnels.create_count(), 2);
}

#[tokio::test]
async fn malformed_body_is_rejected_with_error_shape() {
    let app = test_app();

    let response = app.server.put("/agent").text("{not json").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: ErrorBody = response.json();
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn unknown_expected_state_is_rejected() {
    let app = test_app();

    let response = app
        .server
        .put("/agent")
        .json(&json!({ "authToken": "T", "expectedState": "paused" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
