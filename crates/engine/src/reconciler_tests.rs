// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use burrow_adapters::ProtocolCaps;
use burrow_core::{AgentState, EndpointState, ExpectedState};

use super::ReconcilerConfig;
use crate::test_support::*;

#[tokio::test]
async fn ticker_converges_without_explicit_calls() {
    let rig = rig_with_config(ReconcilerConfig {
        converge_interval: Some(Duration::from_millis(20)),
        ..Default::default()
    });
    set_agent(&rig, agent_config("T", ExpectedState::Online));

    let reconciler = Arc::clone(&rig.reconciler);
    wait_until(move || reconciler.agent_status().state == AgentState::Online).await;
}

#[tokio::test]
async fn trigger_wakes_the_loop_ahead_of_the_ticker() {
    // Long ticker: only the trigger can explain a prompt convergence.
    let rig = rig_with_config(ReconcilerConfig {
        converge_interval: Some(Duration::from_secs(60)),
        ..Default::default()
    });
    set_agent(&rig, agent_config("T", ExpectedState::Online));

    rig.reconciler.trigger_converge();

    let reconciler = Arc::clone(&rig.reconciler);
    wait_until(move || reconciler.agent_status().state == AgentState::Online).await;
}

#[tokio::test]
async fn extra_triggers_coalesce_instead_of_blocking() {
    let rig = rig();
    // Ticker disabled: nothing consumes the slot; these must all return.
    for _ in 0..16 {
        rig.reconciler.trigger_converge();
    }
}

#[tokio::test]
async fn shutdown_cancels_session_and_closes_forwarders() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Online));
    rig.reconciler.converge().await.unwrap();

    rig.reconciler.shutdown().await;

    assert!(rig.tunnels.session_tokens()[0].is_cancelled());
    assert_eq!(rig.tunnels.closed_forwarders().len(), 1);

    let rt = rig.reconciler.runtime.lock().await;
    assert!(rt.agent.is_none());
    assert!(rt.forwarders.is_empty());
}

#[tokio::test]
async fn status_snapshots_are_copies() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let id = set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Online));
    rig.reconciler.converge().await.unwrap();

    let mut snapshot = rig.reconciler.endpoint_statuses();
    if let Some(status) = snapshot.get_mut(&id) {
        status.state = EndpointState::Failed;
    }

    assert_eq!(rig.reconciler.endpoint_statuses()[&id].state, EndpointState::Online);
}

#[tokio::test]
async fn detect_protocols_probes_the_bridge_host() {
    let rig = rig();
    rig.detector.set(ProtocolCaps { tcp: true, http: false, https: false, tls: true });

    let caps = rig.reconciler.detect_protocols("8443").await;
    assert!(caps.tls);
    assert!(!caps.http);
    assert_eq!(rig.detector.calls(), vec![("172.17.0.1".to_string(), "8443".to_string())]);
}

#[tokio::test]
async fn endpoint_status_without_entry_is_absent_until_converged() {
    let rig = rig();
    let id = set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Online));

    // Before any convergence there is no live entry; the read side
    // synthesizes offline for missing ids.
    assert!(rig.reconciler.endpoint_statuses().get(&id).is_none());
}
