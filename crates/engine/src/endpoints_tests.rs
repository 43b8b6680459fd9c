// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use burrow_core::{Clock, EndpointConfig, EndpointState, ExpectedState};

use super::forwarder_hash;
use crate::test_support::*;

#[tokio::test]
async fn forward_success_records_binding_and_url() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let config = endpoint_config("c1", "8080", ExpectedState::Online);
    let id = set_endpoint(&rig, config.clone());

    rig.reconciler.converge().await.unwrap();

    let statuses = rig.reconciler.endpoint_statuses();
    assert_eq!(statuses[&id].state, EndpointState::Online);
    assert!(!statuses[&id].url.is_empty());
    assert_eq!(rig.tunnels.forward_count(), 1);

    let rt = rig.reconciler.runtime.lock().await;
    assert!(rt.forwarders.contains_key(&id));
    assert_eq!(rt.config_hashes.get(&id), Some(&forwarder_hash(&config)));
    assert!(rt.pending_forwards.is_empty());
}

#[tokio::test]
async fn endpoint_waits_while_no_session_exists() {
    let rig = rig();
    // Desired endpoint online but no agent session (agent desired offline).
    let id = set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Online));

    rig.reconciler.converge().await.unwrap();

    let statuses = rig.reconciler.endpoint_statuses();
    assert_eq!(statuses[&id].state, EndpointState::Starting);
    assert_eq!(statuses[&id].last_error, "waiting for connection to ngrok cloud");
    assert_eq!(rig.tunnels.forward_count(), 0);
}

#[tokio::test]
async fn forward_failure_marks_failed_and_retries_next_pass() {
    let rig = rig();
    rig.tunnels.fail_next_forward("quota exceeded");
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let id = set_endpoint(&rig, endpoint_config("c1", "9000", ExpectedState::Online));

    rig.reconciler.converge().await.unwrap();

    let statuses = rig.reconciler.endpoint_statuses();
    assert_eq!(statuses[&id].state, EndpointState::Failed);
    assert!(statuses[&id].last_error.contains("quota exceeded"));
    {
        let rt = rig.reconciler.runtime.lock().await;
        assert!(rt.forwarders.is_empty());
        assert!(rt.config_hashes.is_empty());
    }

    // Next pass retries with the queue exhausted and comes up online.
    rig.reconciler.converge().await.unwrap();
    let statuses = rig.reconciler.endpoint_statuses();
    assert_eq!(statuses[&id].state, EndpointState::Online);
    assert!(!statuses[&id].url.is_empty());
}

#[tokio::test]
async fn config_change_recreates_the_forwarder() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let mut config = endpoint_config("c1", "8080", ExpectedState::Online);
    let id = set_endpoint(&rig, config.clone());
    rig.reconciler.converge().await.unwrap();
    assert_eq!(rig.tunnels.forward_count(), 1);

    config.url = Some("https://app.example.dev".to_string());
    set_endpoint(&rig, config.clone());
    rig.reconciler.converge().await.unwrap();

    assert_eq!(rig.tunnels.closed_forwarders().len(), 1);
    assert_eq!(rig.tunnels.forward_count(), 2);

    let rt = rig.reconciler.runtime.lock().await;
    assert_eq!(rt.config_hashes.get(&id), Some(&forwarder_hash(&config)));
}

#[tokio::test]
async fn unchanged_config_does_not_touch_the_forwarder() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let config = endpoint_config("c1", "8080", ExpectedState::Online);
    set_endpoint(&rig, config.clone());
    rig.reconciler.converge().await.unwrap();

    // Timestamp-only rewrite; the forwarder-relevant subset is unchanged.
    let mut rewritten = config.clone();
    rewritten.last_started = Some(rig.clock.now());
    set_endpoint(&rig, rewritten);
    rig.reconciler.converge().await.unwrap();

    assert_eq!(rig.tunnels.forward_count(), 1);
    assert!(rig.tunnels.closed_forwarders().is_empty());
}

#[tokio::test]
async fn desired_offline_closes_the_forwarder() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let id = set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Online));
    rig.reconciler.converge().await.unwrap();

    set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Offline));
    rig.reconciler.converge().await.unwrap();

    assert_eq!(rig.tunnels.closed_forwarders().len(), 1);
    assert_eq!(rig.reconciler.endpoint_statuses()[&id].state, EndpointState::Offline);

    let rt = rig.reconciler.runtime.lock().await;
    assert!(rt.forwarders.is_empty());
    assert!(rt.config_hashes.is_empty());
}

#[tokio::test]
async fn deleted_endpoint_is_garbage_collected() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let id = set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Online));
    rig.reconciler.converge().await.unwrap();

    remove_endpoint(&rig, &id);
    rig.reconciler.converge().await.unwrap();

    assert_eq!(rig.tunnels.closed_forwarders().len(), 1);
    let rt = rig.reconciler.runtime.lock().await;
    assert!(rt.forwarders.is_empty());
}

#[tokio::test]
async fn multiple_endpoints_converge_independently() {
    let rig = rig();
    set_agent(&rig, agent_config("T", ExpectedState::Online));
    let a = set_endpoint(&rig, endpoint_config("c1", "8080", ExpectedState::Online));
    let b = set_endpoint(&rig, endpoint_config("c2", "9090", ExpectedState::Online));

    rig.reconciler.converge().await.unwrap();

    let statuses = rig.reconciler.endpoint_statuses();
    assert_eq!(statuses[&a].state, EndpointState::Online);
    assert_eq!(statuses[&b].state, EndpointState::Online);
    assert_ne!(statuses[&a].url, statuses[&b].url);
    assert_eq!(rig.tunnels.forward_count(), 2);
}

#[test]
fn hash_changes_with_every_forwarder_relevant_field() {
    let cases: Vec<(&str, Box<dyn Fn(&mut EndpointConfig)>)> = vec![
        ("url", Box::new(|c| c.url = Some("https://x.dev".to_string()))),
        ("binding", Box::new(|c| c.binding = Some("internal".to_string()))),
        ("pooling", Box::new(|c| c.pooling_enabled = true)),
        ("traffic_policy", Box::new(|c| c.traffic_policy = Some("{}".to_string()))),
        ("description", Box::new(|c| c.description = Some("web".to_string()))),
        ("metadata", Box::new(|c| c.metadata = Some("m".to_string()))),
        ("target_port", Box::new(|c| c.target_port = "8081".to_string())),
    ];

    let base = endpoint_config("c1", "8080", ExpectedState::Online);
    for (field, mutate) in cases {
        let mut changed = base.clone();
        mutate(&mut changed);
        assert_ne!(
            forwarder_hash(&base),
            forwarder_hash(&changed),
            "changing {field} must change the hash"
        );
    }
}

#[test]
fn hash_ignores_cosmetic_fields() {
    let base = endpoint_config("c1", "8080", ExpectedState::Online);

    let mut offline = base.clone();
    offline.expected_state = ExpectedState::Offline;
    assert_eq!(forwarder_hash(&base), forwarder_hash(&offline));

    let mut stamped = base.clone();
    stamped.last_started = Some(chrono::Utc::now());
    assert_eq!(forwarder_hash(&base), forwarder_hash(&stamped));
}

#[test]
fn hash_is_stable_across_calls() {
    let config = endpoint_config("c1", "8080", ExpectedState::Online);
    assert_eq!(forwarder_hash(&config), forwarder_hash(&config));
}
