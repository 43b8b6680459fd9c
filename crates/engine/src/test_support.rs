// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig for engine tests: memory store + fake adapters, ticker off.

use std::sync::Arc;
use std::time::Duration;

use burrow_adapters::{FakeProtocolDetector, FakeTunnelFactory, ProtocolDetector, TunnelFactory};
use burrow_core::{AgentConfig, EndpointConfig, EndpointId, ExpectedState, FakeClock};
use burrow_store::{MemoryStore, Store};

use crate::{Reconciler, ReconcilerConfig};

pub(crate) struct Rig {
    pub store: Arc<MemoryStore>,
    pub tunnels: Arc<FakeTunnelFactory>,
    pub detector: Arc<FakeProtocolDetector>,
    pub clock: FakeClock,
    pub reconciler: Arc<Reconciler<FakeClock>>,
}

pub(crate) fn rig() -> Rig {
    rig_with_config(ReconcilerConfig { converge_interval: None, ..Default::default() })
}

pub(crate) fn rig_with_config(config: ReconcilerConfig) -> Rig {
    let store = Arc::new(MemoryStore::default());
    let tunnels = Arc::new(FakeTunnelFactory::new());
    let detector = Arc::new(FakeProtocolDetector::http());
    let clock = FakeClock::new();
    let reconciler = Reconciler::spawn(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::clone(&tunnels) as Arc<dyn TunnelFactory>,
        Arc::clone(&detector) as Arc<dyn ProtocolDetector>,
        clock.clone(),
        config,
    );
    Rig { store, tunnels, detector, clock, reconciler }
}

pub(crate) fn agent_config(token: &str, expected: ExpectedState) -> AgentConfig {
    AgentConfig {
        auth_token: token.to_string(),
        connect_url: None,
        expected_state: expected,
    }
}

pub(crate) fn set_agent(rig: &Rig, config: AgentConfig) {
    rig.store
        .update(&mut |state| {
            state.agent_config = config.clone();
            Ok(())
        })
        .unwrap();
}

pub(crate) fn endpoint_config(container: &str, port: &str, expected: ExpectedState) -> EndpointConfig {
    EndpointConfig {
        id: EndpointId::new(container, port),
        container_id: container.to_string(),
        target_port: port.to_string(),
        expected_state: expected,
        ..Default::default()
    }
}

pub(crate) fn set_endpoint(rig: &Rig, config: EndpointConfig) -> EndpointId {
    let id = config.id.clone();
    rig.store
        .update(&mut |state| {
            state.endpoint_configs.insert(config.id.clone(), config.clone());
            Ok(())
        })
        .unwrap();
    id
}

pub(crate) fn remove_endpoint(rig: &Rig, id: &EndpointId) {
    rig.store
        .update(&mut |state| {
            state.endpoint_configs.remove(id);
            Ok(())
        })
        .unwrap();
}

/// Poll `predicate` until it holds or two seconds pass.
pub(crate) async fn wait_until(predicate: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !predicate() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
