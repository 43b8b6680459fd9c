// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for HTTP-layer tests: in-memory store, fake adapters,
//! and an in-process test server over the real router.

use std::sync::Arc;

use axum_test::TestServer;
use burrow_adapters::{
    ContainerInspector, FakeContainerInspector, FakeProtocolDetector, FakeTunnelFactory,
    ProtocolDetector, TunnelFactory,
};
use burrow_core::SystemClock;
use burrow_engine::{Reconciler, ReconcilerConfig};
use burrow_store::{MemoryStore, Store};
use serde_json::{json, Value};

use super::{router, AppState};

pub(crate) struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub tunnels: Arc<FakeTunnelFactory>,
    pub detector: Arc<FakeProtocolDetector>,
    pub inspector: Arc<FakeContainerInspector>,
    pub reconciler: Arc<Reconciler>,
}

pub(crate) fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let tunnels = Arc::new(FakeTunnelFactory::new());
    let detector = Arc::new(FakeProtocolDetector::http());
    let inspector = Arc::new(FakeContainerInspector::new());

    // Ticker disabled: tests drive convergence through requests.
    let reconciler = Reconciler::spawn(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::clone(&tunnels) as Arc<dyn TunnelFactory>,
        Arc::clone(&detector) as Arc<dyn ProtocolDetector>,
        SystemClock,
        ReconcilerConfig { converge_interval: None, ..Default::default() },
    );

    let state = AppState {
        store: Arc::clone(&store) as Arc<dyn Store>,
        reconciler: Arc::clone(&reconciler),
        inspector: Arc::clone(&inspector) as Arc<dyn ContainerInspector>,
    };
    let server = TestServer::new(router(state)).unwrap();

    TestApp { server, store, tunnels, detector, inspector, reconciler }
}

pub(crate) fn agent_body(token: &str, expected: &str) -> Value {
    json!({ "authToken": token, "expectedState": expected })
}

pub(crate) fn endpoint_body(container: &str, port: &str, expected: &str) -> Value {
    json!({ "containerId": container, "targetPort": port, "expectedState": expected })
}
