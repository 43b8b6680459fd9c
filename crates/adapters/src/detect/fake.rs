// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ProtocolCaps, ProtocolDetector};

/// Fake detector returning a fixed capability record.
#[derive(Default)]
pub struct FakeProtocolDetector {
    caps: Mutex<ProtocolCaps>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeProtocolDetector {
    pub fn new(caps: ProtocolCaps) -> Self {
        Self { caps: Mutex::new(caps), calls: Mutex::new(Vec::new()) }
    }

    /// Detector reporting a plain HTTP service.
    pub fn http() -> Self {
        Self::new(ProtocolCaps { tcp: true, http: true, https: false, tls: false })
    }

    /// Detector reporting a TLS-only service.
    pub fn tls() -> Self {
        Self::new(ProtocolCaps { tcp: true, http: false, https: false, tls: true })
    }

    pub fn set(&self, caps: ProtocolCaps) {
        *self.caps.lock() = caps;
    }

    /// `(host, port)` pairs probed so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ProtocolDetector for FakeProtocolDetector {
    async fn detect(&self, host: &str, port: &str, _budget: Duration) -> ProtocolCaps {
        self.calls.lock().push((host.to_string(), port.to_string()));
        *self.caps.lock()
    }
}
