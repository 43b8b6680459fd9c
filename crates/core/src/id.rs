// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable endpoint identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an endpoint: `containerId:targetPort`.
///
/// The identity is stable across config rewrites; two writes naming the same
/// container and port address the same endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(container_id: &str, target_port: &str) -> Self {
        Self(format!("{container_id}:{target_port}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EndpointId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for EndpointId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
