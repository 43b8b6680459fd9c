// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ContainerError, ContainerInfo, ContainerInspector};

/// Fake inspector backed by an in-memory container table.
#[derive(Default)]
pub struct FakeContainerInspector {
    containers: Mutex<HashMap<String, bool>>,
}

impl FakeContainerInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container and whether it is running.
    pub fn add(&self, container_id: &str, running: bool) {
        self.containers.lock().insert(container_id.to_string(), running);
    }

    pub fn remove(&self, container_id: &str) {
        self.containers.lock().remove(container_id);
    }
}

#[async_trait]
impl ContainerInspector for FakeContainerInspector {
    async fn inspect(&self, container_id: &str) -> Result<ContainerInfo, ContainerError> {
        match self.containers.lock().get(container_id) {
            Some(&running) => Ok(ContainerInfo { id: container_id.to_string(), running }),
            None => Err(ContainerError::NotFound(container_id.to_string())),
        }
    }
}
