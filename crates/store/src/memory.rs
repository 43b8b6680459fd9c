// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store, primarily for tests.

use burrow_core::State;
use parking_lot::RwLock;

use crate::{Store, StoreError};

/// Memory-backed store. Every load and save clones, so callers can never
/// mutate shared state by retaining references.
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new(initial: Option<State>) -> Self {
        Self { state: RwLock::new(initial.unwrap_or_default()) }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<State, StoreError> {
        Ok(self.state.read().clone())
    }

    fn save(&self, state: &State) -> Result<(), StoreError> {
        *self.state.write() = state.clone();
        Ok(())
    }

    fn update(
        &self,
        mutate: &mut dyn FnMut(&mut State) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut guard = self.state.write();
        let mut copy = guard.clone();
        mutate(&mut copy)?;
        *guard = copy;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
