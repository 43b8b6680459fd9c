// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic persistence of declarative state.
//!
//! Two backends share one contract: a JSON file store for production and an
//! in-memory store for tests. `update` is the only way to mutate persisted
//! state and holds an exclusive lock across the whole load-mutate-save.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use burrow_core::State;
use thiserror::Error;

/// Errors from store operations.
///
/// `NotFound` is returned by mutators that reject an update because the
/// addressed entry does not exist; it never comes from the backends
/// themselves.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("endpoint not found")]
    NotFound,
}

/// Atomic persistence operations over [`State`].
pub trait Store: Send + Sync {
    fn load(&self) -> Result<State, StoreError>;

    fn save(&self, state: &State) -> Result<(), StoreError>;

    /// Load, apply `mutate` to an isolated copy, and write back, all under
    /// one exclusive lock. Nothing is persisted when the mutator errors.
    fn update(
        &self,
        mutate: &mut dyn FnMut(&mut State) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;
}
