// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative convergence engine.
//!
//! Reads persisted desired state and drives the live agent session and
//! forwarders to match: one coarse pass at a time, triggered by a ticker,
//! by agent events, or directly by the HTTP layer.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod agent;
mod endpoints;
mod events;
mod reconciler;
mod status;
mod upstream;

#[cfg(test)]
mod test_support;

pub use endpoints::forwarder_hash;
pub use reconciler::{Reconciler, ReconcilerConfig};

use burrow_adapters::TunnelError;
use burrow_store::StoreError;
use thiserror::Error;

/// Errors surfaced by a convergence pass.
///
/// A convergence error never undoes a store write; callers log it and rely
/// on the next tick to retry.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("tunnel error: {0}")]
    Tunnel(#[from] TunnelError),
}
