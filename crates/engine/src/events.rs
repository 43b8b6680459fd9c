// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-event consumer task.
//!
//! Events arrive on the channel handed to the tunnel backend at agent
//! creation and are applied to the status board only; the coarse runtime
//! mutex is never taken on this path.

use std::sync::Arc;

use burrow_adapters::AgentEvent;
use burrow_core::Clock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::reconciler::Reconciler;

pub(crate) fn spawn_event_task<C: Clock>(
    reconciler: Arc<Reconciler<C>>,
    mut events: mpsc::Receiver<AgentEvent>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = reconciler.shutdown.cancelled() => return,
                event = events.recv() => {
                    let Some(event) = event else { return };
                    debug!(event = ?event, "agent event");
                    reconciler.handle_agent_event(event);
                }
            }
        }
    });
}
