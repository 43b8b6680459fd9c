// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciler: owner of all runtime bindings and the converge loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use burrow_adapters::{
    AgentEvent, Forwarder, ProtocolCaps, ProtocolDetector, TunnelAgent, TunnelFactory,
};
use burrow_core::{AgentConfig, AgentStatus, Clock, EndpointId, EndpointStatus, SystemClock};
use burrow_store::Store;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::endpoints::ForwardOutcome;
use crate::events;
use crate::status::StatusBoard;
use crate::EngineError;

/// Inline wait for an agent connect before the caller sees `connecting`.
pub(crate) const CONNECT_WAIT: Duration = Duration::from_secs(1);
/// Inline wait for a forwarder build before the caller sees `starting`.
pub(crate) const FORWARD_WAIT: Duration = Duration::from_secs(1);
/// Deadline for one protocol-detection probe.
pub(crate) const DETECT_BUDGET: Duration = Duration::from_secs(1);

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Client info reported to the tunnel service.
    pub client_name: String,
    pub client_version: String,
    /// Container-bridge gateway upstreams are dialed through.
    pub bridge_host: String,
    /// Periodic converge interval; `None` disables the ticker (tests drive
    /// convergence directly).
    pub converge_interval: Option<Duration>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            client_name: "burrow-docker-extension".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            bridge_host: "172.17.0.1".to_string(),
            converge_interval: Some(Duration::from_secs(10)),
        }
    }
}

/// Runtime bindings. Only ever touched while holding the coarse mutex.
pub(crate) struct RuntimeState {
    pub agent: Option<Arc<dyn TunnelAgent>>,
    /// Cancelling this token is how the current session is torn down.
    pub agent_cancel: Option<CancellationToken>,
    /// Last applied agent config, for change detection.
    pub agent_config: AgentConfig,
    pub forwarders: HashMap<EndpointId, Arc<dyn Forwarder>>,
    /// Hash of the forwarder-relevant config that produced each forwarder.
    pub config_hashes: HashMap<EndpointId, String>,
    /// Forwarder builds in flight: id → hash being built.
    pub pending_forwards: HashMap<EndpointId, String>,
    /// Completions that missed the inline wait; drained at pass start.
    pub outcomes: mpsc::UnboundedReceiver<ForwardOutcome>,
}

/// Converges persisted desired state with live tunnel resources.
pub struct Reconciler<C: Clock = SystemClock> {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) tunnels: Arc<dyn TunnelFactory>,
    pub(crate) detector: Arc<dyn ProtocolDetector>,
    pub(crate) clock: C,
    pub(crate) config: ReconcilerConfig,
    /// Coarse mutex: one convergence pass at a time.
    pub(crate) runtime: tokio::sync::Mutex<RuntimeState>,
    pub(crate) status: Arc<StatusBoard>,
    pub(crate) event_tx: mpsc::Sender<AgentEvent>,
    pub(crate) outcome_tx: mpsc::UnboundedSender<ForwardOutcome>,
    trigger_tx: mpsc::Sender<()>,
    pub(crate) shutdown: CancellationToken,
}

impl<C: Clock> Reconciler<C> {
    /// Build the reconciler and start its background tasks: the agent-event
    /// consumer, and the converge loop when an interval is configured.
    pub fn spawn(
        store: Arc<dyn Store>,
        tunnels: Arc<dyn TunnelFactory>,
        detector: Arc<dyn ProtocolDetector>,
        clock: C,
        config: ReconcilerConfig,
    ) -> Arc<Self> {
        let (event_tx, event_rx) = mpsc::channel(16);
        // Single slot: extra triggers while a converge is pending are dropped.
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let reconciler = Arc::new(Self {
            store,
            tunnels,
            detector,
            clock,
            config,
            runtime: tokio::sync::Mutex::new(RuntimeState {
                agent: None,
                agent_cancel: None,
                agent_config: AgentConfig::default(),
                forwarders: HashMap::new(),
                config_hashes: HashMap::new(),
                pending_forwards: HashMap::new(),
                outcomes: outcome_rx,
            }),
            status: Arc::new(StatusBoard::default()),
            event_tx,
            outcome_tx,
            trigger_tx,
            shutdown: CancellationToken::new(),
        });

        events::spawn_event_task(Arc::clone(&reconciler), event_rx);

        if let Some(interval) = reconciler.config.converge_interval {
            Self::spawn_converge_loop(Arc::clone(&reconciler), interval, trigger_rx);
        }

        reconciler
    }

    fn spawn_converge_loop(this: Arc<Self>, interval: Duration, mut trigger_rx: mpsc::Receiver<()>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Consume the immediate first tick; startup convergence is the
            // caller's call, not the ticker's.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = this.shutdown.cancelled() => return,
                    _ = ticker.tick() => {}
                    msg = trigger_rx.recv() => {
                        if msg.is_none() {
                            return;
                        }
                    }
                }

                if let Err(e) = this.converge().await {
                    error!(error = %e, "converge failed");
                }
            }
        });
    }

    /// Request an out-of-band convergence. Non-blocking; coalesced when one
    /// is already pending.
    pub fn trigger_converge(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// One convergence pass: agent first, then endpoints.
    pub async fn converge(&self) -> Result<(), EngineError> {
        let mut rt = self.runtime.lock().await;
        debug!("converge pass");
        self.drain_forward_outcomes(&mut rt);
        let state = self.store.load()?;
        self.converge_agent(&mut rt, state.agent_config).await?;
        self.converge_endpoints(&mut rt, &state.endpoint_configs).await?;
        Ok(())
    }

    /// Live agent status snapshot.
    pub fn agent_status(&self) -> AgentStatus {
        self.status.agent()
    }

    /// Live endpoint status snapshots, keyed by endpoint id.
    pub fn endpoint_statuses(&self) -> HashMap<EndpointId, EndpointStatus> {
        self.status.endpoints()
    }

    /// Probe the bridge host at `port`. Used by the protocol-detection API.
    pub async fn detect_protocols(&self, port: &str) -> ProtocolCaps {
        self.detector.detect(&self.config.bridge_host, port, DETECT_BUDGET).await
    }

    /// Apply one agent event to live status. Runs on the event task; must
    /// never take the coarse runtime mutex because the emitting backend may
    /// hold its own locks while a converge pass is calling into it.
    pub fn handle_agent_event(&self, event: AgentEvent) {
        match event {
            AgentEvent::ConnectSucceeded => {
                self.status.set_agent_online(self.clock.now());
                self.status.endpoints_agent_connected();
                self.trigger_converge();
            }
            AgentEvent::Disconnected { error: Some(err) } => {
                // Transient loss: keep trying, hold endpoint URLs.
                self.status.set_agent_connecting(Some(err));
                self.status.endpoints_agent_disconnected();
                self.trigger_converge();
            }
            AgentEvent::Disconnected { error: None } => {
                // Deliberate disconnect: the session is gone for good.
                self.status.set_agent_offline(None);
                self.status.endpoints_all_offline();
                self.trigger_converge();
            }
            AgentEvent::HeartbeatReceived { latency } => {
                let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                self.status.update_agent_latency(millis);
            }
        }
    }

    /// Stop background tasks and tear down the agent session.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut rt = self.runtime.lock().await;
        self.disconnect_agent(&mut rt).await;
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
