// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fake tunnel backend for tests.
//!
//! Connect/forward outcomes are queued ahead of time; every call is recorded
//! so tests can assert exactly what the engine did. An empty queue means the
//! call succeeds.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    AgentEvent, AgentOptions, Forwarder, ForwarderOptions, TunnelAgent, TunnelError,
    TunnelFactory, Upstream,
};

/// Agent options as seen by the factory, minus the event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAgentOptions {
    pub client_name: String,
    pub client_version: String,
    pub auth_token: Option<String>,
    pub connect_url: Option<String>,
}

/// One recorded `forward` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardCall {
    pub upstream: Upstream,
    pub opts: ForwarderOptions,
}

#[derive(Default)]
struct FakeTunnelInner {
    create_errors: VecDeque<TunnelError>,
    connect_errors: VecDeque<TunnelError>,
    forward_results: VecDeque<Result<String, TunnelError>>,
    creates: usize,
    connects: usize,
    agent_opts: Vec<RecordedAgentOptions>,
    events: Option<mpsc::Sender<AgentEvent>>,
    session_tokens: Vec<CancellationToken>,
    forwards: Vec<ForwardCall>,
    closed: Vec<String>,
    forwarder_seq: u64,
}

/// Fake [`TunnelFactory`] with scriptable results and recorded calls.
#[derive(Clone, Default)]
pub struct FakeTunnelFactory {
    inner: Arc<Mutex<FakeTunnelInner>>,
}

impl FakeTunnelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next `create_agent` call.
    pub fn fail_next_create(&self, message: &str) {
        self.inner
            .lock()
            .create_errors
            .push_back(TunnelError::Unavailable(message.to_string()));
    }

    /// Queue a failure for the next `connect` call.
    pub fn fail_next_connect(&self, message: &str) {
        self.inner.lock().connect_errors.push_back(TunnelError::Connect(message.to_string()));
    }

    /// Queue a failure for the next `forward` call.
    pub fn fail_next_forward(&self, message: &str) {
        self.inner
            .lock()
            .forward_results
            .push_back(Err(TunnelError::Forward(message.to_string())));
    }

    /// Queue a specific public URL for the next `forward` call.
    pub fn push_forward_url(&self, url: &str) {
        self.inner.lock().forward_results.push_back(Ok(url.to_string()));
    }

    pub fn create_count(&self) -> usize {
        self.inner.lock().creates
    }

    pub fn connect_count(&self) -> usize {
        self.inner.lock().connects
    }

    pub fn forward_count(&self) -> usize {
        self.inner.lock().forwards.len()
    }

    pub fn forward_calls(&self) -> Vec<ForwardCall> {
        self.inner.lock().forwards.clone()
    }

    pub fn closed_forwarders(&self) -> Vec<String> {
        self.inner.lock().closed.clone()
    }

    pub fn agent_options(&self) -> Vec<RecordedAgentOptions> {
        self.inner.lock().agent_opts.clone()
    }

    /// Session tokens handed to `connect`, in call order.
    pub fn session_tokens(&self) -> Vec<CancellationToken> {
        self.inner.lock().session_tokens.clone()
    }

    /// Emit an event on the most recently created agent's channel.
    pub async fn emit(&self, event: AgentEvent) {
        let sender = self.inner.lock().events.clone();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

impl TunnelFactory for FakeTunnelFactory {
    fn create_agent(&self, opts: AgentOptions) -> Result<Arc<dyn TunnelAgent>, TunnelError> {
        let mut inner = self.inner.lock();
        inner.creates += 1;
        inner.agent_opts.push(RecordedAgentOptions {
            client_name: opts.client_name,
            client_version: opts.client_version,
            auth_token: opts.auth_token,
            connect_url: opts.connect_url,
        });
        if let Some(err) = inner.create_errors.pop_front() {
            return Err(err);
        }
        inner.events = Some(opts.events);
        Ok(Arc::new(FakeTunnelAgent { inner: Arc::clone(&self.inner) }))
    }
}

struct FakeTunnelAgent {
    inner: Arc<Mutex<FakeTunnelInner>>,
}

#[async_trait]
impl TunnelAgent for FakeTunnelAgent {
    async fn connect(&self, session: CancellationToken) -> Result<(), TunnelError> {
        let mut inner = self.inner.lock();
        inner.connects += 1;
        inner.session_tokens.push(session.clone());
        if session.is_cancelled() {
            return Err(TunnelError::Cancelled);
        }
        match inner.connect_errors.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn forward(
        &self,
        session: CancellationToken,
        upstream: Upstream,
        opts: ForwarderOptions,
    ) -> Result<Arc<dyn Forwarder>, TunnelError> {
        let mut inner = self.inner.lock();
        inner.forwards.push(ForwardCall { upstream, opts });
        if session.is_cancelled() {
            return Err(TunnelError::Cancelled);
        }
        inner.forwarder_seq += 1;
        let id = format!("fwd-{}", inner.forwarder_seq);
        let url = match inner.forward_results.pop_front() {
            Some(Ok(url)) => url,
            Some(Err(err)) => return Err(err),
            None => format!("https://{id}.burrow.dev"),
        };
        Ok(Arc::new(FakeForwarder { id, url, inner: Arc::clone(&self.inner) }))
    }
}

struct FakeForwarder {
    id: String,
    url: String,
    inner: Arc<Mutex<FakeTunnelInner>>,
}

#[async_trait]
impl Forwarder for FakeForwarder {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    async fn close(&self) {
        self.inner.lock().closed.push(self.id.clone());
    }
}
