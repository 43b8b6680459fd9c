// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent TCP/TLS/HTTP probing of a host:port.
//!
//! Used on the hot path of forwarder creation to pick the upstream scheme,
//! so both probes run in parallel under one shared deadline.

mod insecure;

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeProtocolDetector;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tracing::warn;

/// Which protocols a TCP port was observed to speak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolCaps {
    /// Port accepts TCP connections
    pub tcp: bool,
    /// Port answers plaintext HTTP requests
    pub http: bool,
    /// Port completes a TLS handshake negotiating an HTTP protocol via ALPN
    pub https: bool,
    /// Port completes a TLS handshake (HTTP or not)
    pub tls: bool,
}

/// Probes a host:port for protocol support.
#[async_trait]
pub trait ProtocolDetector: Send + Sync {
    /// Probe `host:port`. Never fails: on any error the returned record has
    /// all flags false. `budget` bounds the whole probe.
    async fn detect(&self, host: &str, port: &str, budget: Duration) -> ProtocolCaps;
}

/// Real detector probing over the network.
pub struct NetProtocolDetector {
    tls: Option<Arc<ClientConfig>>,
}

impl NetProtocolDetector {
    pub fn new() -> Self {
        let tls = match insecure::client_config() {
            Ok(config) => Some(Arc::new(config)),
            Err(e) => {
                warn!(error = %e, "TLS probe disabled: failed to build client config");
                None
            }
        };
        Self { tls }
    }
}

impl Default for NetProtocolDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolDetector for NetProtocolDetector {
    async fn detect(&self, host: &str, port: &str, budget: Duration) -> ProtocolCaps {
        let deadline = Instant::now() + budget;
        let (http_probe, tls_probe) = tokio::join!(
            try_http(host, port, deadline),
            try_tls(host, port, deadline, self.tls.clone()),
        );

        ProtocolCaps {
            tcp: http_probe.tcp || tls_probe.tcp,
            http: http_probe.http,
            https: tls_probe.https,
            tls: tls_probe.tls,
        }
    }
}

#[derive(Default)]
struct HttpProbe {
    tcp: bool,
    http: bool,
}

#[derive(Default)]
struct TlsProbe {
    tcp: bool,
    tls: bool,
    https: bool,
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

async fn try_http(host: &str, port: &str, deadline: Instant) -> HttpProbe {
    let mut probe = HttpProbe::default();

    let addr = format!("{host}:{port}");
    let mut stream = match timeout(remaining(deadline), TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => stream,
        _ => return probe,
    };
    probe.tcp = true;

    // Distinctive request line so the probe is identifiable in server logs.
    let request = format!(
        "GET /burrow-probe HTTP/1.1\r\n\
         Host: burrow-probe.local\r\n\
         User-Agent: burrow/{}\r\n\
         Connection: close\r\n\r\n",
        env!("CARGO_PKG_VERSION"),
    );
    match timeout(remaining(deadline), stream.write_all(request.as_bytes())).await {
        Ok(Ok(())) => {}
        _ => return probe,
    }

    let mut response = [0u8; 1024];
    let n = match timeout(remaining(deadline), stream.read(&mut response)).await {
        Ok(Ok(n)) => n,
        _ => return probe,
    };
    if response[..n].starts_with(b"HTTP/") {
        probe.http = true;
    }
    probe
}

async fn try_tls(
    host: &str,
    port: &str,
    deadline: Instant,
    config: Option<Arc<ClientConfig>>,
) -> TlsProbe {
    let mut probe = TlsProbe::default();

    let addr = format!("{host}:{port}");
    let stream = match timeout(remaining(deadline), TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => stream,
        _ => return probe,
    };
    probe.tcp = true;

    let Some(config) = config else {
        return probe;
    };
    let Ok(server_name) = ServerName::try_from(host.to_string()) else {
        return probe;
    };

    let connector = TlsConnector::from(config);
    let tls_stream = match timeout(remaining(deadline), connector.connect(server_name, stream)).await
    {
        Ok(Ok(tls_stream)) => tls_stream,
        _ => return probe,
    };
    probe.tls = true;

    let (_, connection) = tls_stream.get_ref();
    if let Some(alpn) = connection.alpn_protocol() {
        probe.https = alpn == b"h2" || alpn == b"http/1.1";
    }
    probe
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
