// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream construction for forwarder creation.

use burrow_adapters::{ForwarderOptions, ProtocolDetector, Upstream};
use burrow_core::EndpointConfig;
use url::Url;

use crate::reconciler::DETECT_BUDGET;

/// Build the local upstream a forwarder will deliver traffic to.
///
/// The host is the container-bridge gateway; the scheme comes from probing
/// the port, unless the endpoint URL hint names a non-HTTP scheme, which
/// passes through verbatim (e.g. `tcp`, `tls`).
pub(crate) async fn build(
    detector: &dyn ProtocolDetector,
    bridge_host: &str,
    config: &EndpointConfig,
) -> Upstream {
    let caps = detector.detect(bridge_host, &config.target_port, DETECT_BUDGET).await;

    let hint_scheme = config
        .url
        .as_deref()
        .and_then(|raw| Url::parse(raw).ok())
        .map(|url| url.scheme().to_string());

    let scheme = match hint_scheme.as_deref() {
        None | Some("http") | Some("https") => {
            if caps.tls {
                "https".to_string()
            } else {
                "http".to_string()
            }
        }
        Some(other) => other.to_string(),
    };

    Upstream {
        scheme,
        host: bridge_host.to_string(),
        port: config.target_port.clone(),
        // Local containers rarely carry valid certificates and the hop only
        // transits the host-local bridge.
        tls_skip_verify: true,
    }
}

/// Forwarder options from an endpoint config. Optional fields are applied
/// only when present and non-empty; pooling is always applied.
pub(crate) fn forwarder_options(config: &EndpointConfig) -> ForwarderOptions {
    ForwarderOptions {
        url: non_empty(&config.url),
        binding: non_empty(&config.binding),
        pooling_enabled: config.pooling_enabled,
        traffic_policy: non_empty(&config.traffic_policy),
        description: non_empty(&config.description),
        metadata: non_empty(&config.metadata),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

#[cfg(test)]
#[path = "upstream_tests.rs"]
mod tests;
