// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP API over the daemon's Unix socket.
//!
//! Thin boundary: decode the request, write the store, trigger convergence,
//! join persisted config with live status into the response. Nothing here
//! owns runtime state.

mod agent;
mod detect;
mod endpoints;
mod types;

pub use types::{
    AgentRequest, AgentResponse, DetectProtocolRequest, DetectProtocolResponse, EndpointRequest,
    EndpointResponse, EndpointsResponse, ErrorBody,
};

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use burrow_adapters::ContainerInspector;
use burrow_engine::Reconciler;
use burrow_store::Store;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared context for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub reconciler: Arc<Reconciler>,
    pub inspector: Arc<dyn ContainerInspector>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/agent", get(agent::get_agent).put(agent::put_agent))
        .route("/endpoints", get(endpoints::list_endpoints).post(endpoints::create_endpoint))
        .route(
            "/endpoints/{id}",
            get(endpoints::get_endpoint)
                .put(endpoints::update_endpoint)
                .delete(endpoints::delete_endpoint),
        )
        .route("/detect_protocol", post(detect::detect_protocol))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router over the Unix socket until shutdown, spawning a task per
/// connection.
pub async fn serve(listener: UnixListener, router: Router, shutdown: CancellationToken) {
    let mut make_svc = router.into_make_service();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accept = listener.accept() => {
                match accept {
                    Ok((stream, _)) => {
                        // IntoMakeService implements Service<T> for any T
                        let svc_future = <_ as tower::Service<_>>::call(&mut make_svc, ());
                        tokio::spawn(async move {
                            let Ok(svc) = svc_future.await else { return };
                            let io = hyper_util::rt::TokioIo::new(stream);
                            let hyper_svc = hyper_util::service::TowerToHyperService::new(svc);
                            let _ = hyper_util::server::conn::auto::Builder::new(
                                hyper_util::rt::TokioExecutor::new(),
                            )
                            .serve_connection_with_upgrades(io, hyper_svc)
                            .await;
                        });
                    }
                    Err(e) => {
                        debug!("unix socket accept error: {e}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test_fixtures;
