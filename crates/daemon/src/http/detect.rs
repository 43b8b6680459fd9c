// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POST /detect_protocol.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::types::{error_response, DetectProtocolRequest, DetectProtocolResponse};
use super::AppState;

pub(crate) async fn detect_protocol(
    State(app): State<AppState>,
    payload: Result<Json<DetectProtocolRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    if request.container_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "containerId required");
    }
    if request.port.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "port required");
    }

    // Advisory lookup: the probe targets the bridge gateway either way, but
    // a vanished container is worth a log line.
    if let Err(e) = app.inspector.inspect(&request.container_id).await {
        warn!(container = %request.container_id, error = %e, "container inspect failed");
    }

    let caps = app.reconciler.detect_protocols(&request.port).await;
    Json(DetectProtocolResponse::from(caps)).into_response()
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
