// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint CRUD: /endpoints and /endpoints/{id}.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::{EndpointConfig, EndpointId, ExpectedState};
use burrow_store::StoreError;
use chrono::Utc;
use tracing::warn;

use super::types::{error_response, EndpointRequest, EndpointResponse, EndpointsResponse};
use super::AppState;

pub(crate) async fn create_endpoint(
    State(app): State<AppState>,
    payload: Result<Json<EndpointRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let expected = match request.validate() {
        Ok(expected) => expected,
        Err(response) => return response,
    };

    let id = EndpointId::new(&request.container_id, &request.target_port);
    if upsert_endpoint(&app, &id, &request, expected, false).is_err() {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save endpoint configuration",
        );
    }

    if let Err(e) = app.reconciler.converge().await {
        warn!(error = %e, "convergence failed");
    }

    match endpoint_response(&app, &id) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn list_endpoints(State(app): State<AppState>) -> Response {
    let state = match app.store.load() {
        Ok(state) => state,
        Err(_) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load configuration")
        }
    };
    let statuses = app.reconciler.endpoint_statuses();

    let mut endpoints: Vec<EndpointResponse> = state
        .endpoint_configs
        .values()
        .map(|config| EndpointResponse::join(config, &statuses))
        .collect();
    endpoints.sort_by(|a, b| a.id.cmp(&b.id));

    Json(EndpointsResponse { endpoints }).into_response()
}

pub(crate) async fn get_endpoint(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match endpoint_response(&app, &EndpointId::from(id)) {
        Ok(response) => Json(response).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn update_endpoint(
    State(app): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EndpointRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let expected = match request.validate() {
        Ok(expected) => expected,
        Err(response) => return response,
    };

    let id = EndpointId::from(id);
    if id != EndpointId::new(&request.container_id, &request.target_port) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "endpoint ID must match containerId:targetPort",
        );
    }

    match upsert_endpoint(&app, &id, &request, expected, true) {
        Ok(()) => {}
        Err(StoreError::NotFound) => {
            return error_response(StatusCode::NOT_FOUND, "Endpoint not found")
        }
        Err(_) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save endpoint configuration",
            )
        }
    }

    if let Err(e) = app.reconciler.converge().await {
        warn!(error = %e, "convergence failed");
    }

    match endpoint_response(&app, &id) {
        Ok(response) => Json(response).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn delete_endpoint(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let id = EndpointId::from(id);
    let removed = app.store.update(&mut |state| {
        if state.endpoint_configs.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    });

    match removed {
        Ok(()) => {}
        Err(StoreError::NotFound) => {
            return error_response(StatusCode::NOT_FOUND, "Endpoint not found")
        }
        Err(_) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to remove endpoint configuration",
            )
        }
    }

    // Convergence closes the forwarder the removed endpoint owned.
    if let Err(e) = app.reconciler.converge().await {
        warn!(error = %e, "convergence failed");
    }

    StatusCode::NO_CONTENT.into_response()
}

/// Write an endpoint config. `must_exist` makes the write a strict update
/// (PUT); otherwise it upserts (POST).
///
/// `lastStarted` is stamped on any write that sets the endpoint online and
/// preserved otherwise. Writing an online endpoint forces the agent online
/// in the same atomic update.
fn upsert_endpoint(
    app: &AppState,
    id: &EndpointId,
    request: &EndpointRequest,
    expected: ExpectedState,
    must_exist: bool,
) -> Result<(), StoreError> {
    app.store.update(&mut |state| {
        let existing = state.endpoint_configs.get(id);
        if must_exist && existing.is_none() {
            return Err(StoreError::NotFound);
        }

        let last_started = if expected == ExpectedState::Online {
            Some(Utc::now())
        } else {
            existing.and_then(|config| config.last_started)
        };

        state.endpoint_configs.insert(
            id.clone(),
            EndpointConfig {
                id: id.clone(),
                container_id: request.container_id.clone(),
                target_port: request.target_port.clone(),
                url: non_empty(&request.url),
                binding: non_empty(&request.binding),
                pooling_enabled: request.pooling_enabled,
                traffic_policy: non_empty(&request.traffic_policy),
                description: non_empty(&request.description),
                metadata: non_empty(&request.metadata),
                expected_state: expected,
                last_started,
            },
        );

        if expected == ExpectedState::Online {
            state.agent_config.expected_state = ExpectedState::Online;
        }
        Ok(())
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// Load, find, and join one endpoint; 404 when the id is unknown.
fn endpoint_response(app: &AppState, id: &EndpointId) -> Result<EndpointResponse, Response> {
    let state = app
        .store
        .load()
        .map_err(|_| error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load configuration"))?;

    let Some(config) = state.endpoint_configs.get(id) else {
        return Err(error_response(StatusCode::NOT_FOUND, "Endpoint not found"));
    };

    let statuses = app.reconciler.endpoint_statuses();
    Ok(EndpointResponse::join(config, &statuses))
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod tests;
