// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GET /agent and PUT /agent.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::ExpectedState;
use tracing::warn;

use super::types::{error_response, AgentRequest, AgentResponse};
use super::AppState;

pub(crate) async fn put_agent(
    State(app): State<AppState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let config = request.into_config();

    let updated = app.store.update(&mut |state| {
        state.agent_config = config.clone();

        // Taking the agent offline takes every endpoint offline with it, in
        // the same atomic write.
        if config.expected_state == ExpectedState::Offline {
            for endpoint in state.endpoint_configs.values_mut() {
                endpoint.expected_state = ExpectedState::Offline;
            }
        }
        Ok(())
    });
    if updated.is_err() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save configuration");
    }

    // The write is durable regardless; convergence failures surface through
    // status and the next tick retries.
    if let Err(e) = app.reconciler.converge().await {
        warn!(error = %e, "convergence failed");
    }

    agent_response(&app)
}

pub(crate) async fn get_agent(State(app): State<AppState>) -> Response {
    agent_response(&app)
}

fn agent_response(app: &AppState) -> Response {
    let state = match app.store.load() {
        Ok(state) => state,
        Err(_) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load configuration")
        }
    };
    let status = app.reconciler.agent_status();
    Json(AgentResponse::join(&state, status)).into_response()
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
