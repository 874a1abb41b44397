// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::{custody::KeyError, state::AppState};

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// "ok" when the master seed phrase builds a root key, "missing" when it
    /// is not configured, "invalid" when it does not parse.
    pub master_key: String,
    /// Number of provisioned custodial wallets.
    pub wallets: usize,
}

fn master_key_status(state: &AppState) -> &'static str {
    match state.keys.master_context() {
        Ok(_) => "ok",
        Err(KeyError::ConfigMissing) => "missing",
        Err(e) => {
            warn!(error = %e, "Master key check failed");
            "invalid"
        }
    }
}

/// Health check endpoint handler.
///
/// Returns 200 when the master key is usable, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Master key is missing or invalid", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let master_key = master_key_status(&state);
    let wallets = state.store.read().await.wallet_count();
    let key_ok = master_key == "ok";

    let response = HealthResponse {
        status: if key_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            master_key: master_key.to_string(),
            wallets,
        },
    };

    let status = if key_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
