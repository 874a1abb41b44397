// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! | Method | Path | Audit action |
//! |--------|------|--------------|
//! | GET | `/health` | none |
//! | POST | `/v1/admin/accounts/{account_index}/wallet` | `wallet.provision` |
//! | GET | `/v1/admin/accounts/{account_index}/wallet` | `wallet.view` |
//! | POST | `/v1/admin/accounts/{account_index}/wallet/verify` | `wallet.verify` |
//! | POST | `/v1/admin/users/{user_id}/reset-token` | `user.reset_token` |
//! | POST | `/v1/admin/users/{user_id}/verification-code` | `user.verification_code` |
//!
//! Layering of an admin route, outermost first: request id, tracing, audit,
//! operator auth, panic catcher, handler. Requests rejected by the auth layer
//! are still recorded, attributed to the operator when the token verified.
//!
//! The OpenAPI document is served at `/api-doc/openapi.json` with Swagger UI
//! at `/docs`.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    audit::{audit_privileged, AuditRecorder},
    auth::{require_admin, OperatorAuth},
    models::{
        CodeFormat, ResetTokenResponse, VerificationCodeRequest, VerificationCodeResponse,
        VerifyWalletResponse, WalletAddress, WalletResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod health;

/// Per-route layers shared by every admin endpoint.
struct AdminLayers<'a> {
    recorder: &'a AuditRecorder,
    operator_auth: &'a OperatorAuth,
}

impl AdminLayers<'_> {
    /// Wrap a privileged route with the panic catcher, operator auth and the
    /// audit middleware, in that order from the inside out.
    fn audited(
        &self,
        route: MethodRouter<AppState>,
        action: &str,
        entity_type: &str,
    ) -> MethodRouter<AppState> {
        route
            .layer(CatchPanicLayer::new())
            .layer(from_fn_with_state(self.operator_auth.clone(), require_admin))
            .layer(from_fn_with_state(
                self.recorder.scope(action, Some(entity_type)),
                audit_privileged,
            ))
    }
}

pub fn router(state: AppState) -> Router {
    let layers = AdminLayers {
        recorder: &state.audit,
        operator_auth: &state.operator_auth,
    };

    let admin_routes = Router::new()
        .route(
            "/accounts/{account_index}/wallet",
            layers
                .audited(post(admin::provision_wallet), "wallet.provision", "wallet")
                .merge(layers.audited(get(admin::get_wallet), "wallet.view", "wallet")),
        )
        .route(
            "/accounts/{account_index}/wallet/verify",
            layers.audited(post(admin::verify_wallet), "wallet.verify", "wallet"),
        )
        .route(
            "/users/{user_id}/reset-token",
            layers.audited(post(admin::issue_reset_token), "user.reset_token", "user"),
        )
        .route(
            "/users/{user_id}/verification-code",
            layers.audited(
                post(admin::issue_verification_code),
                "user.verification_code",
                "user",
            ),
        );

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1/admin", admin_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        admin::provision_wallet,
        admin::get_wallet,
        admin::verify_wallet,
        admin::issue_reset_token,
        admin::issue_verification_code
    ),
    components(
        schemas(
            health::HealthResponse,
            health::HealthChecks,
            WalletAddress,
            WalletResponse,
            VerifyWalletResponse,
            ResetTokenResponse,
            CodeFormat,
            VerificationCodeRequest,
            VerificationCodeResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Admin", description = "Custodial wallets and user credentials (admin only, audited)")
    )
)]
pub struct ApiDoc;


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::test_support::*;
    use crate::audit::ANONYMOUS_ACTOR;
    use crate::auth::middleware::test_support::{admin_token, token};

    #[tokio::test]
    async fn health_needs_no_auth() {
        let (app, _state, sink) = test_app(Some(HARDHAT_MNEMONIC));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["master_key"], "ok");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sink.snapshot().is_empty());
    }

    #[tokio::test]
    async fn health_degraded_without_seed() {
        let (app, _state, _sink) = test_app(None);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_reports_unparseable_seed_as_invalid() {
        let invalid = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        let (app, _state, _sink) = test_app(Some(invalid));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["master_key"], "invalid");
    }

    #[tokio::test]
    async fn openapi_document_lists_every_route() {
        let (app, _state, _sink) = test_app(Some(HARDHAT_MNEMONIC));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        for path in [
            "/health",
            "/v1/admin/accounts/{account_index}/wallet",
            "/v1/admin/accounts/{account_index}/wallet/verify",
            "/v1/admin/users/{user_id}/reset-token",
            "/v1/admin/users/{user_id}/verification-code",
        ] {
            assert!(doc["paths"].get(path).is_some(), "{path} missing from OpenAPI document");
        }
        assert!(doc["paths"]["/v1/admin/accounts/{account_index}/wallet"]
            .get("get")
            .is_some());
    }

    #[tokio::test]
    async fn admin_routes_require_admin_token() {
        let (app, _state, sink) = test_app(Some(HARDHAT_MNEMONIC));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/admin/accounts/0/wallet")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let support = token("op_support", Some("support"), 3600);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/admin/accounts/0/wallet")
                    .header(header::AUTHORIZATION, format!("Bearer {support}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let entries = sink.wait_for(2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.snapshot().len(), 2);
        assert!(entries.iter().all(|e| !e.success && e.action == "wallet.provision"));

        let unauthorized = entries.iter().find(|e| e.status_code == 401).unwrap();
        assert_eq!(unauthorized.actor_identity, ANONYMOUS_ACTOR);
        assert_eq!(unauthorized.entity_id.as_deref(), Some("0"));

        let forbidden = entries.iter().find(|e| e.status_code == 403).unwrap();
        assert_eq!(forbidden.actor_identity, "op_support");
    }

    #[tokio::test]
    async fn request_id_reaches_audit_entry() {
        let (app, _state, sink) = test_app(Some(HARDHAT_MNEMONIC));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/admin/accounts/4/wallet")
                    .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()))
                    .header("x-request-id", "req-123")
                    .header("x-real-ip", "198.51.100.4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-request-id"], "req-123");

        let entries = sink.wait_for(1).await;
        assert_eq!(entries[0].request_id.as_deref(), Some("req-123"));
        assert_eq!(entries[0].source_ip, "198.51.100.4");
    }
}
