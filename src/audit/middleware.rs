// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum middleware that audits privileged requests.
//!
//! Attach it per route, outside the authentication layer so rejected
//! requests are recorded too:
//!
//! ```rust,ignore
//! let route = post(provision_wallet)
//!     .layer(CatchPanicLayer::new())
//!     .layer(axum::middleware::from_fn_with_state(operator_auth, require_admin))
//!     .layer(axum::middleware::from_fn_with_state(
//!         recorder.scope("wallet.provision", Some("wallet")),
//!         audit_privileged,
//!     ));
//! ```
//!
//! The request snapshot (client, method, path, redacted query and body) is
//! taken before the inner layers run. The actor comes from an
//! [`AuthenticatedUser`] in the request extensions, else one the auth layer
//! attached to the response, else [`ANONYMOUS_ACTOR`]. The entry is built from
//! the final status code and queued on the recorder; the response is passed
//! through untouched.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{ConnectInfo, FromRequestParts, RawPathParams, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::entry::{AuditLogEntry, RequestSummary, ANONYMOUS_ACTOR};
use super::recorder::AuditRecorder;
use super::redaction::{AuditValue, RedactionPolicy};
use crate::auth::AuthenticatedUser;

/// Largest request body the middleware will buffer.
pub const MAX_AUDITED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Middleware state: where to record, and what to call the action.
#[derive(Clone, Debug)]
pub struct AuditScope {
    recorder: AuditRecorder,
    action: Arc<str>,
    entity_type: Option<Arc<str>>,
}

impl AuditScope {
    pub fn new(recorder: AuditRecorder, action: &str, entity_type: Option<&str>) -> Self {
        Self {
            recorder,
            action: Arc::from(action),
            entity_type: entity_type.map(Arc::from),
        }
    }
}

/// Request details captured before the handler runs.
struct RequestSnapshot {
    actor: Option<String>,
    source_ip: String,
    user_agent: Option<String>,
    request_id: Option<String>,
    method: String,
    path: String,
    query: AuditValue,
    path_params: Vec<(String, String)>,
}

impl RequestSnapshot {
    async fn capture(parts: &mut Parts, policy: &RedactionPolicy) -> Self {
        let path_params = RawPathParams::from_request_parts(parts, &())
            .await
            .map(|params| {
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let query = match parts.uri.query() {
            Some(q) if !q.is_empty() => policy.redact_json(form_to_json(q.as_bytes())),
            _ => AuditValue::Null,
        };

        Self {
            actor: parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.user_id.clone()),
            source_ip: client_ip(&parts.headers, parts.extensions.get::<ConnectInfo<SocketAddr>>()),
            user_agent: header_value(&parts.headers, header::USER_AGENT.as_str()),
            request_id: header_value(&parts.headers, "x-request-id"),
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            query,
            path_params,
        }
    }

    fn into_entry(
        self,
        scope: &AuditScope,
        body: AuditValue,
        raw_body: Option<&serde_json::Value>,
        response_actor: Option<&AuthenticatedUser>,
        status: StatusCode,
        started: Instant,
    ) -> AuditLogEntry {
        let entity_id = entity_id(&self.path_params, raw_body);
        let actor = self
            .actor
            .or_else(|| response_actor.map(|user| user.user_id.clone()))
            .unwrap_or_else(|| ANONYMOUS_ACTOR.to_string());
        let summary = RequestSummary {
            method: self.method,
            path: self.path,
            query: self.query,
            body,
        };

        AuditLogEntry::new(scope.action.as_ref(), actor, summary, status.as_u16())
            .with_entity(scope.entity_type.as_deref().map(str::to_string), entity_id)
            .with_client(self.source_ip, self.user_agent, self.request_id)
            .with_duration_ms(started.elapsed().as_millis() as u64)
    }
}

/// Audit a privileged request.
///
/// Never fails on its own account: recording problems are logged by the
/// recorder, and the handler's response is returned as is.
pub async fn audit_privileged(
    State(scope): State<AuditScope>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let policy = scope.recorder.policy();

    let (mut parts, body) = request.into_parts();
    let snapshot = RequestSnapshot::capture(&mut parts, policy).await;

    let bytes = match to_bytes(body, MAX_AUDITED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let status = StatusCode::PAYLOAD_TOO_LARGE;
            let marker = AuditValue::String("[body exceeds audit limit]".to_string());
            scope
                .recorder
                .record(snapshot.into_entry(&scope, marker, None, None, status, started));
            return (status, "request body too large").into_response();
        }
    };

    let raw_body = parse_body(&parts.headers, &bytes);
    let body_summary = match &raw_body {
        BodySummary::Empty => AuditValue::Null,
        BodySummary::Structured(value) => policy.redact_json(value.clone()),
        BodySummary::Opaque(len) => AuditValue::String(format!("[{len} bytes omitted]")),
    };

    let response = next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await;

    let structured = match &raw_body {
        BodySummary::Structured(value) => Some(value),
        _ => None,
    };
    let entry = snapshot.into_entry(
        &scope,
        body_summary,
        structured,
        response.extensions().get::<AuthenticatedUser>(),
        response.status(),
        started,
    );
    scope.recorder.record(entry);

    response
}

enum BodySummary {
    Empty,
    Structured(serde_json::Value),
    Opaque(usize),
}

/// JSON and form bodies are kept (for redaction); anything else is reduced
/// to its length.
fn parse_body(headers: &HeaderMap, bytes: &Bytes) -> BodySummary {
    if bytes.is_empty() {
        return BodySummary::Empty;
    }

    let content_type = header_value(headers, header::CONTENT_TYPE.as_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("json") {
        match serde_json::from_slice(bytes) {
            Ok(value) => BodySummary::Structured(value),
            Err(_) => BodySummary::Opaque(bytes.len()),
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        BodySummary::Structured(form_to_json(bytes))
    } else {
        BodySummary::Opaque(bytes.len())
    }
}

/// Parse `application/x-www-form-urlencoded` data into a JSON object.
/// Repeated keys collect into an array.
fn form_to_json(input: &[u8]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = serde_json::Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(serde_json::Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = serde_json::Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    serde_json::Value::Object(map)
}

/// Path parameter `id`, else the last path parameter, else body `id`, else
/// body `userId`.
fn entity_id(path_params: &[(String, String)], body: Option<&serde_json::Value>) -> Option<String> {
    if let Some((_, v)) = path_params.iter().find(|(k, _)| k == "id") {
        return Some(v.clone());
    }
    if let Some((_, v)) = path_params.last() {
        return Some(v.clone());
    }

    let body = body?;
    ["id", "userId"]
        .iter()
        .find_map(|field| match body.get(field)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address.
fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    if let Some(real_ip) = header_value(headers, "x-real-ip") {
        return real_ip;
    }
    peer.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
