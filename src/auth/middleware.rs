// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator authentication middleware for Axum.
//!
//! Applied per admin route, inside the audit layer:
//!
//! ```rust,ignore
//! let route = post(provision_wallet)
//!     .layer(axum::middleware::from_fn_with_state(operator_auth.clone(), require_admin))
//!     .layer(axum::middleware::from_fn_with_state(scope, audit_privileged));
//! ```
//!
//! On success the [`AuthenticatedUser`] is inserted into request extensions,
//! where handlers pick it up. Whenever a token verifies, the user is also
//! attached to the response extensions (including the 403 for non-admins),
//! so outer layers can attribute the request.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use tracing::debug;

use super::{claims::OperatorClaims, AuthError, AuthenticatedUser};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifies HS256 operator tokens.
#[derive(Clone)]
pub struct OperatorAuth {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for OperatorAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorAuth")
            .field("algorithm", &Algorithm::HS256)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl OperatorAuth {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validate a bearer token and return the operator it names.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let token_data = decode::<OperatorClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        AuthenticatedUser::from_claims(token_data.claims).ok_or(AuthError::InsufficientPermissions)
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(request: &Request) -> Result<&str, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Require an admin operator.
pub async fn require_admin(
    State(auth): State<OperatorAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match bearer_token(&request).and_then(|token| auth.verify(token)) {
        Ok(user) => user,
        Err(e) => {
            debug!(error = %e, path = %request.uri().path(), "Operator authentication failed");
            return e.into_response();
        }
    };

    if !user.is_admin() {
        debug!(user_id = %user.user_id, role = %user.role, "Operator lacks admin role");
        let mut response = AuthError::InsufficientPermissions.into_response();
        response.extensions_mut().insert(user);
        return response;
    }

    request.extensions_mut().insert(user.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(user);
    response
}
