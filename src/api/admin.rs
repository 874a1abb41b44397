// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! These endpoints require an admin operator token and provide:
//! - Custodial wallet provisioning, lookup and integrity verification
//! - Password-reset token and verification code issuance
//!
//! Every route here is wrapped by the audit middleware; handlers only log
//! operational events.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    auth::AuthenticatedUser,
    custody::{
        master_key::derivation_path,
        tokens::{generate_alphanumeric_code, generate_numeric_code, generate_secure_token},
        DEFAULT_TOKEN_LEN,
    },
    error::ApiError,
    models::{
        CodeFormat, CustodialWalletRecord, ResetTokenResponse, VerificationCodeRequest,
        VerificationCodeResponse, VerifyWalletResponse, WalletAddress, WalletResponse,
        MAX_CODE_LEN,
    },
    state::AppState,
};

// ============================================================================
// Custodial Wallets
// ============================================================================

/// Provision the custodial wallet for an account index.
///
/// Derives the keypair, seals the private key, stores the record and returns
/// the public half. Fails with 409 if the index is already provisioned.
/// Derivation and sealing run without holding the store lock; the insert
/// rejects a concurrent provision of the same index.
#[utoipa::path(
    post,
    path = "/v1/admin/accounts/{account_index}/wallet",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("account_index" = u32, Path, description = "Account index (below 2^31)")),
    responses(
        (status = 201, description = "Wallet provisioned", body = WalletResponse),
        (status = 400, description = "Index out of range"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 409, description = "Account already has a wallet"),
        (status = 500, description = "Key management is unavailable")
    )
)]
pub async fn provision_wallet(
    State(state): State<AppState>,
    Extension(operator): Extension<AuthenticatedUser>,
    Path(account_index): Path<u32>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    if state.store.read().await.wallet(account_index).is_some() {
        return Err(ApiError::conflict(format!(
            "Account {account_index} already has a wallet"
        )));
    }

    let keypair = state.keys.derive_keypair(account_index)?;
    let encrypted_private_key = state.cipher.encrypt(keypair.private_key())?;

    let record = CustodialWalletRecord {
        account_index,
        derivation_path: keypair.derivation_path.clone(),
        public_address: WalletAddress::from(keypair.public_address.clone()),
        encrypted_private_key,
        created_at: Utc::now(),
    };
    drop(keypair);
    let response = WalletResponse::from(&record);
    state.store.write().await.insert_wallet(record)?;

    info!(
        account_index,
        address = %response.public_address,
        operator = %operator.user_id,
        "Custodial wallet provisioned"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Public details of a provisioned wallet.
#[utoipa::path(
    get,
    path = "/v1/admin/accounts/{account_index}/wallet",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("account_index" = u32, Path, description = "Account index")),
    responses(
        (status = 200, description = "Wallet details", body = WalletResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "No wallet for this account")
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(account_index): Path<u32>,
) -> Result<Json<WalletResponse>, ApiError> {
    let store = state.store.read().await;
    let record = store
        .wallet(account_index)
        .ok_or_else(|| ApiError::not_found(format!("No wallet for account {account_index}")))?;
    Ok(Json(WalletResponse::from(record)))
}

/// Check a stored wallet against a fresh derivation.
///
/// Decrypts the stored key and compares both halves of the keypair. The
/// plaintext key is dropped before the response is built.
#[utoipa::path(
    post,
    path = "/v1/admin/accounts/{account_index}/wallet/verify",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("account_index" = u32, Path, description = "Account index")),
    responses(
        (status = 200, description = "Verification outcome", body = VerifyWalletResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "No wallet for this account"),
        (status = 500, description = "Stored key material could not be verified")
    )
)]
pub async fn verify_wallet(
    State(state): State<AppState>,
    Path(account_index): Path<u32>,
) -> Result<Json<VerifyWalletResponse>, ApiError> {
    let record = state
        .store
        .read()
        .await
        .wallet(account_index)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("No wallet for account {account_index}")))?;

    let keypair = state.keys.derive_keypair(account_index)?;
    let stored_key = state.cipher.decrypt(&record.encrypted_private_key)?;

    let address_matches = keypair.public_address == record.public_address.0
        && keypair.derivation_path == derivation_path(account_index);
    let private_key_matches = stored_key.as_str() == keypair.private_key();
    drop(stored_key);

    if !(address_matches && private_key_matches) {
        warn!(
            account_index,
            address_matches, private_key_matches, "Stored wallet does not match derivation"
        );
    }

    Ok(Json(VerifyWalletResponse {
        account_index,
        public_address: record.public_address,
        address_matches,
        private_key_matches,
    }))
}

// ============================================================================
// User Credentials
// ============================================================================

/// Issue a password-reset token for a user.
#[utoipa::path(
    post,
    path = "/v1/admin/users/{user_id}/reset-token",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Reset token issued", body = ResetTokenResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn issue_reset_token(
    Path(user_id): Path<String>,
) -> Result<Json<ResetTokenResponse>, ApiError> {
    let reset_token = generate_secure_token(DEFAULT_TOKEN_LEN)?;
    info!(user_id = %user_id, "Reset token issued");

    Ok(Json(ResetTokenResponse {
        user_id,
        reset_token,
        issued_at: Utc::now(),
    }))
}

/// Issue a one-time verification code for a user.
///
/// The JSON body is optional; an empty body means a 6-digit numeric code.
#[utoipa::path(
    post,
    path = "/v1/admin/users/{user_id}/verification-code",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("user_id" = String, Path, description = "User identifier")),
    request_body(content = VerificationCodeRequest, description = "Optional; defaults to a 6-digit numeric code"),
    responses(
        (status = 200, description = "Verification code issued", body = VerificationCodeResponse),
        (status = 400, description = "Invalid format or length"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn issue_verification_code(
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<VerificationCodeResponse>, ApiError> {
    let request: VerificationCodeRequest = if body.is_empty() {
        VerificationCodeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?
    };

    if request.length > MAX_CODE_LEN {
        return Err(ApiError::bad_request(format!(
            "Code length must be at most {MAX_CODE_LEN}"
        )));
    }

    let code = match request.format {
        CodeFormat::Numeric => generate_numeric_code(request.length)?,
        CodeFormat::Alphanumeric => generate_alphanumeric_code(request.length)?,
    };
    info!(user_id = %user_id, format = ?request.format, length = request.length, "Verification code issued");

    Ok(Json(VerificationCodeResponse {
        user_id,
        format: request.format,
        code,
        issued_at: Utc::now(),
    }))
}
