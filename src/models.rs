// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Stored records and the request/response bodies of the admin API.
//!
//! ## Model Categories
//!
//! - **Custodial wallets**: per-account records holding the public address and
//!   the envelope-encrypted private key
//! - **User credentials**: reset tokens and verification codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::custody::{EncryptedSecret, DEFAULT_CODE_LEN};

/// Longest verification code the API will issue.
pub const MAX_CODE_LEN: usize = 64;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// EIP-55 checksummed EVM address (`0x` + 40 hex characters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")]
pub struct WalletAddress(pub String);

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

// =============================================================================
// Custodial Wallet Models
// =============================================================================

/// A provisioned custodial wallet as persisted.
///
/// The private key only ever exists here in sealed form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustodialWalletRecord {
    pub account_index: u32,
    /// e.g. `m/44'/60'/0'/0/7`
    pub derivation_path: String,
    pub public_address: WalletAddress,
    pub encrypted_private_key: EncryptedSecret,
    pub created_at: DateTime<Utc>,
}

/// Public view of a custodial wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct WalletResponse {
    pub account_index: u32,
    pub derivation_path: String,
    pub public_address: WalletAddress,
    pub created_at: DateTime<Utc>,
}

impl From<&CustodialWalletRecord> for WalletResponse {
    fn from(record: &CustodialWalletRecord) -> Self {
        Self {
            account_index: record.account_index,
            derivation_path: record.derivation_path.clone(),
            public_address: record.public_address.clone(),
            created_at: record.created_at,
        }
    }
}

/// Outcome of re-deriving a wallet and checking it against the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct VerifyWalletResponse {
    pub account_index: u32,
    pub public_address: WalletAddress,
    /// Re-derived address equals the stored address.
    pub address_matches: bool,
    /// Decrypted stored key equals the re-derived key.
    pub private_key_matches: bool,
}

// =============================================================================
// User Credential Models
// =============================================================================

/// A freshly issued password-reset token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetTokenResponse {
    pub user_id: String,
    pub reset_token: String,
    pub issued_at: DateTime<Utc>,
}

/// Alphabet for a verification code.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CodeFormat {
    /// Digits only.
    #[default]
    Numeric,
    /// Digits and uppercase letters.
    Alphanumeric,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerificationCodeRequest {
    #[serde(default)]
    pub format: CodeFormat,
    #[serde(default = "default_code_len")]
    pub length: usize,
}

impl Default for VerificationCodeRequest {
    fn default() -> Self {
        Self {
            format: CodeFormat::default(),
            length: DEFAULT_CODE_LEN,
        }
    }
}

fn default_code_len() -> usize {
    DEFAULT_CODE_LEN
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerificationCodeResponse {
    pub user_id: String,
    pub format: CodeFormat,
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_code_request_defaults() {
        let req: VerificationCodeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.format, CodeFormat::Numeric);
        assert_eq!(req.length, DEFAULT_CODE_LEN);

        let req: VerificationCodeRequest =
            serde_json::from_str(r#"{"format":"alphanumeric","length":8}"#).unwrap();
        assert_eq!(req.format, CodeFormat::Alphanumeric);
        assert_eq!(req.length, 8);
    }

    #[test]
    fn wallet_response_omits_key_material() {
        let record = CustodialWalletRecord {
            account_index: 3,
            derivation_path: "m/44'/60'/0'/0/3".to_string(),
            public_address: WalletAddress::from("0xabc".to_string()),
            encrypted_private_key: EncryptedSecret::from("00:11:22".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(WalletResponse::from(&record)).unwrap();
        assert_eq!(json["account_index"], 3);
        assert_eq!(json["public_address"], "0xabc");
        assert!(json.get("encrypted_private_key").is_none());
    }
}
