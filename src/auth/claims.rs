// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator token claims and the authenticated operator.

use serde::{Deserialize, Serialize};

/// Operator roles.
///
/// Only [`Role::Admin`] may call `/v1/admin/*`. Tokens with any other role
/// (or no role) authenticate but are refused with `403`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Support,
    Auditor,
}

impl Role {
    /// Parse a role claim (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "support" => Some(Role::Support),
            "auditor" => Some(Role::Auditor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Support => write!(f, "support"),
            Role::Auditor => write!(f, "auditor"),
        }
    }
}

/// Claims carried by an operator bearer token (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorClaims {
    /// Operator user ID.
    pub sub: String,
    /// Expiration (Unix seconds).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// The operator behind the current request.
///
/// Inserted into request extensions by the auth layer; the audit middleware
/// reads `user_id` from there as the actor identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Build from verified claims. `None` when the role claim is missing or
    /// unknown.
    pub fn from_claims(claims: OperatorClaims) -> Option<Self> {
        let role = claims.role.as_deref().and_then(Role::parse)?;
        Some(Self {
            user_id: claims.sub,
            role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
