// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Operator authentication for the admin API.
//!
//! ## Auth Flow
//!
//! 1. The operator presents `Authorization: Bearer <JWT>`
//! 2. The server verifies the HS256 signature against `OPERATOR_JWT_SECRET`,
//!    plus `exp` with a 60 second clock-skew leeway
//! 3. `sub` becomes the canonical operator `user_id`; `role` must be `admin`
//!
//! The resulting [`AuthenticatedUser`] is what the audit log records as the
//! actor of each privileged request.

pub mod claims;
pub mod error;
pub mod middleware;

pub use claims::{AuthenticatedUser, OperatorClaims, Role};
pub use error::AuthError;
pub use middleware::{require_admin, OperatorAuth};
