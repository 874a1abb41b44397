// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custody Core - Custodial Key Management Service
//!
//! Deterministic per-account EVM wallets derived from one master seed, with
//! private keys sealed at rest and every privileged admin action recorded in
//! a redacted, append-only audit log.
//!
//! ## Modules
//!
//! - `custody` - Master key derivation, envelope encryption, one-time codes
//! - `audit` - Admin audit recorder (redaction, entries, sink, middleware)
//! - `auth` - Operator authentication (HS256 JWT)
//! - `api` - HTTP API handlers (Axum)
//! - `config` - Environment configuration

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod custody;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod store;
