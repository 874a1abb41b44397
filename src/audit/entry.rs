// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit log entries for privileged operations.
//!
//! One entry is produced per privileged request, at completion time, whether
//! the request succeeded or not. Entries are append-only: nothing in this
//! crate updates or deletes them once they are handed to the sink.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::redaction::AuditValue;

/// Actor recorded when no authenticated user is attached to the request.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// What was asked of the server. Query and body are already redacted.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub method: String,
    pub path: String,
    pub query: AuditValue,
    pub body: AuditValue,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogEntry {
    /// Unique entry ID.
    pub entry_id: String,
    /// Completion time.
    pub timestamp: DateTime<Utc>,
    /// Authenticated user ID, or [`ANONYMOUS_ACTOR`].
    pub actor_identity: String,
    /// Action label, e.g. `wallet.provision`.
    pub action: String,
    /// Entity type label, e.g. `wallet`.
    pub entity_type: Option<String>,
    /// Entity identifier from the path or body, if any.
    pub entity_id: Option<String>,
    /// Whether the final status was 2xx.
    pub success: bool,
    pub source_ip: String,
    pub user_agent: Option<String>,
    /// Value of `x-request-id`, when present.
    pub request_id: Option<String>,
    pub request_summary: RequestSummary,
    pub status_code: u16,
    pub duration_ms: u64,
}

impl AuditLogEntry {
    /// Build an entry for a request that completed with `status_code`.
    pub fn new(
        action: impl Into<String>,
        actor_identity: impl Into<String>,
        request_summary: RequestSummary,
        status_code: u16,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            actor_identity: actor_identity.into(),
            action: action.into(),
            entity_type: None,
            entity_id: None,
            success: is_success(status_code),
            source_ip: "unknown".to_string(),
            user_agent: None,
            request_id: None,
            request_summary,
            status_code,
            duration_ms: 0,
        }
    }

    /// Set the entity type and (optional) identifier.
    pub fn with_entity(mut self, entity_type: Option<String>, entity_id: Option<String>) -> Self {
        self.entity_type = entity_type;
        self.entity_id = entity_id;
        self
    }

    /// Set the client details.
    pub fn with_client(
        mut self,
        source_ip: impl Into<String>,
        user_agent: Option<String>,
        request_id: Option<String>,
    ) -> Self {
        self.source_ip = source_ip.into();
        self.user_agent = user_agent;
        self.request_id = request_id;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Success is a 2xx final status; anything else is a failure.
pub fn is_success(status_code: u16) -> bool {
    (200..300).contains(&status_code)
}
