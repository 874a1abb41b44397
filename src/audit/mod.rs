// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Admin Audit Recorder
//!
//! Every privileged request produces exactly one [`AuditLogEntry`] describing
//! who did what, to which entity, from where, and with what outcome.
//!
//! - [`redaction`]: sensitive field masking and depth bounding
//! - [`entry`]: the entry type
//! - [`sink`]: append-only stores ([`JsonlAuditSink`] on disk)
//! - [`recorder`]: bounded queue and background worker
//! - [`middleware`]: the axum layer wrapping privileged routes
//!
//! Recording never blocks or fails the request it describes.

pub mod entry;
pub mod middleware;
pub mod recorder;
pub mod redaction;
pub mod sink;

pub use entry::{AuditLogEntry, RequestSummary, ANONYMOUS_ACTOR};
pub use middleware::{audit_privileged, AuditScope};
pub use recorder::{AuditRecorder, AuditWorker, DEFAULT_CHANNEL_CAPACITY};
pub use redaction::{AuditValue, RedactionPolicy};
pub use sink::{AuditSink, AuditSinkError, JsonlAuditSink};
