// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Audit Recorder
//!
//! Fire-and-forget delivery of audit entries.
//!
//! Request handlers hand entries to [`AuditRecorder::record`], which never
//! blocks and never fails: the entry is pushed onto a bounded channel with
//! `try_send`, and dropped with a warning if the queue is full or the worker
//! has stopped. A single [`AuditWorker`] drains the channel into the
//! configured [`AuditSink`].
//!
//! Delivery is best-effort, at most once. Sink errors are logged and
//! discarded, never retried.
//!
//! ## Shutdown
//!
//! The worker stops when its `CancellationToken` is cancelled, after
//! delivering whatever is already queued.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::entry::AuditLogEntry;
use super::middleware::AuditScope;
use super::redaction::RedactionPolicy;
use super::sink::AuditSink;

/// Default capacity of the audit queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Handle used by the request path to submit entries.
#[derive(Clone, Debug)]
pub struct AuditRecorder {
    tx: mpsc::Sender<AuditLogEntry>,
    policy: Arc<RedactionPolicy>,
}

impl AuditRecorder {
    /// Create a recorder and the worker that feeds `sink`.
    ///
    /// The worker must be spawned for entries to be delivered:
    /// ```rust,ignore
    /// let (recorder, worker) = AuditRecorder::new(sink, 1024, policy, shutdown.clone());
    /// tokio::spawn(worker.run());
    /// ```
    pub fn new<S: AuditSink>(
        sink: S,
        capacity: usize,
        policy: RedactionPolicy,
        shutdown: CancellationToken,
    ) -> (Self, AuditWorker<S>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let recorder = Self {
            tx,
            policy: Arc::new(policy),
        };
        let worker = AuditWorker { rx, sink, shutdown };
        (recorder, worker)
    }

    /// Queue an entry without waiting.
    pub fn record(&self, entry: AuditLogEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                warn!(
                    action = %entry.action,
                    entry_id = %entry.entry_id,
                    "Audit queue full; entry dropped"
                );
            }
            Err(TrySendError::Closed(entry)) => {
                warn!(
                    action = %entry.action,
                    entry_id = %entry.entry_id,
                    "Audit worker stopped; entry dropped"
                );
            }
        }
    }

    /// Redaction policy applied to captured request data.
    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Middleware state for a privileged route.
    pub fn scope(&self, action: &str, entity_type: Option<&str>) -> AuditScope {
        AuditScope::new(self.clone(), action, entity_type)
    }
}

/// Background task that delivers queued entries to the sink.
pub struct AuditWorker<S> {
    rx: mpsc::Receiver<AuditLogEntry>,
    sink: S,
    shutdown: CancellationToken,
}

impl<S: AuditSink> AuditWorker<S> {
    /// Run until cancelled or until every recorder handle is dropped.
    pub async fn run(mut self) {
        info!("Audit worker starting");

        loop {
            tokio::select! {
                maybe_entry = self.rx.recv() => match maybe_entry {
                    Some(entry) => self.deliver(entry).await,
                    None => break,
                },
                _ = self.shutdown.cancelled() => {
                    self.rx.close();
                    while let Some(entry) = self.rx.recv().await {
                        self.deliver(entry).await;
                    }
                    break;
                }
            }
        }

        info!("Audit worker shutting down");
    }

    async fn deliver(&self, entry: AuditLogEntry) {
        match self.sink.append(&entry).await {
            Ok(()) => debug!(entry_id = %entry.entry_id, action = %entry.action, "Audit entry stored"),
            Err(e) => warn!(
                error = %e,
                entry_id = %entry.entry_id,
                action = %entry.action,
                "Failed to append audit entry"
            ),
        }
    }
}
