// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit log stores.
//!
//! [`AuditSink`] is the append-only collaborator the background worker
//! delivers entries to. [`JsonlAuditSink`] appends to daily JSONL files:
//!
//! ```text
//! {AUDIT_LOG_DIR}/
//!   2026-01-31.jsonl   # one JSON object per line
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::entry::AuditLogEntry;

/// Errors raised while appending an entry.
#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize audit entry: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Audit store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only destination for audit entries.
pub trait AuditSink: Send + Sync + 'static {
    fn append(
        &self,
        entry: &AuditLogEntry,
    ) -> impl Future<Output = Result<(), AuditSinkError>> + Send;
}

/// Appends entries to `{dir}/{YYYY-MM-DD}.jsonl`.
#[derive(Debug)]
pub struct JsonlAuditSink {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the file holding entries for `date` (`YYYY-MM-DD`).
    pub fn day_file(&self, date: &str) -> PathBuf {
        self.dir.join(format!("{date}.jsonl"))
    }
}

impl AuditSink for JsonlAuditSink {
    async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let path = self.day_file(&entry.timestamp.format("%Y-%m-%d").to_string());

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory sinks for exercising the recorder.

    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    /// Collects every appended entry.
    #[derive(Clone, Default)]
    pub struct MemorySink {
        pub entries: Arc<Mutex<Vec<AuditLogEntry>>>,
    }

    impl MemorySink {
        pub fn snapshot(&self) -> Vec<AuditLogEntry> {
            self.entries.lock().unwrap().clone()
        }

        /// Wait until at least `count` entries arrived (or give up after 2 s).
        pub async fn wait_for(&self, count: usize) -> Vec<AuditLogEntry> {
            for _ in 0..200 {
                let entries = self.snapshot();
                if entries.len() >= count {
                    return entries;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            self.snapshot()
        }
    }

    impl AuditSink for MemorySink {
        async fn append(&self, entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    /// Always fails.
    pub struct FailingSink;

    impl AuditSink for FailingSink {
        async fn append(&self, _entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
            Err(AuditSinkError::Unavailable("store is down".to_string()))
        }
    }

    /// Takes a long time per entry.
    pub struct SlowSink(pub Duration);

    impl AuditSink for SlowSink {
        async fn append(&self, _entry: &AuditLogEntry) -> Result<(), AuditSinkError> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }
}
