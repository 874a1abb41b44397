// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::audit::AuditRecorder;
use crate::auth::OperatorAuth;
use crate::custody::{EnvelopeCipher, MasterKeyManager};
use crate::store::InMemoryStore;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<MasterKeyManager>,
    pub cipher: EnvelopeCipher,
    pub store: Arc<RwLock<InMemoryStore>>,
    pub audit: AuditRecorder,
    pub operator_auth: OperatorAuth,
}

impl AppState {
    pub fn new(
        keys: MasterKeyManager,
        cipher: EnvelopeCipher,
        audit: AuditRecorder,
        operator_auth: OperatorAuth,
    ) -> Self {
        Self {
            keys: Arc::new(keys),
            cipher,
            store: Arc::new(RwLock::new(InMemoryStore::new())),
            audit,
            operator_auth,
        }
    }
}
