// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store of provisioned custodial wallets, keyed by account index.
//!
//! Records only ever hold sealed key material, so the store itself needs no
//! special handling of secrets.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::models::CustodialWalletRecord;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    wallets: BTreeMap<u32, CustodialWalletRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new record. An account index can be provisioned once.
    pub fn insert_wallet(&mut self, record: CustodialWalletRecord) -> Result<(), ApiError> {
        if self.wallets.contains_key(&record.account_index) {
            return Err(ApiError::conflict(format!(
                "Account {} already has a wallet",
                record.account_index
            )));
        }
        self.wallets.insert(record.account_index, record);
        Ok(())
    }

    pub fn wallet(&self, account_index: u32) -> Option<&CustodialWalletRecord> {
        self.wallets.get(&account_index)
    }

    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }
}
