// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Custody Module
//!
//! Key material handling for custodial wallets.
//!
//! ## Provisioning Flow
//!
//! 1. [`MasterKeyManager::derive_keypair`] mints the keypair for an account
//!    index from the master seed
//! 2. [`EnvelopeCipher::encrypt`] seals the private key
//! 3. The caller persists the [`EncryptedSecret`] and drops the plaintext
//!
//! Verification codes and reset tokens come from [`tokens`], which has no
//! dependency on the key material.

pub mod envelope;
pub mod master_key;
pub mod tokens;

pub use envelope::{CipherError, EncryptedSecret, EnvelopeCipher};
pub use master_key::{DerivedKeypair, KeyError, MasterKeyContext, MasterKeyManager};
pub use tokens::{TokenError, DEFAULT_CODE_LEN, DEFAULT_TOKEN_LEN};
