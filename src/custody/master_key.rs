// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Master key manager for deterministic custodial wallet derivation.
//!
//! A single BIP-39 seed phrase is the root of every custodial wallet. The
//! root extended key is built from it once, on first use, and every account
//! wallet is derived from it along the Ethereum BIP-44 path:
//!
//! ```text
//! m/44'/60'/0'/0/{account_index}
//! ```
//!
//! ## Security
//!
//! - The seed phrase and the root key are never logged or serialized
//! - Derived private keys live in zeroize-on-drop buffers
//! - Callers must encrypt a derived private key immediately and drop the
//!   plaintext (see [`super::envelope`])

use std::fmt;
use std::sync::{Mutex, OnceLock};

use alloy::signers::local::PrivateKeySigner;
use bip32::{ChildNumber, DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use thiserror::Error;
use zeroize::Zeroizing;

/// Hardened purpose, coin type and account, then the external chain.
const EXTERNAL_CHAIN_PATH: &str = "m/44'/60'/0'/0";

/// Errors raised by the master key manager.
#[derive(Debug, Error)]
pub enum KeyError {
    /// No seed phrase is configured.
    #[error("master seed phrase is not configured")]
    ConfigMissing,
    /// The configured seed phrase fails BIP-39 validation.
    #[error("master seed phrase is invalid")]
    ConfigInvalid,
    /// The index cannot be used as a non-hardened child.
    #[error("derivation index {0} is out of range")]
    InvalidIndex(u32),
    /// BIP-32 derivation failed (practically unreachable for valid keys).
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// The process-wide root key. Immutable once built.
pub struct MasterKeyContext {
    root: XPrv,
}

impl MasterKeyContext {
    /// Validate a mnemonic and build the root extended key from its seed.
    fn from_phrase(phrase: &str) -> Result<Self, KeyError> {
        let normalized = Zeroizing::new(phrase.split_whitespace().collect::<Vec<_>>().join(" "));
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|_| KeyError::ConfigInvalid)?;

        let seed = Zeroizing::new(mnemonic.to_seed_normalized(""));
        let root = XPrv::new(seed.as_slice()).map_err(|e| KeyError::Derivation(e.to_string()))?;

        Ok(Self { root })
    }

    /// Derive the keypair at `m/44'/60'/0'/0/{index}`.
    pub fn derive(&self, index: u32) -> Result<DerivedKeypair, KeyError> {
        let leaf = ChildNumber::new(index, false).map_err(|_| KeyError::InvalidIndex(index))?;
        let chain: DerivationPath = EXTERNAL_CHAIN_PATH
            .parse()
            .map_err(|e: bip32::Error| KeyError::Derivation(e.to_string()))?;

        let mut node = self.root.clone();
        for child in chain.iter().chain(std::iter::once(leaf)) {
            node = node
                .derive_child(child)
                .map_err(|e| KeyError::Derivation(e.to_string()))?;
        }

        let signing_key: k256::ecdsa::SigningKey = node.private_key().clone();
        let private_key = Zeroizing::new(alloy::hex::encode_prefixed(signing_key.to_bytes()));
        let signer = PrivateKeySigner::from_signing_key(signing_key);

        Ok(DerivedKeypair {
            derivation_index: index,
            derivation_path: derivation_path(index),
            public_address: signer.address().to_checksum(None),
            private_key,
        })
    }
}

impl fmt::Debug for MasterKeyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKeyContext").finish_non_exhaustive()
    }
}

/// A keypair derived for one account.
///
/// Never serialized. `Debug` output omits the private key.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKeypair {
    /// Final (non-hardened) path component.
    pub derivation_index: u32,
    /// Full BIP-44 path, e.g. `m/44'/60'/0'/0/7`.
    pub derivation_path: String,
    /// EIP-55 checksummed address.
    pub public_address: String,
    private_key: Zeroizing<String>,
}

impl DerivedKeypair {
    /// `0x`-prefixed hex of the secp256k1 secret scalar.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for DerivedKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeypair")
            .field("derivation_index", &self.derivation_index)
            .field("derivation_path", &self.derivation_path)
            .field("public_address", &self.public_address)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Format the derivation path for an account index.
pub fn derivation_path(index: u32) -> String {
    format!("{EXTERNAL_CHAIN_PATH}/{index}")
}

/// Owns the configured seed phrase and the lazily built root key.
///
/// The root key is built at most once. Concurrent first callers serialize on
/// an init lock; once the context is set, reads never take the lock.
pub struct MasterKeyManager {
    seed_phrase: Option<Zeroizing<String>>,
    context: OnceLock<MasterKeyContext>,
    init_lock: Mutex<()>,
}

impl MasterKeyManager {
    /// Create a manager. An empty or whitespace-only phrase counts as missing.
    pub fn new(seed_phrase: Option<Zeroizing<String>>) -> Self {
        Self {
            seed_phrase: seed_phrase.filter(|p| !p.trim().is_empty()),
            context: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Whether a seed phrase was configured at all.
    pub fn is_configured(&self) -> bool {
        self.seed_phrase.is_some()
    }

    /// Return the root key context, building it on first call.
    pub fn master_context(&self) -> Result<&MasterKeyContext, KeyError> {
        if let Some(ctx) = self.context.get() {
            return Ok(ctx);
        }

        // A poisoned lock only means another initializer panicked; the
        // OnceLock is still consistent.
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(ctx) = self.context.get() {
            return Ok(ctx);
        }

        let phrase = self.seed_phrase.as_ref().ok_or(KeyError::ConfigMissing)?;
        let ctx = MasterKeyContext::from_phrase(phrase)?;
        tracing::info!("Master key context initialized");

        Ok(self.context.get_or_init(|| ctx))
    }

    /// Derive the keypair for an account index.
    pub fn derive_keypair(&self, index: u32) -> Result<DerivedKeypair, KeyError> {
        self.master_context()?.derive(index)
    }
}

impl fmt::Debug for MasterKeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKeyManager")
            .field("configured", &self.is_configured())
            .field("initialized", &self.context.get().is_some())
            .finish()
    }
}
