// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Envelope encryption for secrets at rest.
//!
//! Secrets (derived private keys, mostly) are sealed with AES-256-GCM under
//! the configured wallet encryption key. Every call draws a fresh 96-bit
//! nonce from the OS CSPRNG.
//!
//! ## Wire Format
//!
//! ```text
//! {nonce:24 hex}:{tag:32 hex}:{ciphertext hex}
//! ```
//!
//! All segments are lowercase hex, so the `:` delimiter never appears inside
//! a segment and the whole value fits in a single text column.

use std::fmt;

use aes_gcm::{
    aead::{AeadCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce, Tag,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum configured key length, in characters.
pub const MIN_KEY_LEN: usize = 32;

/// Segment delimiter.
pub const DELIMITER: char = ':';

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors raised by the envelope cipher.
///
/// Decryption failures carry no detail beyond the format/authentication
/// split.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// No encryption key is configured.
    #[error("wallet encryption key is not configured")]
    KeyMissing,
    /// The configured key is shorter than [`MIN_KEY_LEN`] characters.
    #[error("wallet encryption key must be at least {MIN_KEY_LEN} characters")]
    KeyTooShort,
    /// The payload is not a well-formed `nonce:tag:ciphertext` string.
    #[error("encrypted payload is malformed")]
    MalformedPayload,
    /// The payload did not authenticate under the configured key.
    #[error("decryption failed")]
    AuthenticationFailed,
    /// Sealing failed.
    #[error("encryption failed")]
    EncryptionFailed,
}

/// A sealed secret in `nonce:tag:ciphertext` form.
///
/// Holding one says nothing about validity; [`EnvelopeCipher::decrypt`] is
/// the only check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncryptedSecret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AES-256-GCM cipher bound to the configured key.
#[derive(Clone)]
pub struct EnvelopeCipher {
    cipher: Aes256Gcm,
}

impl EnvelopeCipher {
    /// Build the cipher from the configured key string.
    ///
    /// Only the first 32 bytes of the key are used.
    pub fn new(key: Option<&str>) -> Result<Self, CipherError> {
        let key = key.filter(|k| !k.is_empty()).ok_or(CipherError::KeyMissing)?;
        if key.chars().count() < MIN_KEY_LEN {
            return Err(CipherError::KeyTooShort);
        }

        let mut raw = Zeroizing::new([0u8; 32]);
        raw.copy_from_slice(&key.as_bytes()[..32]);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(raw.as_slice()));

        Ok(Self { cipher })
    }

    /// Seal a secret under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|_| CipherError::EncryptionFailed)?;

        Ok(EncryptedSecret(format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            alloy::hex::encode(nonce),
            alloy::hex::encode(tag),
            alloy::hex::encode(&buffer),
        )))
    }

    /// Open a sealed secret.
    ///
    /// The returned plaintext is zeroized on drop; callers should use it and
    /// let it go.
    pub fn decrypt(&self, payload: &EncryptedSecret) -> Result<Zeroizing<String>, CipherError> {
        let mut segments = payload.as_str().split(DELIMITER);
        let (Some(nonce), Some(tag), Some(ciphertext), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(CipherError::MalformedPayload);
        };

        let nonce = decode_segment(nonce)?;
        let tag = decode_segment(tag)?;
        let mut buffer = decode_segment(ciphertext)?;

        if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(CipherError::MalformedPayload);
        }

        self.cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&nonce),
                b"",
                &mut buffer,
                Tag::from_slice(&tag),
            )
            .map_err(|_| CipherError::AuthenticationFailed)?;

        String::from_utf8(buffer)
            .map(Zeroizing::new)
            .map_err(|_| CipherError::MalformedPayload)
    }
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher").finish_non_exhaustive()
    }
}

/// Decode one lowercase-hex segment. Uppercase and `0x` prefixes are rejected
/// so every payload has exactly one spelling.
fn decode_segment(segment: &str) -> Result<Vec<u8>, CipherError> {
    let canonical = segment.len() % 2 == 0
        && segment
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !canonical {
        return Err(CipherError::MalformedPayload);
    }
    alloy::hex::decode(segment).map_err(|_| CipherError::MalformedPayload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef-extra-ignored";

    fn cipher() -> EnvelopeCipher {
        EnvelopeCipher::new(Some(KEY)).unwrap()
    }

    fn flip_hex(c: char) -> char {
        if c == '0' {
            '1'
        } else {
            '0'
        }
    }

    #[test]
    fn round_trip() {
        let c = cipher();
        let plaintexts = [
            "",
            "x",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "ünïcödé ✓",
        ];
        for plaintext in plaintexts {
            let sealed = c.encrypt(plaintext).unwrap();
            assert_eq!(c.decrypt(&sealed).unwrap().as_str(), plaintext);
        }
    }

    #[test]
    fn same_plaintext_yields_different_payloads() {
        let c = cipher();
        let a = c.encrypt("secret").unwrap();
        let b = c.encrypt("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn payload_shape() {
        let sealed = cipher().encrypt("abc").unwrap();
        let parts: Vec<&str> = sealed.as_str().split(DELIMITER).collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), NONCE_LEN * 2);
        assert_eq!(parts[1].len(), TAG_LEN * 2);
        assert_eq!(parts[2].len(), 6);
        assert!(sealed
            .as_str()
            .chars()
            .all(|c| c == DELIMITER || matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn only_first_32_bytes_of_key_are_used() {
        let sealed = cipher().encrypt("shared").unwrap();
        let other = EnvelopeCipher::new(Some("0123456789abcdef0123456789abcdef")).unwrap();
        assert_eq!(other.decrypt(&sealed).unwrap().as_str(), "shared");
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = cipher().encrypt("secret").unwrap();
        let other = EnvelopeCipher::new(Some("ffffffffffffffffffffffffffffffff")).unwrap();
        assert_eq!(other.decrypt(&sealed), Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn any_flipped_tag_or_ciphertext_char_fails_authentication() {
        let c = cipher();
        let sealed = c.encrypt("attack at dawn").unwrap();
        let text = sealed.as_str();
        let tag_start = NONCE_LEN * 2 + 1;

        for (i, ch) in text.char_indices().skip(tag_start) {
            if ch == DELIMITER {
                continue;
            }
            let mut tampered: Vec<char> = text.chars().collect();
            tampered[i] = flip_hex(ch);
            let tampered = EncryptedSecret::from(tampered.into_iter().collect::<String>());
            assert_eq!(
                c.decrypt(&tampered),
                Err(CipherError::AuthenticationFailed),
                "position {i} was not detected"
            );
        }
    }

    #[test]
    fn malformed_payloads_are_format_errors() {
        let c = cipher();
        let sealed = c.encrypt("secret").unwrap();
        let parts: Vec<&str> = sealed.as_str().split(DELIMITER).collect();

        let cases = vec![
            String::new(),
            "not-a-payload".to_string(),
            format!("{}:{}", parts[0], parts[1]),
            format!("{}:{}:{}:{}", parts[0], parts[1], parts[2], parts[2]),
            format!("{}:{}:zz", parts[0], parts[1]),
            format!("{}:{}:{}", parts[0].to_uppercase(), parts[1], parts[2]),
            format!("0x{}:{}:{}", parts[0], parts[1], parts[2]),
            format!("{}:{}:{}", &parts[0][..22], parts[1], parts[2]),
            format!("{}:{}:{}", parts[0], &parts[1][..30], parts[2]),
            format!("{}:{}:{}", parts[0], parts[1], &parts[2][..3]),
        ];

        for case in cases {
            assert_eq!(
                c.decrypt(&EncryptedSecret::from(case.clone())),
                Err(CipherError::MalformedPayload),
                "payload {case:?}"
            );
        }
    }

    #[test]
    fn key_validation() {
        assert_eq!(EnvelopeCipher::new(None).unwrap_err(), CipherError::KeyMissing);
        assert_eq!(EnvelopeCipher::new(Some("")).unwrap_err(), CipherError::KeyMissing);
        assert_eq!(
            EnvelopeCipher::new(Some("short-key")).unwrap_err(),
            CipherError::KeyTooShort
        );
        assert!(EnvelopeCipher::new(Some(&"k".repeat(MIN_KEY_LEN))).is_ok());
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", cipher());
        assert!(!rendered.contains("0123456789abcdef"));
    }
}
