// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One-time codes and reset tokens.
//!
//! Every symbol is drawn from the OS CSPRNG with uniform range sampling, so
//! there is no modulo bias toward the start of an alphabet. Expiry and
//! single-use enforcement are the caller's job.

use rand::{rngs::OsRng, Rng};
use thiserror::Error;

const NUMERIC: &[u8] = b"0123456789";
const ALPHANUMERIC_UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ALPHANUMERIC_MIXED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default length of verification codes.
pub const DEFAULT_CODE_LEN: usize = 6;

/// Default length of reset tokens.
pub const DEFAULT_TOKEN_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("code length must be greater than zero")]
    InvalidLength,
}

/// Digits only, e.g. `"048213"`.
pub fn generate_numeric_code(len: usize) -> Result<String, TokenError> {
    sample(NUMERIC, len)
}

/// Uppercase letters and digits, e.g. `"K7Q2ZD"`.
pub fn generate_alphanumeric_code(len: usize) -> Result<String, TokenError> {
    sample(ALPHANUMERIC_UPPER, len)
}

/// Mixed-case letters and digits, for longer-lived reset tokens.
pub fn generate_secure_token(len: usize) -> Result<String, TokenError> {
    sample(ALPHANUMERIC_MIXED, len)
}

fn sample(alphabet: &[u8], len: usize) -> Result<String, TokenError> {
    if len == 0 {
        return Err(TokenError::InvalidLength);
    }

    let mut rng = OsRng;
    Ok((0..len)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect())
}
