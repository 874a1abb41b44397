// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the startup loader.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MASTER_SEED_PHRASE` | BIP-39 mnemonic all custodial wallets derive from | Required at first derivation |
//! | `WALLET_ENCRYPTION_KEY` | Envelope key, at least 32 characters | Required |
//! | `OPERATOR_JWT_SECRET` | HS256 secret for operator bearer tokens | Required |
//! | `AUDIT_LOG_DIR` | Directory for daily JSONL audit files | `./audit` |
//! | `AUDIT_CHANNEL_CAPACITY` | Audit queue size | `1024` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! The seed phrase is not validated here. A bad phrase fails the first
//! derivation with `KeyError::ConfigInvalid`.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::audit::DEFAULT_CHANNEL_CAPACITY;
use crate::custody::envelope::MIN_KEY_LEN;

/// BIP-39 mnemonic for the Master Key Manager.
pub const MASTER_SEED_PHRASE_ENV: &str = "MASTER_SEED_PHRASE";

/// Envelope encryption key. Only the first 32 bytes are used.
pub const WALLET_ENCRYPTION_KEY_ENV: &str = "WALLET_ENCRYPTION_KEY";

/// HS256 secret that operator tokens are signed with.
pub const OPERATOR_JWT_SECRET_ENV: &str = "OPERATOR_JWT_SECRET";

pub const AUDIT_LOG_DIR_ENV: &str = "AUDIT_LOG_DIR";
pub const AUDIT_CHANNEL_CAPACITY_ENV: &str = "AUDIT_CHANNEL_CAPACITY";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_AUDIT_LOG_DIR: &str = "./audit";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason: format!("expected `json` or `pretty`, got `{other}`"),
            }),
        }
    }
}

/// Everything the server needs at startup.
pub struct AppConfig {
    pub master_seed_phrase: Option<Zeroizing<String>>,
    pub wallet_encryption_key: Zeroizing<String>,
    pub operator_jwt_secret: Zeroizing<String>,
    pub audit_log_dir: PathBuf,
    pub audit_channel_capacity: usize,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "master_seed_phrase",
                &self.master_seed_phrase.as_ref().map(|_| "[REDACTED]"),
            )
            .field("wallet_encryption_key", &"[REDACTED]")
            .field("operator_jwt_secret", &"[REDACTED]")
            .field("audit_log_dir", &self.audit_log_dir)
            .field("audit_channel_capacity", &self.audit_channel_capacity)
            .field("bind_addr", &self.bind_addr)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let master_seed_phrase = non_blank(MASTER_SEED_PHRASE_ENV).map(Zeroizing::new);

        let wallet_encryption_key = non_blank(WALLET_ENCRYPTION_KEY_ENV)
            .map(Zeroizing::new)
            .ok_or(ConfigError::Missing(WALLET_ENCRYPTION_KEY_ENV))?;
        if wallet_encryption_key.chars().count() < MIN_KEY_LEN {
            return Err(ConfigError::Invalid {
                name: WALLET_ENCRYPTION_KEY_ENV,
                reason: format!("must be at least {MIN_KEY_LEN} characters"),
            });
        }

        let operator_jwt_secret = non_blank(OPERATOR_JWT_SECRET_ENV)
            .map(Zeroizing::new)
            .ok_or(ConfigError::Missing(OPERATOR_JWT_SECRET_ENV))?;

        let audit_log_dir = non_blank(AUDIT_LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIT_LOG_DIR));

        let audit_channel_capacity = match non_blank(AUDIT_CHANNEL_CAPACITY_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: AUDIT_CHANNEL_CAPACITY_ENV,
                        reason: format!("expected a positive integer, got `{raw}`"),
                    })
                }
            },
            None => DEFAULT_CHANNEL_CAPACITY,
        };

        let host = non_blank(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match non_blank(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("expected a port number, got `{raw}`"),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}").parse().map_err(|_| {
            ConfigError::Invalid {
                name: HOST_ENV,
                reason: format!("`{host}` is not a valid bind address"),
            }
        })?;

        let log_format = match non_blank(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            master_seed_phrase,
            wallet_encryption_key,
            operator_jwt_secret,
            audit_log_dir,
            audit_channel_capacity,
            bind_addr,
            log_format,
        })
    }
}
