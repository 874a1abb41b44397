// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Redaction of request data before it reaches the audit store.
//!
//! Request query and body data are converted into [`AuditValue`], a closed
//! value type with two extra variants: [`AuditValue::Redacted`] for fields
//! whose name looks sensitive and [`AuditValue::Truncated`] for subtrees below
//! the depth bound. Both serialize as fixed marker strings.
//!
//! Keys are compared in a normalized form: lowercase, with `_` and `-`
//! removed, so `seedPhrase`, `seed_phrase` and `seed-phrase` all match
//! `seedphrase`. A key is sensitive when:
//! - its normalized form contains one of the configured substrings
//!   (`password`, `secret`, `masterkey`, ...)
//! - its normalized form is `otp`, or starts or ends with it
//! - its lowercase form ends with `_key` or `-key`
//! - its lowercase form contains both `api` and `key`
//!
//! Redaction is idempotent: redacting an already redacted value is a no-op.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Replaces the value of a sensitive field.
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Replaces a subtree nested deeper than the policy allows.
pub const TRUNCATED_MARKER: &str = "[TRUNCATED]";

/// Default maximum nesting depth kept in audit entries.
pub const DEFAULT_MAX_DEPTH: usize = 8;

const DEFAULT_SENSITIVE_SUBSTRINGS: &[&str] = &[
    "password",
    "passphrase",
    "secret",
    "token",
    "jwt",
    "authorization",
    "mnemonic",
    "seedphrase",
    "privatekey",
    "masterkey",
    "encryptionkey",
];

/// Matched at either end of a normalized key only, so `footprint` is kept.
const OTP: &str = "otp";

/// Request data as recorded in an audit entry.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<AuditValue>),
    Object(BTreeMap<String, AuditValue>),
    /// A sensitive field's value.
    Redacted,
    /// A subtree beyond the depth bound, dropped wholesale.
    Truncated,
}

impl From<serde_json::Value> for AuditValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AuditValue::Null,
            serde_json::Value::Bool(b) => AuditValue::Bool(b),
            serde_json::Value::Number(n) => AuditValue::Number(n),
            serde_json::Value::String(s) => AuditValue::String(s),
            serde_json::Value::Array(items) => {
                AuditValue::Array(items.into_iter().map(AuditValue::from).collect())
            }
            serde_json::Value::Object(map) => AuditValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, AuditValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for AuditValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AuditValue::Null => serializer.serialize_unit(),
            AuditValue::Bool(b) => serializer.serialize_bool(*b),
            AuditValue::Number(n) => n.serialize(serializer),
            AuditValue::String(s) => serializer.serialize_str(s),
            AuditValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AuditValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            AuditValue::Redacted => serializer.serialize_str(REDACTED_MARKER),
            AuditValue::Truncated => serializer.serialize_str(TRUNCATED_MARKER),
        }
    }
}

/// Which keys are sensitive, and how deep to walk.
#[derive(Debug, Clone)]
pub struct RedactionPolicy {
    sensitive_substrings: Vec<String>,
    max_depth: usize,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            sensitive_substrings: DEFAULT_SENSITIVE_SUBSTRINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RedactionPolicy {
    /// Set the depth bound. The root is depth 0.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Add a sensitive substring (matched against the normalized key).
    pub fn with_sensitive_substring(mut self, needle: impl Into<String>) -> Self {
        self.sensitive_substrings.push(normalize_key(&needle.into()));
        self
    }

    pub fn is_sensitive_key(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        let normalized = normalize_key(&lower);
        self.sensitive_substrings
            .iter()
            .any(|needle| normalized.contains(needle.as_str()))
            || normalized.starts_with(OTP)
            || normalized.ends_with(OTP)
            || lower.ends_with("_key")
            || lower.ends_with("-key")
            || (lower.contains("api") && lower.contains("key"))
    }

    /// Return a redacted deep copy of `value`.
    pub fn redact(&self, value: &AuditValue) -> AuditValue {
        self.redact_at(value, 0)
    }

    /// Convert and redact a JSON value in one step.
    pub fn redact_json(&self, value: serde_json::Value) -> AuditValue {
        self.redact(&AuditValue::from(value))
    }

    fn redact_at(&self, value: &AuditValue, depth: usize) -> AuditValue {
        if depth > self.max_depth {
            return AuditValue::Truncated;
        }

        match value {
            AuditValue::Object(map) => AuditValue::Object(
                map.iter()
                    .map(|(k, v)| {
                        let v = if self.is_sensitive_key(k) {
                            AuditValue::Redacted
                        } else {
                            self.redact_at(v, depth + 1)
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
            AuditValue::Array(items) => AuditValue::Array(
                items
                    .iter()
                    .map(|item| self.redact_at(item, depth + 1))
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn to_json(value: &AuditValue) -> serde_json::Value {
        serde_json::to_value(value).unwrap()
    }

    #[test]
    fn redacts_nested_sensitive_leaves() {
        let policy = RedactionPolicy::default();
        let redacted = policy.redact_json(json!({
            "password": "x",
            "nested": { "api_key": "y", "ok": 1 }
        }));

        assert_eq!(
            to_json(&redacted),
            json!({
                "password": REDACTED_MARKER,
                "nested": { "api_key": REDACTED_MARKER, "ok": 1 }
            })
        );
    }

    #[test]
    fn redaction_is_idempotent() {
        let policy = RedactionPolicy::default().with_max_depth(2);
        let once = policy.redact_json(json!({
            "password": "x",
            "items": [{ "token": "t", "deep": { "deeper": { "deepest": 1 } } }],
            "name": "ok"
        }));
        let twice = policy.redact(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn key_rules() {
        let policy = RedactionPolicy::default();
        for key in [
            "password",
            "newPassword",
            "client_secret",
            "accessToken",
            "JWT",
            "Authorization",
            "mnemonic",
            "seed_phrase",
            "privateKey",
            "private_key",
            "encryption_key",
            "apiKey",
            "X-Api-Key",
            "seedPhrase",
            "seed-phrase",
            "masterKey",
            "master_key",
            "encryptionKey",
            "walletEncryptionKey",
            "otp",
            "OTP",
            "otpCode",
            "email_otp",
            "signing-key",
        ] {
            assert!(policy.is_sensitive_key(key), "{key} should be sensitive");
        }

        for key in [
            "id",
            "userId",
            "email",
            "amount",
            "keyboard",
            "monkey",
            "api_version",
            "footprint",
            "hotpath",
        ] {
            assert!(!policy.is_sensitive_key(key), "{key} should not be sensitive");
        }
    }

    #[test]
    fn arrays_are_walked() {
        let policy = RedactionPolicy::default();
        let redacted = policy.redact_json(json!([
            { "secret": "a", "keep": true },
            [{ "refresh_token": "b" }]
        ]));
        assert_eq!(
            to_json(&redacted),
            json!([
                { "secret": REDACTED_MARKER, "keep": true },
                [{ "refresh_token": REDACTED_MARKER }]
            ])
        );
    }

    #[test]
    fn sensitive_containers_are_replaced_whole() {
        let policy = RedactionPolicy::default();
        let redacted = policy.redact_json(json!({ "secrets": { "a": 1, "b": [2] } }));
        assert_eq!(to_json(&redacted), json!({ "secrets": REDACTED_MARKER }));
    }

    #[test]
    fn subtrees_past_the_bound_are_truncated() {
        let policy = RedactionPolicy::default().with_max_depth(2);
        let redacted = policy.redact_json(json!({
            "a": { "b": { "c": { "d": "too deep" } }, "sibling": 1 }
        }));

        // Root is depth 0, so the value under "c" sits at depth 3.
        assert_eq!(
            to_json(&redacted),
            json!({ "a": { "b": { "c": TRUNCATED_MARKER }, "sibling": 1 } })
        );
    }

    #[test]
    fn scalars_pass_through() {
        let policy = RedactionPolicy::default();
        assert_eq!(policy.redact_json(json!(null)), AuditValue::Null);
        assert_eq!(policy.redact_json(json!("plain")), AuditValue::String("plain".into()));
        assert_eq!(to_json(&policy.redact_json(json!(1.5))), json!(1.5));
    }

    #[test]
    fn custom_substrings() {
        let policy = RedactionPolicy::default().with_sensitive_substring("SSN");
        let redacted = policy.redact_json(json!({ "customer_ssn": "123-45-6789" }));
        assert_eq!(to_json(&redacted), json!({ "customer_ssn": REDACTED_MARKER }));
    }
}
