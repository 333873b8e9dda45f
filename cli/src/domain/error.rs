//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Failures the pipeline names explicitly. Collaborator diagnostics are
/// carried as `anyhow` context on top of these.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("hostprep must run as root (current uid {uid}). Re-run with: sudo hostprep")]
    NotPrivileged { uid: u32 },

    #[error("unsupported operating system '{id} {version}': supported releases are {supported}")]
    UnsupportedOs {
        id: String,
        version: String,
        supported: String,
    },

    #[error("no supported Python interpreter is installable (tried: {tried})")]
    NoInterpreter { tried: String },

    #[error("service '{unit}' did not reach the active state.\n\nRecent log lines:\n{diagnostics}")]
    ServiceInactive { unit: String, diagnostics: String },

    #[error("existing key file {path} yields no recipient key; refusing to regenerate it")]
    UnreadableKeyFile { path: String },
}

// ── Template errors ───────────────────────────────────────────────────────────

/// Errors raised while resolving the configuration template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template requires placeholder {token} but no value was supplied")]
    MissingValue { token: &'static str },

    #[error("resolved configuration still contains placeholder {token}")]
    Unresolved { token: String },

    #[error("value for {token} is empty")]
    EmptyValue { token: &'static str },
}

// ── Key errors ────────────────────────────────────────────────────────────────

/// Errors related to the bootstrap keypair.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid recipient key {0:?}: expected an age1… public key")]
    InvalidRecipient(String),

    #[error("invalid TRADING_WALLET_KEY: {0}; expected a base58-encoded 64-byte keypair")]
    InvalidWallet(String),
}
