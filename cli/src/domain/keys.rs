//! Bootstrap keypair and recipient key types.
//!
//! The pipeline never holds the private half in memory: a [`KeyPair`] only
//! names the file that contains it, alongside the public recipient derived
//! from it.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::error::KeyError;

const RECIPIENT_PREFIX: &str = "age1";

/// Bech32 data alphabet used by age recipients.
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Validated public half of the bootstrap keypair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecipientKey(String);

impl RecipientKey {
    /// Validate a recipient string, tolerating surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidRecipient`] if the string is not an
    /// `age1`-prefixed bech32 key.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        let key = raw.trim();
        let body = key
            .strip_prefix(RECIPIENT_PREFIX)
            .ok_or_else(|| KeyError::InvalidRecipient(key.to_string()))?;
        if body.len() < 50 || !body.chars().all(|c| BECH32_CHARSET.contains(c)) {
            return Err(KeyError::InvalidRecipient(key.to_string()));
        }
        Ok(Self(key.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecipientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keypair as returned by generation: where the private half lives and the
/// public recipient it corresponds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_path: PathBuf,
    pub recipient: RecipientKey,
}
