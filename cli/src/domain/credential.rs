//! Plaintext wallet payload handling.
//!
//! The payload only ever exists as a [`SecretString`], which is zeroized when
//! dropped at the end of the credential step. The bot reads it back as a
//! base58 string of the 64-byte keypair (secret seed followed by public key).

use anyhow::{Context, Result};
use ed25519_dalek::SigningKey;
use secrecy::zeroize::{Zeroize, Zeroizing};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::error::KeyError;

/// Length of a decoded keypair payload.
pub const KEYPAIR_LEN: usize = 64;

/// Where the sealed payload came from, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadSource {
    /// Supplied by the operator through `TRADING_WALLET_KEY`.
    Operator,
    /// Freshly generated throwaway wallet for paper trading.
    GeneratedTestWallet,
}

/// Encode a signing key as the base58 keypair string the bot loads.
#[must_use]
pub fn wallet_base58(key: &SigningKey) -> SecretString {
    let bytes = Zeroizing::new(key.to_keypair_bytes());
    SecretString::from(bs58::encode(bytes.as_slice()).into_string())
}

/// Check that an operator wallet decodes to a consistent ed25519 keypair.
///
/// Errors never include the payload itself.
///
/// # Errors
///
/// Returns [`KeyError::InvalidWallet`] when the string is not base58, has
/// the wrong length, or its public half does not match its seed.
pub fn validate_wallet(wallet: &SecretString) -> Result<(), KeyError> {
    let decoded = Zeroizing::new(
        bs58::decode(wallet.expose_secret())
            .into_vec()
            .map_err(|_| KeyError::InvalidWallet("not a base58 string".into()))?,
    );
    let mut bytes: [u8; KEYPAIR_LEN] = decoded.as_slice().try_into().map_err(|_| {
        KeyError::InvalidWallet(format!(
            "decodes to {} bytes, expected {KEYPAIR_LEN}",
            decoded.len()
        ))
    })?;
    let consistent = SigningKey::from_keypair_bytes(&bytes).is_ok();
    bytes.zeroize();
    if consistent {
        Ok(())
    } else {
        Err(KeyError::InvalidWallet(
            "public key does not match secret seed".into(),
        ))
    }
}

/// Generate a new ed25519 test wallet from OS entropy.
///
/// # Errors
///
/// Returns an error if the OS entropy source is unavailable.
pub fn generate_test_wallet() -> Result<SecretString> {
    let mut seed = Zeroizing::new([0u8; 32]);
    getrandom::getrandom(seed.as_mut_slice()).context("reading OS entropy for test wallet")?;
    let key = SigningKey::from_bytes(&seed);
    Ok(wallet_base58(&key))
}
