//! `Encryptor` via `age` / `age-keygen`.
//!
//! The private key only ever exists in the file `age-keygen` writes. The
//! recipient is always re-derived from that file with `age-keygen -y` rather
//! than scraped from generator output.

use std::path::Path;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

use crate::application::ports::{CommandRunner, Encryptor};
use crate::domain::{KeyPair, RecipientKey};
use crate::infra::command_runner::ensure_success;
use crate::infra::host::LinuxHost;

impl<R: CommandRunner> Encryptor for LinuxHost<R> {
    async fn generate_keypair(&self, path: &Path) -> Result<KeyPair> {
        let file = path.to_str().context("key path is not valid UTF-8")?;
        self.checked("age-keygen", "age-keygen", &["-o", file]).await?;
        let recipient = self.recipient_of(path).await?;
        Ok(KeyPair {
            private_path: path.to_path_buf(),
            recipient,
        })
    }

    async fn recipient_of(&self, path: &Path) -> Result<RecipientKey> {
        let file = path.to_str().context("key path is not valid UTF-8")?;
        let output = self.checked("age-keygen -y", "age-keygen", &["-y", file]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .context("age-keygen -y printed no recipient")?;
        Ok(RecipientKey::parse(line)?)
    }

    async fn encrypt(&self, plaintext: &SecretString, recipient: &RecipientKey) -> Result<Vec<u8>> {
        let output = self
            .runner
            .run_with_stdin(
                "age",
                &["--encrypt", "--recipient", recipient.as_str()],
                plaintext.expose_secret().as_bytes(),
            )
            .await?;
        ensure_success(&output, "age --encrypt")?;
        Ok(output.stdout)
    }
}
