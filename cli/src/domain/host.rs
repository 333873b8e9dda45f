//! Host identity and the supported-release gate.
//!
//! Pure functions only: the `/etc/os-release` text and the effective uid are
//! read by the infra layer and handed in here.

use serde::Serialize;

use crate::domain::error::ProvisionError;

/// Only Ubuntu hosts are supported.
pub const SUPPORTED_OS_ID: &str = "ubuntu";

/// Ubuntu releases the pipeline is tested against.
pub const SUPPORTED_VERSIONS: &[&str] = &["22.04", "24.04"];

/// Identity of the host being provisioned. Read once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostProfile {
    /// `ID=` from os-release, lowercased.
    pub os_id: String,
    /// `VERSION_ID=` from os-release.
    pub os_version: String,
    /// Effective uid of the invoking process.
    pub uid: u32,
}

impl HostProfile {
    /// Build a profile from raw os-release content and an effective uid.
    #[must_use]
    pub fn from_os_release(content: &str, uid: u32) -> Self {
        Self {
            os_id: os_release_field(content, "ID")
                .unwrap_or_default()
                .to_ascii_lowercase(),
            os_version: os_release_field(content, "VERSION_ID").unwrap_or_default(),
            uid,
        }
    }

    /// Whether the caller runs with root privileges.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.uid == 0
    }

    /// Human-readable `ubuntu 24.04` label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.os_id, self.os_version)
    }
}

/// Extract a `KEY=value` field from os-release content, stripping quotes.
#[must_use]
pub fn os_release_field(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        (k == key).then(|| v.trim().trim_matches('"').trim_matches('\'').to_string())
    })
}

/// Gate the run on privilege first, then on OS identity.
///
/// # Errors
///
/// Returns [`ProvisionError::NotPrivileged`] when the uid is not 0, or
/// [`ProvisionError::UnsupportedOs`] when the release is not allow-listed.
pub fn check_supported(profile: &HostProfile) -> Result<(), ProvisionError> {
    if !profile.is_privileged() {
        return Err(ProvisionError::NotPrivileged { uid: profile.uid });
    }
    let supported = profile.os_id == SUPPORTED_OS_ID
        && SUPPORTED_VERSIONS.contains(&profile.os_version.as_str());
    if !supported {
        return Err(ProvisionError::UnsupportedOs {
            id: profile.os_id.clone(),
            version: profile.os_version.clone(),
            supported: SUPPORTED_VERSIONS
                .iter()
                .map(|v| format!("{SUPPORTED_OS_ID} {v}"))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(())
}
