//! Convergence report: the last known state of every component.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::firewall::FirewallRule;
use crate::domain::host::HostProfile;
use crate::domain::keys::RecipientKey;
use crate::domain::layout::Layout;
use crate::domain::packages::Interpreter;
use crate::domain::pipeline::{StepId, StepRecord, StepStatus};
use crate::domain::units::{DASHBOARD_PORT, HEALTH_PORT, UnitStatus};
use crate::domain::workspace::WorkspacePresence;

/// Presence, permissions and fingerprint of a file artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactState {
    pub path: PathBuf,
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ArtifactState {
    #[must_use]
    pub fn missing(path: PathBuf) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Present and not readable by group or others.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.present && self.mode.is_some_and(|m| m & 0o077 == 0)
    }
}

/// Lowercase hex SHA-256 of an artifact's bytes.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    Sha256::digest(bytes)
        .iter()
        .fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallState {
    pub present: bool,
    pub active: bool,
    pub rules: Vec<FirewallRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub label: &'static str,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub step: StepId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceReport {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostProfile>,
    pub host_address: String,
    pub install_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspacePresence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Interpreter>,
    pub keypair: ArtifactState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<RecipientKey>,
    pub config: ArtifactState,
    pub credential: ArtifactState,
    pub services: Vec<UnitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firewall: Option<FirewallState>,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureSummary>,
}

impl ConvergenceReport {
    /// Empty report for a run that has not started any step yet.
    #[must_use]
    pub fn new(layout: &Layout, host_address: &str) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            host: None,
            host_address: host_address.to_string(),
            install_path: layout.install_root.clone(),
            workspace: None,
            interpreter: None,
            keypair: ArtifactState::missing(layout.keypair_file()),
            recipient: None,
            config: ArtifactState::missing(layout.config_file()),
            credential: ArtifactState::missing(layout.credential_file()),
            services: Vec::new(),
            firewall: None,
            steps: Vec::new(),
            warnings: Vec::new(),
            failure: None,
        }
    }

    /// Every step ran and every service is active.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.failure.is_none()
            && self.steps.len() == StepId::ORDER.len()
            && self.steps.iter().all(|s| s.status != StepStatus::Failed)
            && !self.services.is_empty()
            && self.services.iter().all(|s| s.active)
    }

    /// Externally reachable endpoints derived from the host address.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let host = &self.host_address;
        vec![
            Endpoint {
                label: "ssh",
                address: format!("ssh root@{host}"),
            },
            Endpoint {
                label: "health",
                address: format!("http://{host}:{HEALTH_PORT}/health"),
            },
            Endpoint {
                label: "dashboard",
                address: format!("http://{host}:{DASHBOARD_PORT}"),
            },
        ]
    }

    #[must_use]
    pub fn step(&self, step: StepId) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.step == step)
    }
}
