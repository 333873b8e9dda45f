//! Step identities and typed per-step results.
//!
//! Every step returns `Result<StepOutcome>`: the `Ok` variants are the
//! non-fatal results, `Err` is fatal and stops the driver.

use serde::Serialize;

/// The fixed, linear step order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    HostGate,
    Dependencies,
    Workspace,
    Runtime,
    Keypair,
    Configuration,
    Credential,
    Services,
    Firewall,
}

impl StepId {
    pub const ORDER: [StepId; 9] = [
        Self::HostGate,
        Self::Dependencies,
        Self::Workspace,
        Self::Runtime,
        Self::Keypair,
        Self::Configuration,
        Self::Credential,
        Self::Services,
        Self::Firewall,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::HostGate => "host check",
            Self::Dependencies => "system packages",
            Self::Workspace => "source workspace",
            Self::Runtime => "python runtime",
            Self::Keypair => "encryption keypair",
            Self::Configuration => "configuration",
            Self::Credential => "wallet credential",
            Self::Services => "services",
            Self::Firewall => "firewall",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Non-fatal result of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step mutated the host to converge it.
    Applied(String),
    /// Postcondition already held; nothing was touched.
    Skipped(String),
    /// A best-effort action failed; the run continues.
    Degraded(String),
}

impl StepOutcome {
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Applied(d) | Self::Skipped(d) | Self::Degraded(d) => d,
        }
    }

    #[must_use]
    pub fn status(&self) -> StepStatus {
        match self {
            Self::Applied(_) => StepStatus::Applied,
            Self::Skipped(_) => StepStatus::Skipped,
            Self::Degraded(_) => StepStatus::Degraded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Applied,
    Skipped,
    Degraded,
    Failed,
}

/// One line of the run ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: StepId,
    pub status: StepStatus,
    pub detail: String,
}

impl StepRecord {
    #[must_use]
    pub fn from_outcome(step: StepId, outcome: &StepOutcome) -> Self {
        Self {
            step,
            status: outcome.status(),
            detail: outcome.detail().to_string(),
        }
    }
}

/// The fatal failure that ended a run.
#[derive(Debug)]
pub struct StepFailure {
    pub step: StepId,
    pub error: anyhow::Error,
}

impl std::fmt::Display for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} step failed: {:#}", self.step, self.error)
    }
}

impl std::error::Error for StepFailure {}
