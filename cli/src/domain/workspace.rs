//! Source workspace domain types and the materialization decision table.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use serde::Serialize;

/// Default upstream for the application source tree.
pub const DEFAULT_REPO_URL: &str = "https://github.com/pumpfun-bot/pumpfun-bot.git";

/// Default branch fetched when `BOT_BRANCH` is unset.
pub const DEFAULT_BRANCH: &str = "main";

/// Where the source tree comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpec {
    pub url: String,
    pub branch: String,
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self {
            url: DEFAULT_REPO_URL.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

/// Observed state of the install path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspacePresence {
    Absent,
    /// Path exists but the completeness marker is missing, e.g. an
    /// interrupted clone.
    Incomplete,
    Complete,
}

impl WorkspacePresence {
    #[must_use]
    pub fn observe(path_exists: bool, marker_exists: bool) -> Self {
        match (path_exists, marker_exists) {
            (false, _) => Self::Absent,
            (true, false) => Self::Incomplete,
            (true, true) => Self::Complete,
        }
    }
}

/// What the materializer does for a given presence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceAction {
    Fetch,
    DiscardAndFetch,
    /// Best effort; failure only warns.
    Refresh,
}

#[must_use]
pub fn plan(presence: WorkspacePresence) -> WorkspaceAction {
    match presence {
        WorkspacePresence::Absent => WorkspaceAction::Fetch,
        WorkspacePresence::Incomplete => WorkspaceAction::DiscardAndFetch,
        WorkspacePresence::Complete => WorkspaceAction::Refresh,
    }
}
