//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

use crate::domain::StepStatus;

/// Centralized stylesheet, keyed by what a line reports rather than by colour.
#[derive(Default, Clone)]
pub struct Styles {
    /// The host was changed to converge it (green)
    pub applied: Style,
    /// Already converged, nothing touched
    pub skipped: Style,
    /// Best-effort action failed, run continued (yellow)
    pub degraded: Style,
    /// Step that stopped the run (red)
    pub failed: Style,
    /// In-progress markers and secondary text
    pub dim: Style,
    pub header: Style,
    /// Recipient keys and endpoints
    pub highlight: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.applied = Style::new().green();
        self.skipped = Style::new().blue();
        self.degraded = Style::new().yellow();
        self.failed = Style::new().red().bold();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
        self.highlight = Style::new().truecolor(26, 151, 179);
    }

    #[must_use]
    pub fn for_status(&self, status: StepStatus) -> Style {
        match status {
            StepStatus::Applied => self.applied,
            StepStatus::Skipped => self.skipped,
            StepStatus::Degraded => self.degraded,
            StepStatus::Failed => self.failed,
        }
    }
}

/// Line marker for a step status.
#[must_use]
pub fn glyph(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Applied => "✓",
        StepStatus::Skipped => "ℹ",
        StepStatus::Degraded => "!",
        StepStatus::Failed => "✗",
    }
}
