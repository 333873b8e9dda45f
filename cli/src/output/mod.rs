//! Terminal and JSON presentation of provisioning progress and reports.

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use human::HumanRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::domain::StepStatus;

/// Width of the key column in `kv` rows.
const KEY_WIDTH: usize = 14;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Everything except the final error line is suppressed.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Spinners only make sense on an interactive, non-quiet stdout.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Styled status marker, e.g. a green `✓` for [`StepStatus::Applied`].
    #[must_use]
    pub fn marker(&self, status: StepStatus) -> String {
        styles::glyph(status)
            .style(self.styles.for_status(status))
            .to_string()
    }

    /// Print `msg` behind the marker for `status`.
    pub fn status(&self, status: StepStatus, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.marker(status));
        }
    }

    pub fn success(&self, msg: &str) {
        self.status(StepStatus::Applied, msg);
    }

    pub fn info(&self, msg: &str) {
        self.status(StepStatus::Skipped, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.status(StepStatus::Degraded, msg);
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Key-value row with the key dimmed and padded so values line up.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!(
                "  {}  {value}",
                format!("{key:<width$}", width = KEY_WIDTH).style(self.styles.dim)
            );
        }
    }

    pub fn blank(&self) {
        if !self.quiet {
            println!();
        }
    }
}
