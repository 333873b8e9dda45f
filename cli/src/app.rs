//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is built once from the top-level flags. Adding a new
//! cross-cutting concern requires only one field change here.

use anyhow::Result;

use crate::domain::Layout;
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Answer yes to every confirmation (`--yes` / `HOSTPREP_YES`).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode). Quiet in JSON mode so
    /// stdout carries only the JSON document.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Paths the pipeline works on.
    pub layout: Layout,
    /// Confirmations are answered yes without prompting.
    pub assume_yes: bool,
    /// No operator is present (`CI` set or stdout not a terminal); prompts
    /// are answered no unless `assume_yes`.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        let non_interactive = std::env::var("CI").is_ok() || !console::Term::stdout().is_term();

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Ok(Self {
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            layout: Layout::standard(&home),
            assume_yes: flags.behaviour.yes,
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Ask the operator for confirmation of a destructive action.
    ///
    /// `--yes` answers yes; without an operator the answer is no.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if self.non_interactive {
            return Ok(false);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}
