//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::domain::StepStatus;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY, `step()` shows a spinner that the next `success()`, `info()` or
/// `warn()` replaces. Off a TTY every event is a plain line:
///
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `info()` prints `"  ℹ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// Everything is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: RefCell::new(None),
        }
    }

    /// Settle the running spinner, if any, into a status line.
    fn settle(&self, status: StepStatus, message: &str) {
        if self.ctx.quiet {
            return;
        }
        let marker = self.ctx.marker(status);
        match self.active.borrow_mut().take() {
            Some(pb) => progress::finish_with(&pb, &marker, message),
            None => println!("  {marker} {message}"),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        let mut active = self.active.borrow_mut();
        if let Some(previous) = active.take() {
            progress::clear(&previous);
        }
        if self.ctx.show_progress() {
            *active = Some(progress::spinner(message));
        } else {
            println!("  {} {message}", "→".style(self.ctx.styles.dim));
        }
    }

    fn success(&self, message: &str) {
        self.settle(StepStatus::Applied, message);
    }

    fn info(&self, message: &str) {
        self.settle(StepStatus::Skipped, message);
    }

    fn warn(&self, message: &str) {
        self.settle(StepStatus::Degraded, message);
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = self.active.get_mut().take() {
            progress::clear(&pb);
        }
    }
}
