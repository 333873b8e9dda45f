//! Per-step spinner using indicatif.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];

/// Falls back to indicatif's default layout if `template` is rejected.
fn style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Spinner shown while a step (or one of its long sub-actions) runs.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(style("  {spinner:.cyan} {msg}").tick_strings(&TICKS));
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Replace a spinner with its settled `marker msg` line.
pub fn finish_with(pb: &ProgressBar, marker: &str, msg: &str) {
    pb.set_style(style("  {prefix} {msg}"));
    pb.set_prefix(marker.to_string());
    pb.finish_with_message(msg.to_string());
}

/// Drop a spinner without leaving a line behind.
pub fn clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
