//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::domain::report::{ArtifactState, FirewallState};
use crate::domain::{ConvergenceReport, WorkspacePresence};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the full convergence summary.
    pub fn render_report(&self, report: &ConvergenceReport) {
        if self.ctx.quiet {
            return;
        }
        let ctx = self.ctx;
        ctx.blank();
        if report.failure.is_some() {
            ctx.header("Provisioning stopped");
        } else if report.steps.is_empty() {
            ctx.header("Host status");
        } else {
            ctx.header("Provisioning summary");
        }
        ctx.blank();

        ctx.kv(
            "Host:",
            &report
                .host
                .as_ref()
                .map_or_else(|| "unknown".to_string(), |h| h.label()),
        );
        ctx.kv("Address:", &report.host_address);
        ctx.kv(
            "Install path:",
            &format!(
                "{} ({})",
                report.install_path.display(),
                workspace_display(report.workspace)
            ),
        );
        if let Some(interpreter) = report.interpreter {
            ctx.kv("Interpreter:", &interpreter.to_string());
        }
        ctx.kv("Keypair:", &artifact_display(&report.keypair));
        if let Some(recipient) = &report.recipient {
            ctx.kv(
                "Recipient:",
                &recipient.as_str().style(ctx.styles.highlight).to_string(),
            );
        }
        ctx.kv("Config:", &artifact_display(&report.config));
        ctx.kv("Credential:", &artifact_display(&report.credential));

        if !report.steps.is_empty() {
            ctx.blank();
            ctx.header("Steps:");
            for record in &report.steps {
                let line = format!("{:<20} {}", record.step.title(), record.detail);
                ctx.status(record.status, &line);
            }
        }

        ctx.blank();
        ctx.header("Services:");
        if report.services.is_empty() {
            ctx.info("not queried");
        }
        for service in &report.services {
            let enabled = if service.enabled { "enabled" } else { "disabled" };
            if service.active {
                ctx.success(&format!("{} active, {enabled}", service.name));
            } else {
                ctx.warn(&format!("{} inactive, {enabled}", service.name));
            }
        }

        ctx.blank();
        ctx.header("Firewall:");
        self.render_firewall(report.firewall.as_ref());

        ctx.blank();
        ctx.header("Endpoints:");
        for endpoint in report.endpoints() {
            ctx.kv(
                &format!("{}:", endpoint.label),
                &endpoint.address.style(ctx.styles.highlight).to_string(),
            );
        }

        if !report.warnings.is_empty() {
            ctx.blank();
            ctx.header("Warnings:");
            for warning in &report.warnings {
                ctx.warn(warning);
            }
        }
        ctx.blank();
    }

    fn render_firewall(&self, firewall: Option<&FirewallState>) {
        let ctx = self.ctx;
        match firewall {
            None => ctx.info("not queried"),
            Some(state) if !state.present => ctx.warn("ufw not installed; ports unmanaged"),
            Some(state) => {
                if state.active {
                    ctx.success("ufw active");
                } else {
                    ctx.warn("ufw inactive");
                }
                for rule in &state.rules {
                    ctx.kv(&format!("{}:", rule.label), &format!("allow {}", rule.spec()));
                }
            }
        }
    }
}

fn workspace_display(presence: Option<WorkspacePresence>) -> &'static str {
    match presence {
        Some(WorkspacePresence::Complete) => "complete",
        Some(WorkspacePresence::Incomplete) => "incomplete",
        Some(WorkspacePresence::Absent) => "absent",
        None => "not checked",
    }
}

/// `path (mode 600, sha256 abcd1234…)` or `path (missing)`.
pub(crate) fn artifact_display(artifact: &ArtifactState) -> String {
    if !artifact.present {
        return format!("{} (missing)", artifact.path.display());
    }
    let mut notes = Vec::new();
    if let Some(mode) = artifact.mode {
        notes.push(format!("mode {mode:o}"));
    }
    if let Some(hash) = &artifact.sha256 {
        notes.push(format!("sha256 {}", &hash[..hash.len().min(16)]));
    }
    if notes.is_empty() {
        artifact.path.display().to_string()
    } else {
        format!("{} ({})", artifact.path.display(), notes.join(", "))
    }
}
