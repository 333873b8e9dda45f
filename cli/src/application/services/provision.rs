//! Application service: the provisioning pipeline.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through the injected [`HostPlatform`].
//!
//! Steps run strictly in [`StepId::ORDER`]. Each returns a typed
//! [`StepOutcome`]; the first `Err` stops the run. The report is always
//! completed with the last observed host state, whether or not the run
//! converged.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use secrecy::SecretString;

use crate::application::ports::{HostPlatform, ProgressReporter};
use crate::application::services::status::observe_into;
use crate::domain::credential::{PayloadSource, generate_test_wallet, validate_wallet};
use crate::domain::firewall::{FirewallRule, RULES, SSH_PORT};
use crate::domain::packages::{CACHE_SERVICE, package_batch, select_interpreter};
use crate::domain::report::FailureSummary;
use crate::domain::template::mentions_value;
use crate::domain::units::service_units;
use crate::domain::workspace::{WorkspaceAction, plan};
use crate::domain::{
    ConfigTemplate, ConvergenceReport, FirewallState, HostProfile, Interpreter, Layout,
    Placeholder, PlaceholderValues, ProvisionError, RecipientKey, SourceSpec, StepFailure, StepId,
    StepOutcome, StepRecord, StepStatus, WorkspacePresence, check_supported,
};

/// Pause between starting a unit and checking it reached the active state.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Everything a run needs, built once from settings before the first step.
pub struct ProvisionContext {
    pub layout: Layout,
    pub source: SourceSpec,
    /// Address the services are reached on; also resolves `YOUR_SERVER_IP`.
    pub host_address: String,
    /// Operator-supplied placeholder values. The recipient key is added by
    /// the pipeline once the keypair step has run.
    pub values: PlaceholderValues,
    /// Operator-supplied wallet; a test wallet is generated when `None`.
    pub wallet: Option<SecretString>,
    pub settle_delay: Duration,
    /// Regenerate an existing configuration document. Only set after the
    /// operator confirmed it.
    pub reconfigure: bool,
}

/// Result of a run: the report is always present, the failure only when a
/// step could not converge.
#[derive(Debug)]
pub struct ProvisionRun {
    pub report: ConvergenceReport,
    pub failure: Option<StepFailure>,
}

impl ProvisionRun {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Drive the host toward convergence.
pub async fn provision(
    host: &impl HostPlatform,
    reporter: &impl ProgressReporter,
    ctx: &ProvisionContext,
) -> ProvisionRun {
    let mut pipeline = Pipeline {
        host,
        reporter,
        ctx,
        report: ConvergenceReport::new(&ctx.layout, &ctx.host_address),
        interpreter: None,
        recipient: None,
        gate_passed: false,
    };

    let mut failure = None;
    for step in StepId::ORDER {
        reporter.step(&format!("{step}..."));
        match pipeline.run_step(step).await {
            Ok(outcome) => {
                match &outcome {
                    StepOutcome::Applied(detail) => reporter.success(&format!("{step}: {detail}")),
                    StepOutcome::Skipped(detail) => reporter.info(&format!("{step}: {detail}")),
                    StepOutcome::Degraded(detail) => reporter.warn(&format!("{step}: {detail}")),
                }
                if let StepOutcome::Degraded(detail) = &outcome {
                    pipeline.report.warnings.push(format!("{step}: {detail}"));
                }
                tracing::info!(step = ?step, status = ?outcome.status(), "step finished");
                pipeline
                    .report
                    .steps
                    .push(StepRecord::from_outcome(step, &outcome));
            }
            Err(error) => {
                tracing::error!(step = ?step, error = %format!("{error:#}"), "step failed");
                pipeline.report.steps.push(StepRecord {
                    step,
                    status: StepStatus::Failed,
                    detail: format!("{error:#}"),
                });
                pipeline.report.failure = Some(FailureSummary {
                    step,
                    message: format!("{error:#}"),
                });
                failure = Some(StepFailure { step, error });
                break;
            }
        }
    }

    pipeline.finish().await;
    ProvisionRun {
        report: pipeline.report,
        failure,
    }
}

struct Pipeline<'a, H, R> {
    host: &'a H,
    reporter: &'a R,
    ctx: &'a ProvisionContext,
    report: ConvergenceReport,
    interpreter: Option<Interpreter>,
    recipient: Option<RecipientKey>,
    gate_passed: bool,
}

impl<H: HostPlatform, R: ProgressReporter> Pipeline<'_, H, R> {
    async fn run_step(&mut self, step: StepId) -> Result<StepOutcome> {
        match step {
            StepId::HostGate => self.host_gate().await,
            StepId::Dependencies => self.dependencies().await,
            StepId::Workspace => self.workspace().await,
            StepId::Runtime => self.runtime().await,
            StepId::Keypair => self.keypair().await,
            StepId::Configuration => self.configuration(),
            StepId::Credential => self.credential().await,
            StepId::Services => self.services().await,
            StepId::Firewall => Ok(self.firewall().await),
        }
    }

    /// Record the final observable state. Skipped entirely when the host
    /// gate refused the host: nothing about it is trusted.
    async fn finish(&mut self) {
        if self.gate_passed {
            observe_into(self.host, &self.ctx.layout, &mut self.report).await;
        }
        self.report.finished_at = Some(Utc::now());
    }

    fn layout(&self) -> &Layout {
        &self.ctx.layout
    }

    fn recipient(&self) -> Result<RecipientKey> {
        self.recipient
            .clone()
            .context("recipient key unavailable: keypair step has not run")
    }

    // ── 1. Host gate ──────────────────────────────────────────────────────────

    async fn host_gate(&mut self) -> Result<StepOutcome> {
        let uid = self
            .host
            .effective_uid()
            .await
            .context("reading effective uid")?;
        let os_release = self
            .host
            .os_release()
            .await
            .context("reading /etc/os-release")?;
        let profile = HostProfile::from_os_release(&os_release, uid);
        self.report.host = Some(profile.clone());
        check_supported(&profile)?;
        self.gate_passed = true;
        Ok(StepOutcome::Skipped(format!("{} as root", profile.label())))
    }

    // ── 2. Dependencies ───────────────────────────────────────────────────────

    async fn dependencies(&mut self) -> Result<StepOutcome> {
        self.host
            .refresh_package_index()
            .await
            .context("refreshing package index")?;

        let mut available = Vec::new();
        for interpreter in Interpreter::PREFERENCE {
            if self
                .host
                .is_package_available(interpreter.binary())
                .await
                .with_context(|| format!("probing for {interpreter}"))?
            {
                available.push(interpreter);
            }
        }
        let interpreter = select_interpreter(&available).ok_or_else(|| {
            ProvisionError::NoInterpreter {
                tried: Interpreter::PREFERENCE
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })?;
        self.interpreter = Some(interpreter);
        self.report.interpreter = Some(interpreter);

        let batch = package_batch(interpreter);
        self.reporter
            .step(&format!("installing {} packages...", batch.len()));
        self.host
            .install_packages(&batch)
            .await
            .context("installing system packages")?;
        self.host
            .enable_system_service(CACHE_SERVICE)
            .await
            .with_context(|| format!("enabling {CACHE_SERVICE}"))?;

        Ok(StepOutcome::Applied(format!(
            "{} packages present, {CACHE_SERVICE} running, using {interpreter}",
            batch.len()
        )))
    }

    // ── 3. Workspace ──────────────────────────────────────────────────────────

    async fn workspace(&mut self) -> Result<StepOutcome> {
        let layout = self.layout().clone();
        let root = &layout.install_root;
        let source = &self.ctx.source;
        let presence = WorkspacePresence::observe(
            self.host.exists(root),
            self.host.exists(&layout.completeness_marker()),
        );
        self.report.workspace = Some(presence);

        let outcome = match plan(presence) {
            WorkspaceAction::Fetch => {
                self.fetch(source, root).await?;
                StepOutcome::Applied(format!("cloned {} ({})", source.url, source.branch))
            }
            WorkspaceAction::DiscardAndFetch => {
                self.reporter.warn(&format!(
                    "{} is incomplete (no {}); discarding and re-fetching",
                    root.display(),
                    layout.completeness_marker().display()
                ));
                self.host
                    .remove_dir_all(root)
                    .context("discarding incomplete workspace")?;
                self.fetch(source, root).await?;
                StepOutcome::Applied(format!("re-fetched {} ({})", source.url, source.branch))
            }
            WorkspaceAction::Refresh => match self.host.update_source(source, root).await {
                Ok(()) => StepOutcome::Skipped(format!("present, up to date with {}", source.branch)),
                Err(e) => StepOutcome::Degraded(format!(
                    "could not update source tree ({e:#}); continuing with existing contents"
                )),
            },
        };

        for dir in [layout.config_dir(), layout.logs_dir()] {
            self.host.create_dir_all(&dir)?;
        }
        self.report.workspace = Some(WorkspacePresence::Complete);
        Ok(outcome)
    }

    async fn fetch(&self, source: &SourceSpec, root: &std::path::Path) -> Result<()> {
        self.host
            .clone_source(source, root)
            .await
            .with_context(|| format!("fetching {}", source.url))?;
        anyhow::ensure!(
            self.host.exists(&self.layout().completeness_marker()),
            "fetched tree at {} has no {}",
            root.display(),
            crate::domain::layout::COMPLETENESS_MARKER
        );
        Ok(())
    }

    // ── 4. Runtime ────────────────────────────────────────────────────────────

    async fn runtime(&mut self) -> Result<StepOutcome> {
        let interpreter = self
            .interpreter
            .context("interpreter unknown: dependency step has not run")?;
        let layout = self.layout().clone();
        let venv = layout.venv_dir();

        let created = if self.host.exists(&layout.venv_python()) {
            false
        } else {
            self.host
                .create_runtime(interpreter, &venv)
                .await
                .with_context(|| format!("creating {interpreter} environment at {}", venv.display()))?;
            true
        };

        self.host
            .install_requirements(&venv, &layout.requirements_file())
            .await
            .context("installing python dependencies")?;

        Ok(StepOutcome::Applied(if created {
            format!("created {interpreter} environment and installed dependencies")
        } else {
            "dependencies synced into existing environment".to_string()
        }))
    }

    // ── 5. Keypair ────────────────────────────────────────────────────────────

    async fn keypair(&mut self) -> Result<StepOutcome> {
        let layout = self.layout().clone();
        let path = layout.keypair_file();

        let (recipient, outcome) = if self.host.exists(&path) {
            let recipient = self.host.recipient_of(&path).await.map_err(|e| {
                e.context(ProvisionError::UnreadableKeyFile {
                    path: path.display().to_string(),
                })
            })?;
            if let Ok(Some(mode)) = self.host.mode(&path)
                && mode & 0o077 != 0
            {
                let warning = format!(
                    "{} is readable by other users (mode {mode:o}); restrict it with chmod 600",
                    path.display()
                );
                self.reporter.warn(&warning);
                self.report.warnings.push(warning);
            }
            (recipient, StepOutcome::Skipped("existing keypair kept".to_string()))
        } else {
            self.host.create_dir_all(&layout.secrets_dir)?;
            self.host.set_permissions(&layout.secrets_dir, 0o700)?;
            let pair = self
                .host
                .generate_keypair(&path)
                .await
                .context("generating encryption keypair")?;
            self.host.set_permissions(&pair.private_path, 0o600)?;
            (pair.recipient, StepOutcome::Applied("generated new keypair".to_string()))
        };

        self.report.recipient = Some(recipient.clone());
        self.recipient = Some(recipient);
        Ok(outcome)
    }

    // ── 6. Configuration ──────────────────────────────────────────────────────

    fn configuration(&mut self) -> Result<StepOutcome> {
        let recipient = self.recipient()?;
        let layout = self.layout().clone();
        let path = layout.config_file();
        let exists = self.host.exists(&path);

        if exists && !self.ctx.reconfigure {
            let document = self
                .host
                .read_to_string(&path)
                .context("reading existing configuration")?;
            if !mentions_value(&document, recipient.as_str()) {
                let warning = format!(
                    "{} does not reference the current recipient key; it may be stale. \
                     Re-run with --reconfigure to regenerate it",
                    path.display()
                );
                self.reporter.warn(&warning);
                self.report.warnings.push(warning);
            }
            return Ok(StepOutcome::Skipped(
                "existing configuration left untouched".to_string(),
            ));
        }

        let template_path = layout.config_template();
        let text = self
            .host
            .read_to_string(&template_path)
            .with_context(|| format!("reading template {}", template_path.display()))?;
        let values = self
            .ctx
            .values
            .clone()
            .with(Placeholder::RecipientKey, recipient.as_str());
        let resolved = ConfigTemplate::parse(text)
            .resolve(&values)
            .context("resolving configuration template")?;
        serde_yaml::from_str::<serde_yaml::Value>(&resolved)
            .context("resolved configuration is not valid YAML")?;
        self.host
            .write_private(&path, resolved.as_bytes())
            .context("writing configuration")?;

        Ok(StepOutcome::Applied(if exists {
            "regenerated from template (operator confirmed)".to_string()
        } else {
            "materialized from template".to_string()
        }))
    }

    // ── 7. Credential ─────────────────────────────────────────────────────────

    async fn credential(&self) -> Result<StepOutcome> {
        let path = self.layout().credential_file();
        if self.host.exists(&path) {
            return Ok(StepOutcome::Skipped(
                "sealed credential present".to_string(),
            ));
        }
        let recipient = self.recipient()?;

        let generated;
        let (payload, source) = match &self.ctx.wallet {
            Some(wallet) => {
                validate_wallet(wallet)?;
                (wallet, PayloadSource::Operator)
            }
            None => {
                generated = generate_test_wallet()?;
                (&generated, PayloadSource::GeneratedTestWallet)
            }
        };
        let ciphertext = self
            .host
            .encrypt(payload, &recipient)
            .await
            .context("sealing wallet credential")?;
        anyhow::ensure!(!ciphertext.is_empty(), "encryption produced no ciphertext");
        self.host
            .write_private(&path, &ciphertext)
            .context("writing sealed credential")?;

        let what = match source {
            PayloadSource::Operator => "operator wallet",
            PayloadSource::GeneratedTestWallet => "generated test wallet",
        };
        Ok(StepOutcome::Applied(format!("sealed {what} for {recipient}")))
    }

    // ── 8. Services ───────────────────────────────────────────────────────────

    async fn services(&mut self) -> Result<StepOutcome> {
        let units = service_units(self.layout());
        for unit in &units {
            self.host
                .install_unit(unit)
                .await
                .with_context(|| format!("installing {}", unit.name))?;
        }
        self.host
            .reload_units()
            .await
            .context("reloading supervisor")?;
        for unit in &units {
            self.host
                .enable_unit(unit.name)
                .await
                .with_context(|| format!("enabling {}", unit.name))?;
        }

        for unit in &units {
            self.reporter.step(&format!("starting {}...", unit.name));
            self.host
                .restart_unit(unit.name)
                .await
                .with_context(|| format!("starting {}", unit.name))?;
            tokio::time::sleep(self.ctx.settle_delay).await;
            let status = self
                .host
                .unit_status(unit.name)
                .await
                .with_context(|| format!("querying {}", unit.name))?;
            if !status.active {
                return Err(ProvisionError::ServiceInactive {
                    unit: unit.name.to_string(),
                    diagnostics: status.recent_logs.join("\n"),
                }
                .into());
            }
        }

        Ok(StepOutcome::Applied(format!(
            "{} active",
            units.iter().map(|u| u.name).collect::<Vec<_>>().join(" and ")
        )))
    }

    // ── 9. Firewall ───────────────────────────────────────────────────────────

    async fn firewall(&mut self) -> StepOutcome {
        let present = match self.host.firewall_present().await {
            Ok(present) => present,
            Err(e) => {
                tracing::debug!(error = %e, "firewall probe failed");
                false
            }
        };
        if !present {
            self.report.firewall = Some(FirewallState::default());
            return StepOutcome::Degraded(
                "no firewall installed; inbound ports are not managed".to_string(),
            );
        }

        let mut rules = Vec::with_capacity(RULES.len());
        let mut problems = Vec::new();
        let mut changed = false;
        for rule in RULES {
            match self.host.allow_rule(&rule).await {
                Ok(added) => {
                    changed |= added;
                    rules.push(rule);
                }
                Err(e) => problems.push(format!("{} ({}): {e:#}", rule.spec(), rule.label)),
            }
        }

        let ssh_allowed = rules.iter().any(|r| r.port == SSH_PORT);
        let mut active = self.host.firewall_active().await.unwrap_or(false);
        if !active && !ssh_allowed {
            problems.push("ssh rule not applied; firewall left inactive".to_string());
        } else if !active {
            match self.host.enable_firewall().await {
                Ok(()) => {
                    active = true;
                    changed = true;
                }
                Err(e) => problems.push(format!("enabling firewall: {e:#}")),
            }
        }

        self.report.firewall = Some(FirewallState {
            present: true,
            active,
            rules: rules.clone(),
        });

        let specs = rules
            .iter()
            .map(FirewallRule::spec)
            .collect::<Vec<_>>()
            .join(", ");
        if !problems.is_empty() {
            StepOutcome::Degraded(problems.join("; "))
        } else if changed {
            StepOutcome::Applied(format!("allowed {specs}; firewall active"))
        } else {
            StepOutcome::Skipped(format!("{specs} already allowed; firewall active"))
        }
    }
}
