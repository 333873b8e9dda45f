//! Pipeline behaviour against `FakeHost`: ordering, idempotency, fail-fast
//! and the degraded paths.

#![allow(clippy::expect_used)]

use std::os::unix::fs::PermissionsExt;

use ed25519_dalek::SigningKey;
use hostprep_cli::domain::credential::wallet_base58;
use hostprep_cli::domain::{
    Interpreter, KeyError, ProvisionError, StepId, StepStatus, TemplateError, WorkspacePresence,
};
use secrecy::{ExposeSecret, SecretString};

use crate::fake_host::{DEBIAN_12, FakeHost, OTHER_RECIPIENT, RECIPIENT};
use crate::helpers::{API_KEY, HOST_ADDRESS, context, run};

fn mode_of(path: &std::path::Path) -> u32 {
    std::fs::metadata(path).expect("metadata").permissions().mode() & 0o777
}

fn statuses(run: &hostprep_cli::application::services::provision::ProvisionRun) -> Vec<(StepId, StepStatus)> {
    run.report.steps.iter().map(|s| (s.step, s.status)).collect()
}

// ── Fresh host ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_host_converges_through_every_step() {
    let host = FakeHost::fresh();
    let (run, _) = run(&host, &context(&host)).await;

    assert!(run.succeeded(), "unexpected failure: {:?}", run.failure);
    assert!(run.report.converged());
    assert_eq!(
        statuses(&run),
        vec![
            (StepId::HostGate, StepStatus::Skipped),
            (StepId::Dependencies, StepStatus::Applied),
            (StepId::Workspace, StepStatus::Applied),
            (StepId::Runtime, StepStatus::Applied),
            (StepId::Keypair, StepStatus::Applied),
            (StepId::Configuration, StepStatus::Applied),
            (StepId::Credential, StepStatus::Applied),
            (StepId::Services, StepStatus::Applied),
            (StepId::Firewall, StepStatus::Applied),
        ]
    );
    assert_eq!(run.report.interpreter, Some(Interpreter::Python312));
    assert_eq!(run.report.workspace, Some(WorkspacePresence::Complete));
    assert_eq!(
        run.report.recipient.as_ref().map(|r| r.as_str()),
        Some(RECIPIENT)
    );
}

#[tokio::test]
async fn fresh_host_artifacts_are_private_and_resolved() {
    let host = FakeHost::fresh();
    let (run, _) = run(&host, &context(&host)).await;
    assert!(run.succeeded());
    let layout = &host.layout;

    let config = std::fs::read_to_string(layout.config_file()).expect("config");
    assert!(config.contains(RECIPIENT));
    assert!(config.contains(API_KEY));
    assert!(config.contains(HOST_ADDRESS));
    assert!(!config.contains("YOUR_"));

    assert_eq!(mode_of(&layout.config_file()), 0o600);
    assert_eq!(mode_of(&layout.credential_file()), 0o600);
    assert_eq!(mode_of(&layout.keypair_file()), 0o600);
    assert_eq!(mode_of(&layout.secrets_dir), 0o700);
    assert!(layout.logs_dir().is_dir());

    assert!(run.report.config.is_restricted());
    assert!(run.report.credential.sha256.is_some());
    assert!(run.report.keypair.sha256.is_none(), "private key is never fingerprinted");
}

#[tokio::test]
async fn keypair_is_generated_before_either_consumer() {
    let host = FakeHost::fresh();
    let (run, _) = run(&host, &context(&host)).await;
    assert!(run.succeeded());

    let keygen = host.position("generate_keypair").expect("keygen");
    let config_write = host
        .position(&format!("write_private {}", host.layout.config_file().display()))
        .expect("config written");
    let seal = host.position("encrypt").expect("sealed");
    assert!(keygen < config_write);
    assert!(keygen < seal);
    assert!(host.called(&format!("encrypt {RECIPIENT}")));
}

#[tokio::test]
async fn primary_service_is_verified_before_auxiliary_starts() {
    let host = FakeHost::fresh();
    let (run, _) = run(&host, &context(&host)).await;
    assert!(run.succeeded());

    let reload = host.position("reload_units").expect("reload");
    let bot_start = host.position("restart_unit pumpfun-bot").expect("bot");
    let bot_check = host.position("unit_status pumpfun-bot").expect("bot status");
    let dash_start = host.position("restart_unit pumpfun-dashboard").expect("dashboard");
    assert!(host.position("install_unit pumpfun-dashboard").expect("unit") < reload);
    assert!(reload < bot_start);
    assert!(bot_start < bot_check);
    assert!(bot_check < dash_start);
}

#[tokio::test]
async fn generated_test_wallet_is_a_base58_keypair() {
    let host = FakeHost::fresh();
    let (run, _) = run(&host, &context(&host)).await;
    assert!(run.succeeded());

    let sealed = host.sealed.borrow();
    assert_eq!(sealed.len(), 1);
    assert!(!sealed[0].starts_with('['), "sealed as a JSON array");
    let bytes = bs58::decode(&sealed[0]).into_vec().expect("base58");
    assert_eq!(bytes.len(), 64);
    let key = SigningKey::from_keypair_bytes(&bytes.try_into().expect("64 bytes"));
    assert!(key.is_ok(), "public half matches seed");
}

#[tokio::test]
async fn operator_wallet_is_sealed_as_given() {
    let host = FakeHost::fresh();
    let wallet = wallet_base58(&SigningKey::from_bytes(&[42u8; 32]));
    let expected = wallet.expose_secret().to_string();
    let mut ctx = context(&host);
    ctx.wallet = Some(wallet);
    let (run, _) = run(&host, &ctx).await;
    assert!(run.succeeded(), "{:?}", run.failure);
    assert_eq!(host.sealed.borrow().as_slice(), [expected]);
}

#[tokio::test]
async fn malformed_operator_wallet_is_fatal_and_never_sealed() {
    let host = FakeHost::fresh();
    let mut ctx = context(&host);
    ctx.wallet = Some(SecretString::from("[1,2,3]"));
    let (run, _) = run(&host, &ctx).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::Credential);
    assert!(matches!(
        failure.error.downcast_ref::<KeyError>(),
        Some(KeyError::InvalidWallet(_))
    ));
    assert!(!failure.to_string().contains("[1,2,3]"));
    assert!(!host.called("encrypt"));
    assert!(!host.layout.credential_file().exists());
}

#[tokio::test]
async fn falls_back_to_python_311() {
    let mut host = FakeHost::fresh();
    host.available = vec![Interpreter::Python311];
    let (run, _) = run(&host, &context(&host)).await;
    assert!(run.succeeded());
    assert_eq!(run.report.interpreter, Some(Interpreter::Python311));
    let install = host
        .calls()
        .into_iter()
        .find(|c| c.starts_with("install_packages"))
        .expect("install");
    assert!(install.contains("python3.11-venv"));
    assert!(install.contains("age"));
    assert!(host.called("create_runtime python3.11"));
}

// ── Second run ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_run_leaves_secrets_and_config_byte_identical() {
    let host = FakeHost::fresh();
    let ctx = context(&host);
    let (first, _) = run(&host, &ctx).await;
    assert!(first.succeeded());

    let layout = &host.layout;
    let key = host.read_file(&layout.keypair_file());
    let config = host.read_file(&layout.config_file());
    let credential = host.read_file(&layout.credential_file());
    host.calls.borrow_mut().clear();

    let (second, _) = run(&host, &ctx).await;
    assert!(second.succeeded());
    assert!(second.report.converged());

    assert_eq!(host.read_file(&layout.keypair_file()), key);
    assert_eq!(host.read_file(&layout.config_file()), config);
    assert_eq!(host.read_file(&layout.credential_file()), credential);
    assert!(!host.called("generate_keypair"));
    assert!(!host.called("encrypt"));
    assert!(!host.called("clone_source"));
    assert!(!host.called("create_runtime"));
    assert!(!host.called("write_private"));
    assert!(host.called("install_requirements"), "dependency pass always runs");

    for step in [
        StepId::Workspace,
        StepId::Keypair,
        StepId::Configuration,
        StepId::Credential,
        StepId::Firewall,
    ] {
        assert_eq!(
            second.report.step(step).map(|s| s.status),
            Some(StepStatus::Skipped),
            "{step}"
        );
    }
    assert_eq!(
        first.report.credential.sha256,
        second.report.credential.sha256
    );
}

#[tokio::test]
async fn existing_key_is_reused_for_config_and_credential() {
    let host = FakeHost::fresh();
    let layout = &host.layout;
    std::fs::create_dir_all(&layout.secrets_dir).expect("mkdir");
    std::fs::write(
        layout.keypair_file(),
        format!("# public key: {OTHER_RECIPIENT}\nAGE-SECRET-KEY-1EXISTING\n"),
    )
    .expect("key");
    std::fs::set_permissions(layout.keypair_file(), std::fs::Permissions::from_mode(0o600))
        .expect("chmod");
    let before = host.read_file(&layout.keypair_file());

    let (run, reporter) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    assert!(!host.called("generate_keypair"));
    assert_eq!(host.read_file(&layout.keypair_file()), before);
    assert!(host.called(&format!("encrypt {OTHER_RECIPIENT}")));
    let config = std::fs::read_to_string(layout.config_file()).expect("config");
    assert!(config.contains(OTHER_RECIPIENT));
    assert!(reporter.warnings().is_empty(), "{:?}", reporter.warnings());
}

#[tokio::test]
async fn loose_key_permissions_are_reported_not_changed() {
    let host = FakeHost::fresh();
    let layout = &host.layout;
    std::fs::create_dir_all(&layout.secrets_dir).expect("mkdir");
    std::fs::write(
        layout.keypair_file(),
        format!("# public key: {RECIPIENT}\nAGE-SECRET-KEY-1EXISTING\n"),
    )
    .expect("key");
    std::fs::set_permissions(layout.keypair_file(), std::fs::Permissions::from_mode(0o644))
        .expect("chmod");

    let (run, reporter) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    assert_eq!(mode_of(&layout.keypair_file()), 0o644);
    assert!(
        reporter.warnings().iter().any(|w| w.contains("readable by other users")),
        "{:?}",
        reporter.warnings()
    );
    assert!(run.report.warnings.iter().any(|w| w.contains("chmod 600")));
}

#[tokio::test]
async fn unreadable_key_file_is_fatal_and_never_regenerated() {
    let host = FakeHost::fresh();
    let layout = &host.layout;
    std::fs::create_dir_all(&layout.secrets_dir).expect("mkdir");
    std::fs::write(layout.keypair_file(), "garbage\n").expect("key");

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::Keypair);
    assert!(matches!(
        failure.error.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::UnreadableKeyFile { .. })
    ));
    assert!(!host.called("generate_keypair"));
    assert_eq!(host.read_file(&layout.keypair_file()), b"garbage\n");
    assert!(!layout.config_file().exists());
    assert!(!layout.credential_file().exists());
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn existing_config_is_never_rewritten() {
    let host = FakeHost::fresh();
    host.seed_workspace();
    let config_path = host.layout.config_file();
    std::fs::write(&config_path, format!("hand_edited: true\nage: {RECIPIENT}\n")).expect("seed");
    let before = host.read_file(&config_path);

    let (run, reporter) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    assert_eq!(host.read_file(&config_path), before);
    assert_eq!(
        run.report.step(StepId::Configuration).map(|s| s.status),
        Some(StepStatus::Skipped)
    );
    assert!(reporter.warnings().is_empty(), "{:?}", reporter.warnings());
}

#[tokio::test]
async fn stale_config_is_kept_but_flagged() {
    let host = FakeHost::fresh();
    host.seed_workspace();
    let config_path = host.layout.config_file();
    std::fs::write(&config_path, format!("age: {OTHER_RECIPIENT}\n")).expect("seed");
    let before = host.read_file(&config_path);

    let (run, reporter) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    assert_eq!(host.read_file(&config_path), before);
    assert!(reporter.warnings().iter().any(|w| w.contains("may be stale")));
    assert!(run.report.warnings.iter().any(|w| w.contains("--reconfigure")));
}

#[tokio::test]
async fn confirmed_reconfigure_regenerates_from_template() {
    let host = FakeHost::fresh();
    host.seed_workspace();
    let config_path = host.layout.config_file();
    std::fs::write(&config_path, "stale: true\n").expect("seed");

    let mut ctx = context(&host);
    ctx.reconfigure = true;
    let (run, _) = run(&host, &ctx).await;

    assert!(run.succeeded());
    let config = std::fs::read_to_string(&config_path).expect("config");
    assert!(config.contains(RECIPIENT));
    assert!(!config.contains("stale"));
    assert_eq!(mode_of(&config_path), 0o600);
}

#[tokio::test]
async fn missing_placeholder_value_fails_loudly_before_sealing() {
    let host = FakeHost::fresh();
    let mut ctx = context(&host);
    ctx.values = hostprep_cli::domain::PlaceholderValues::new()
        .with(hostprep_cli::domain::Placeholder::HostAddress, HOST_ADDRESS);

    let (run, _) = run(&host, &ctx).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::Configuration);
    assert_eq!(
        failure.error.downcast_ref::<TemplateError>(),
        Some(&TemplateError::MissingValue {
            token: "YOUR_HELIUS_API_KEY"
        })
    );
    assert!(!host.layout.config_file().exists());
    assert!(!host.called("encrypt"));
}

// ── Fail fast ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_os_fails_before_any_mutation() {
    let mut host = FakeHost::fresh();
    host.os_release = DEBIAN_12.to_string();

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::HostGate);
    assert!(matches!(
        failure.error.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::UnsupportedOs { .. })
    ));
    assert!(host.mutations().is_empty(), "{:?}", host.mutations());
    assert_eq!(statuses(&run), vec![(StepId::HostGate, StepStatus::Failed)]);
    assert!(run.report.services.is_empty(), "refused host is not observed");
    assert!(run.report.finished_at.is_some());
}

#[tokio::test]
async fn unprivileged_user_is_refused() {
    let mut host = FakeHost::fresh();
    host.uid = 1000;

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert!(matches!(
        failure.error.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::NotPrivileged { uid: 1000 })
    ));
    assert!(host.mutations().is_empty());
}

#[tokio::test]
async fn no_installable_interpreter_is_fatal() {
    let mut host = FakeHost::fresh();
    host.available = Vec::new();

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::Dependencies);
    assert!(matches!(
        failure.error.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::NoInterpreter { .. })
    ));
    assert!(!host.called("install_packages"));
}

#[tokio::test]
async fn package_failure_stops_the_run_with_installer_output() {
    let mut host = FakeHost::fresh();
    host.fail_on = Some("install_packages");

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::Dependencies);
    assert!(failure.to_string().contains("Unable to locate package age"));
    assert!(!host.called("clone_source"));
    assert_eq!(run.report.steps.len(), 2);
    assert_eq!(
        run.report.failure.as_ref().map(|f| f.step),
        Some(StepId::Dependencies)
    );
    assert!(!run.report.converged());
}

// ── Workspace ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn incomplete_workspace_is_discarded_and_refetched() {
    let host = FakeHost::fresh();
    let root = &host.layout.install_root;
    std::fs::create_dir_all(root).expect("mkdir");
    std::fs::write(root.join("partial.txt"), "half a clone").expect("seed");

    let (run, reporter) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    let removed = host
        .position(&format!("remove_dir_all {}", root.display()))
        .expect("removed");
    assert!(removed < host.position("clone_source").expect("cloned"));
    assert!(!root.join("partial.txt").exists());
    assert!(host.layout.completeness_marker().exists());
    assert!(reporter.warnings().iter().any(|w| w.contains("incomplete")));
}

#[tokio::test]
async fn clone_without_marker_is_fatal() {
    let mut host = FakeHost::fresh();
    host.clone_incomplete = true;

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::Workspace);
    assert!(failure.to_string().contains("requirements.txt"));
    assert!(!host.called("create_runtime"));
}

#[tokio::test]
async fn failed_refresh_is_degraded_and_the_run_continues() {
    let mut host = FakeHost::fresh();
    host.update_fails = true;
    host.seed_workspace();

    let (run, _) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    assert_eq!(
        run.report.step(StepId::Workspace).map(|s| s.status),
        Some(StepStatus::Degraded)
    );
    assert!(run.report.warnings.iter().any(|w| w.contains("fast-forward")));
    assert!(host.called("restart_unit pumpfun-dashboard"));
}

// ── Services ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn inactive_primary_stops_before_auxiliary_is_started() {
    let mut host = FakeHost::fresh();
    host.inactive_units = vec!["pumpfun-bot"];

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert_eq!(failure.step, StepId::Services);
    match failure.error.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::ServiceInactive { unit, diagnostics }) => {
            assert_eq!(unit, "pumpfun-bot");
            assert!(diagnostics.contains("ModuleNotFoundError"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!host.called("restart_unit pumpfun-dashboard"));
    assert!(!host.called("allow_rule"), "firewall step never ran");
    assert_eq!(run.report.services.len(), 2, "final state still observed");
    assert!(run.report.services.iter().all(|s| !s.active));
}

#[tokio::test]
async fn inactive_auxiliary_fails_after_primary_started() {
    let mut host = FakeHost::fresh();
    host.inactive_units = vec!["pumpfun-dashboard"];

    let (run, _) = run(&host, &context(&host)).await;

    let failure = run.failure.as_ref().expect("must fail");
    assert!(failure.to_string().contains("pumpfun-dashboard"));
    assert!(host.called("restart_unit pumpfun-bot"));
    let bot = run
        .report
        .services
        .iter()
        .find(|s| s.name == "pumpfun-bot")
        .expect("bot status");
    assert!(bot.active);
}

// ── Firewall ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_firewall_is_degraded_not_fatal() {
    let mut host = FakeHost::fresh();
    host.firewall_installed = false;

    let (run, reporter) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    assert!(run.report.converged());
    assert_eq!(
        run.report.step(StepId::Firewall).map(|s| s.status),
        Some(StepStatus::Degraded)
    );
    assert!(!host.called("allow_rule"));
    assert!(reporter.warnings().iter().any(|w| w.contains("no firewall")));
    assert_eq!(run.report.firewall.as_ref().map(|f| f.present), Some(false));
}

#[tokio::test]
async fn failing_rule_is_a_warning_and_the_rest_apply() {
    let mut host = FakeHost::fresh();
    host.failing_rules = vec!["8501/tcp"];

    let (run, _) = run(&host, &context(&host)).await;

    assert!(run.succeeded());
    assert_eq!(
        run.report.step(StepId::Firewall).map(|s| s.status),
        Some(StepStatus::Degraded)
    );
    let firewall = run.report.firewall.as_ref().expect("firewall state");
    assert!(firewall.active);
    let applied: Vec<String> = firewall.rules.iter().map(|r| r.spec()).collect();
    assert_eq!(applied, ["22/tcp", "8080/tcp"]);
    assert!(host.called("enable_firewall"));
}

#[tokio::test]
async fn firewall_stays_inactive_when_ssh_rule_fails() {
    let mut host = FakeHost::fresh();
    host.failing_rules = vec!["22/tcp"];

    let (run, reporter) = run(&host, &context(&host)).await;

    assert!(run.succeeded(), "{:?}", run.failure);
    assert_eq!(
        run.report.step(StepId::Firewall).map(|s| s.status),
        Some(StepStatus::Degraded)
    );
    assert!(!host.called("enable_firewall"));
    assert!(!host.firewall_enabled.get());
    let firewall = run.report.firewall.as_ref().expect("firewall state");
    assert!(!firewall.active);
    assert!(
        reporter
            .warnings()
            .iter()
            .any(|w| w.contains("ssh rule not applied; firewall left inactive"))
    );
}

#[tokio::test]
async fn firewall_is_enabled_only_after_ssh_is_allowed() {
    let host = FakeHost::fresh();
    let (run, _) = run(&host, &context(&host)).await;
    assert!(run.succeeded());
    assert!(
        host.position("allow_rule 22/tcp").expect("ssh")
            < host.position("enable_firewall").expect("enable")
    );
}
