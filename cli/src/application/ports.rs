//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.
//!
//! Method names are unique across all ports so a single host adapter can
//! implement every one of them without call-site ambiguity.

use std::path::Path;
use std::process::Output;

use anyhow::Result;
use secrecy::SecretString;

use crate::domain::firewall::FirewallRule;
use crate::domain::{Interpreter, KeyPair, RecipientKey, ServiceUnit, SourceSpec, UnitStatus};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit an informational message (idempotent skips).
    fn info(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Host Ports ────────────────────────────────────────────────────────────────

/// Reads host identity. Never mutates anything.
#[allow(async_fn_in_trait)]
pub trait HostProbe {
    /// Effective uid of the current process.
    async fn effective_uid(&self) -> Result<u32>;
    /// Raw `/etc/os-release` content.
    async fn os_release(&self) -> Result<String>;
}

/// OS package manager.
#[allow(async_fn_in_trait)]
pub trait PackageManager {
    /// Whether `package` can be installed from the configured sources.
    async fn is_package_available(&self, package: &str) -> Result<bool>;
    /// Refresh the package index.
    async fn refresh_package_index(&self) -> Result<()>;
    /// Install the whole batch in one transaction; already-satisfied
    /// packages are no-ops.
    async fn install_packages(&self, packages: &[String]) -> Result<()>;
    /// Enable a system service for boot and start it now.
    async fn enable_system_service(&self, name: &str) -> Result<()>;
}

/// Git-based source fetch.
#[allow(async_fn_in_trait)]
pub trait SourceFetcher {
    /// Clone `source` into `dest`, which must not exist.
    async fn clone_source(&self, source: &SourceSpec, dest: &Path) -> Result<()>;
    /// Fast-forward an existing checkout to the tip of its branch.
    async fn update_source(&self, source: &SourceSpec, dest: &Path) -> Result<()>;
}

/// Isolated language runtime.
#[allow(async_fn_in_trait)]
pub trait RuntimeManager {
    /// Create a fresh environment at `env_dir` bound to `interpreter`.
    async fn create_runtime(&self, interpreter: Interpreter, env_dir: &Path) -> Result<()>;
    /// Install `manifest` into the environment; cheap when already satisfied.
    async fn install_requirements(&self, env_dir: &Path, manifest: &Path) -> Result<()>;
}

/// Asymmetric encryption utility.
#[allow(async_fn_in_trait)]
pub trait Encryptor {
    /// Generate a keypair file at `path` and return its structured value.
    /// The private half is written to the file and never returned.
    async fn generate_keypair(&self, path: &Path) -> Result<KeyPair>;
    /// Derive the public recipient from an existing key file.
    async fn recipient_of(&self, path: &Path) -> Result<RecipientKey>;
    /// Seal `plaintext` for `recipient`, returning ciphertext bytes.
    async fn encrypt(&self, plaintext: &SecretString, recipient: &RecipientKey)
    -> Result<Vec<u8>>;
}

/// OS service supervisor.
#[allow(async_fn_in_trait)]
pub trait ServiceSupervisor {
    /// Register (or overwrite) a unit definition.
    async fn install_unit(&self, unit: &ServiceUnit) -> Result<()>;
    /// Make the supervisor re-read unit definitions.
    async fn reload_units(&self) -> Result<()>;
    /// Enable a unit for automatic start.
    async fn enable_unit(&self, name: &str) -> Result<()>;
    /// Start the unit, or restart it if already running.
    async fn restart_unit(&self, name: &str) -> Result<()>;
    /// Current state plus recent diagnostic lines.
    async fn unit_status(&self, name: &str) -> Result<UnitStatus>;
}

/// Host firewall.
#[allow(async_fn_in_trait)]
pub trait Firewall {
    /// Whether a firewall subsystem is installed at all.
    async fn firewall_present(&self) -> Result<bool>;
    async fn firewall_active(&self) -> Result<bool>;
    /// Permit a rule. Returns `true` when the rule was newly added.
    async fn allow_rule(&self, rule: &FirewallRule) -> Result<bool>;
    async fn enable_firewall(&self) -> Result<()>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts local filesystem access.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Atomically write `content` with owner-only (0600) permissions.
    fn write_private(&self, path: &Path, content: &[u8]) -> Result<()>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    /// Permission bits of `path`, or `None` where the platform has none.
    fn mode(&self, path: &Path) -> Result<Option<u32>>;
}

// ── Composite ─────────────────────────────────────────────────────────────────

/// Composite trait: any type implementing every host port is a `HostPlatform`.
pub trait HostPlatform:
    HostProbe
    + PackageManager
    + SourceFetcher
    + RuntimeManager
    + Encryptor
    + ServiceSupervisor
    + Firewall
    + LocalFs
{
}

/// Blanket implementation: any type implementing all host ports is a `HostPlatform`.
impl<T> HostPlatform for T where
    T: HostProbe
        + PackageManager
        + SourceFetcher
        + RuntimeManager
        + Encryptor
        + ServiceSupervisor
        + Firewall
        + LocalFs
{
}
