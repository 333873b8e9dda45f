//! Filesystem layout of a provisioned host.
//!
//! Production paths are fixed; [`Layout::rooted`] re-roots every path under a
//! scratch directory so the pipeline can be exercised without touching `/`.

use std::path::{Path, PathBuf};

/// Canonical install root of the application tree.
pub const INSTALL_ROOT: &str = "/opt/pumpfun-bot";

/// Directory systemd loads administrator unit files from.
pub const UNIT_DIR: &str = "/etc/systemd/system";

/// File whose presence marks a fully fetched source tree.
pub const COMPLETENESS_MARKER: &str = "requirements.txt";

/// Every path the pipeline reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub install_root: PathBuf,
    pub secrets_dir: PathBuf,
    pub unit_dir: PathBuf,
}

impl Layout {
    /// Production layout. The key directory lives under the operator's home.
    #[must_use]
    pub fn standard(home: &Path) -> Self {
        Self {
            install_root: PathBuf::from(INSTALL_ROOT),
            secrets_dir: home.join(".config").join("sops").join("age"),
            unit_dir: PathBuf::from(UNIT_DIR),
        }
    }

    /// Same shape as [`Layout::standard`], re-rooted under `root`.
    #[must_use]
    pub fn rooted(root: &Path) -> Self {
        Self {
            install_root: root.join("opt").join("pumpfun-bot"),
            secrets_dir: root.join("root").join(".config").join("sops").join("age"),
            unit_dir: root.join("etc").join("systemd").join("system"),
        }
    }

    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.install_root.join("config")
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.install_root.join("logs")
    }

    /// Template shipped in the source tree.
    #[must_use]
    pub fn config_template(&self) -> PathBuf {
        self.config_dir().join("config.example.yaml")
    }

    /// Live configuration document consumed by both services.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.yaml")
    }

    /// Sealed trading wallet.
    #[must_use]
    pub fn credential_file(&self) -> PathBuf {
        self.config_dir().join("trading_wallet.enc")
    }

    #[must_use]
    pub fn keypair_file(&self) -> PathBuf {
        self.secrets_dir.join("keys.txt")
    }

    #[must_use]
    pub fn completeness_marker(&self) -> PathBuf {
        self.install_root.join(COMPLETENESS_MARKER)
    }

    /// Root of the isolated Python environment.
    #[must_use]
    pub fn venv_dir(&self) -> PathBuf {
        self.install_root.join("venv")
    }

    /// Interpreter inside the venv; its presence means the venv exists.
    #[must_use]
    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir().join("bin").join("python")
    }

    /// Dependency manifest installed into the venv on every run.
    #[must_use]
    pub fn requirements_file(&self) -> PathBuf {
        self.install_root.join(COMPLETENESS_MARKER)
    }

    #[must_use]
    pub fn unit_file(&self, unit_name: &str) -> PathBuf {
        self.unit_dir.join(format!("{unit_name}.service"))
    }
}
