//! systemd unit definitions for the two application services: pure
//! functions, no I/O.
//!
//! The caller is responsible for handing the rendered text to the supervisor.

#![allow(clippy::format_push_string)]

use serde::Serialize;

use crate::domain::layout::Layout;

/// Port the bot's health endpoint listens on.
pub const HEALTH_PORT: u16 = 8080;

/// Port the dashboard listens on.
pub const DASHBOARD_PORT: u16 = 8501;

/// Which of the two services a unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    Primary,
    Auxiliary,
}

/// A unit definition ready to be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub name: &'static str,
    pub role: ServiceRole,
    pub definition: String,
}

/// Supervisor-reported state of an installed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitStatus {
    pub name: String,
    pub active: bool,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_logs: Vec<String>,
}

impl UnitStatus {
    /// Status of a unit the supervisor has never heard of.
    #[must_use]
    pub fn unknown(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: false,
            enabled: false,
            recent_logs: Vec::new(),
        }
    }
}

/// Both units in start order: primary first.
#[must_use]
pub fn service_units(layout: &Layout) -> [ServiceUnit; 2] {
    let venv_bin = layout.venv_dir().join("bin");
    let bot_exec = format!("{} -m src.main", venv_bin.join("python").display());
    let dashboard_exec = format!(
        "{} run src/dashboard/app.py --server.port {DASHBOARD_PORT} --server.address 0.0.0.0 --server.headless true",
        venv_bin.join("streamlit").display()
    );
    [
        ServiceUnit {
            name: "pumpfun-bot",
            role: ServiceRole::Primary,
            definition: render_unit(
                layout,
                "PumpFun trading bot",
                &bot_exec,
                "bot.log",
                "redis-server.service",
            ),
        },
        ServiceUnit {
            name: "pumpfun-dashboard",
            role: ServiceRole::Auxiliary,
            definition: render_unit(
                layout,
                "PumpFun bot dashboard",
                &dashboard_exec,
                "dashboard.log",
                "pumpfun-bot.service",
            ),
        },
    ]
}

fn render_unit(
    layout: &Layout,
    description: &str,
    exec_start: &str,
    log_name: &str,
    after: &str,
) -> String {
    let workdir = layout.install_root.display();
    let log = layout.logs_dir().join(log_name);
    let mut out = String::new();
    out.push_str("# Generated by hostprep - DO NOT EDIT\n");
    out.push_str("[Unit]\n");
    out.push_str(&format!("Description={description}\n"));
    out.push_str(&format!("After=network-online.target {after}\n"));
    out.push_str("Wants=network-online.target\n");
    out.push('\n');
    out.push_str("[Service]\n");
    out.push_str("Type=simple\n");
    out.push_str(&format!("WorkingDirectory={workdir}\n"));
    out.push_str("Environment=PYTHONUNBUFFERED=1\n");
    out.push_str(&format!(
        "Environment=AGE_IDENTITIES_FILE={}\n",
        layout.keypair_file().display()
    ));
    out.push_str(&format!("ExecStart={exec_start}\n"));
    out.push_str("Restart=always\n");
    out.push_str("RestartSec=10\n");
    out.push_str(&format!("StandardOutput=append:{}\n", log.display()));
    out.push_str(&format!("StandardError=append:{}\n", log.display()));
    out.push('\n');
    out.push_str("[Install]\n");
    out.push_str("WantedBy=multi-user.target\n");
    out
}
