//! Inbound firewall rules the host must expose.

use serde::Serialize;

use crate::domain::units::{DASHBOARD_PORT, HEALTH_PORT};

/// Administrative SSH access.
pub const SSH_PORT: u16 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub port: u16,
    pub protocol: Protocol,
    pub label: &'static str,
}

impl FirewallRule {
    /// `ufw`-style rule spec, e.g. `8080/tcp`.
    #[must_use]
    pub fn spec(&self) -> String {
        format!("{}/{}", self.port, self.protocol)
    }
}

/// Admin port first, then the two service ports.
pub const RULES: [FirewallRule; 3] = [
    FirewallRule {
        port: SSH_PORT,
        protocol: Protocol::Tcp,
        label: "ssh",
    },
    FirewallRule {
        port: HEALTH_PORT,
        protocol: Protocol::Tcp,
        label: "bot health",
    },
    FirewallRule {
        port: DASHBOARD_PORT,
        protocol: Protocol::Tcp,
        label: "dashboard",
    },
];
