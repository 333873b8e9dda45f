//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod credential;
pub mod error;
pub mod firewall;
pub mod host;
pub mod keys;
pub mod layout;
pub mod packages;
pub mod pipeline;
pub mod report;
pub mod template;
pub mod units;
pub mod workspace;

pub use error::{KeyError, ProvisionError, TemplateError};
pub use host::{HostProfile, check_supported};
pub use keys::{KeyPair, RecipientKey};
pub use layout::Layout;
pub use packages::Interpreter;
pub use pipeline::{StepFailure, StepId, StepOutcome, StepRecord, StepStatus};
pub use report::{ArtifactState, ConvergenceReport, FirewallState};
pub use template::{ConfigTemplate, Placeholder, PlaceholderValues};
pub use units::{ServiceRole, ServiceUnit, UnitStatus};
pub use workspace::{SourceSpec, WorkspacePresence};
