//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, package
//! installs, git, the Python runtime, age, systemd, ufw and the filesystem.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod address;
pub mod age;
pub mod apt;
pub mod command_runner;
pub mod fs;
pub mod git;
pub mod host;
pub mod systemd;
pub mod ufw;
pub mod venv;

pub use host::LinuxHost;
