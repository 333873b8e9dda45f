//! OS package set and interpreter selection.

use serde::Serialize;

/// Cache/store service enabled after installation.
pub const CACHE_SERVICE: &str = "redis-server";

/// Packages installed regardless of the interpreter choice.
pub const BASE_PACKAGES: &[&str] = &[
    "build-essential",
    "git",
    "curl",
    CACHE_SERVICE,
    "age",
    "python3-pip",
];

/// Python interpreters the application supports, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interpreter {
    #[serde(rename = "python3.12")]
    Python312,
    #[serde(rename = "python3.11")]
    Python311,
}

impl Interpreter {
    /// Probe order: the first available entry wins.
    pub const PREFERENCE: [Interpreter; 2] = [Interpreter::Python312, Interpreter::Python311];

    /// Executable and package name, e.g. `python3.12`.
    #[must_use]
    pub fn binary(self) -> &'static str {
        match self {
            Self::Python312 => "python3.12",
            Self::Python311 => "python3.11",
        }
    }

    /// OS packages that provide this interpreter with venv and headers.
    #[must_use]
    pub fn packages(self) -> Vec<String> {
        let bin = self.binary();
        vec![bin.to_string(), format!("{bin}-venv"), format!("{bin}-dev")]
    }
}

impl std::fmt::Display for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Pick the first interpreter from `available` following [`Interpreter::PREFERENCE`].
#[must_use]
pub fn select_interpreter(available: &[Interpreter]) -> Option<Interpreter> {
    Interpreter::PREFERENCE
        .into_iter()
        .find(|i| available.contains(i))
}

/// Full batch handed to the package manager in one call.
#[must_use]
pub fn package_batch(interpreter: Interpreter) -> Vec<String> {
    BASE_PACKAGES
        .iter()
        .map(|p| (*p).to_string())
        .chain(interpreter.packages())
        .collect()
}
