//! Configuration template with a closed set of named placeholders.
//!
//! A template declares which placeholders it uses simply by containing their
//! tokens. Resolution is literal substitution, but it fails when a used
//! placeholder has no value and when any `YOUR_*` token survives.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::error::TemplateError;

static LEFTOVER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // literal pattern
    Regex::new(r"YOUR_[A-Z0-9_]+").expect("valid regex")
});

/// Every placeholder the pipeline knows how to resolve, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Placeholder {
    ApiKey,
    HostAddress,
    RecipientKey,
}

impl Placeholder {
    pub const ALL: [Placeholder; 3] = [Self::ApiKey, Self::HostAddress, Self::RecipientKey];

    /// Literal token as it appears in `config.example.yaml`.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::ApiKey => "YOUR_HELIUS_API_KEY",
            Self::HostAddress => "YOUR_SERVER_IP",
            Self::RecipientKey => "YOUR_AGE_PUBLIC_KEY",
        }
    }
}

/// Typed resolution map.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderValues(BTreeMap<Placeholder, String>);

impl PlaceholderValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.set(placeholder, value);
        self
    }

    pub fn set(&mut self, placeholder: Placeholder, value: impl Into<String>) {
        self.0.insert(placeholder, value.into());
    }

    #[must_use]
    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.0.get(&placeholder).map(String::as_str)
    }
}

/// Parsed template text plus the placeholders it requires.
#[derive(Debug, Clone)]
pub struct ConfigTemplate {
    text: String,
    required: Vec<Placeholder>,
}

impl ConfigTemplate {
    #[must_use]
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let required = Placeholder::ALL
            .into_iter()
            .filter(|p| text.contains(p.token()))
            .collect();
        Self { text, required }
    }

    #[must_use]
    pub fn required(&self) -> &[Placeholder] {
        &self.required
    }

    /// Substitute every required placeholder.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::MissingValue`] if a required placeholder has no value.
    /// - [`TemplateError::EmptyValue`] if its value is blank.
    /// - [`TemplateError::Unresolved`] if a `YOUR_*` token remains afterwards.
    pub fn resolve(&self, values: &PlaceholderValues) -> Result<String, TemplateError> {
        let mut out = self.text.clone();
        for placeholder in &self.required {
            let token = placeholder.token();
            let value = values
                .get(*placeholder)
                .ok_or(TemplateError::MissingValue { token })?;
            if value.trim().is_empty() {
                return Err(TemplateError::EmptyValue { token });
            }
            out = out.replace(token, value);
        }
        if let Some(leftover) = LEFTOVER_TOKEN.find(&out) {
            return Err(TemplateError::Unresolved {
                token: leftover.as_str().to_string(),
            });
        }
        Ok(out)
    }
}

/// Whether an existing live document contains `value` verbatim.
#[must_use]
pub fn mentions_value(document: &str, value: &str) -> bool {
    document.contains(value)
}
