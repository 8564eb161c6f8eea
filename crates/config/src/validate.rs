//! Configuration validation.
//!
//! Catches the mistakes that otherwise surface as silent misbehavior at
//! runtime: an empty prefix matches every message, duplicate group names
//! make evaluation order meaningless, and a literal `default` group shadows
//! the implicit one.

use std::collections::HashSet;

use crate::schema::HeraldConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "bot.prefix".
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
#[must_use]
pub fn validate(cfg: &HeraldConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if cfg.bot.prefix.is_empty() {
        diagnostics.push(Diagnostic::error(
            "bot.prefix",
            "empty prefix would match every message",
        ));
    }

    if cfg.throttle.ttl_secs == 0 {
        diagnostics.push(Diagnostic::warning(
            "throttle.ttl_secs",
            "zero TTL disables throttling entirely",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, group) in cfg.permission_groups.iter().enumerate() {
        let path = format!("permission-group[{idx}]");
        if group.name.is_empty() {
            diagnostics.push(Diagnostic::error(&path, "group has no name"));
        }
        if !seen.insert(group.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                &path,
                format!("duplicate group name '{}'", group.name),
            ));
        }
        if group.name == "default" {
            diagnostics.push(Diagnostic::warning(
                &path,
                "'default' shadows the implicit catch-all group",
            ));
        }
    }

    diagnostics
}

/// Returns `true` if any diagnostic is an error.
#[must_use]
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
