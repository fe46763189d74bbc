//! How serious a diagnostic is.

use std::fmt;

use crate::lint::RuleSeverity;

/// The severity level of a diagnostic.
///
/// Grammar, reference, validation and alias problems are errors. Duplicate
/// token ids warn. Lint findings take the level configured for their rule.
/// Only errors count towards the `E009` summary, and only errors halt a run
/// that does not continue on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }

    /// The level a lint finding is reported at, `None` when its rule is off.
    pub fn of_rule(rule: RuleSeverity) -> Option<Self> {
        match rule {
            RuleSeverity::Error => Some(Severity::Error),
            RuleSeverity::Warn => Some(Severity::Warning),
            RuleSeverity::Off => None,
        }
    }

    /// The `log` level diagnostics of this severity are forwarded at.
    pub fn log_level(&self) -> log::Level {
        match self {
            Severity::Error => log::Level::Error,
            Severity::Warning => log::Level::Warn,
            Severity::Info => log::Level::Info,
            Severity::Debug => log::Level::Debug,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Debug => "debug",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_levels() {
        assert_eq!(Severity::of_rule(RuleSeverity::Error), Some(Severity::Error));
        assert_eq!(Severity::of_rule(RuleSeverity::Warn), Some(Severity::Warning));
        assert_eq!(Severity::of_rule(RuleSeverity::Off), None);
    }

    #[test]
    fn test_duplicate_token_warning_is_logged_as_warn() {
        assert!(!Severity::Warning.is_error());
        assert_eq!(Severity::Warning.log_level(), log::Level::Warn);
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
