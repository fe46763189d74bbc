//! Configuration types for swatch runs.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so
//! a partial (or empty) configuration file is always valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining parser and lint settings.
//! - [`ParserConfig`] - Error handling and stage selection of the pipeline.
//! - [`LintConfig`] - Severity of every configured lint rule.
//!
//! # Example
//!
//! ```
//! # use swatch::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(!config.parser().continue_on_error());
//! assert!(config.lint().rules().is_empty());
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use swatch_parser::RuleSeverity;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Lint configuration section.
    #[serde(default)]
    lint: LintConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(parser: ParserConfig, lint: LintConfig) -> Self {
        Self { parser, lint }
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the lint configuration.
    pub fn lint(&self) -> &LintConfig {
        &self.lint
    }
}

/// How the pipeline reacts to errors and which stages it runs.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ParserConfig {
    /// Record errors and keep going instead of halting at the first one.
    #[serde(default)]
    continue_on_error: bool,

    /// Skip the lint stage even when plugins are registered.
    #[serde(default)]
    skip_lint: bool,
}

impl ParserConfig {
    pub fn new(continue_on_error: bool, skip_lint: bool) -> Self {
        Self {
            continue_on_error,
            skip_lint,
        }
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    pub fn skip_lint(&self) -> bool {
        self.skip_lint
    }
}

/// Lint rule severities, keyed by rule id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LintConfig {
    #[serde(default)]
    rules: IndexMap<String, RuleSeverity>,
}

impl LintConfig {
    pub fn new(rules: IndexMap<String, RuleSeverity>) -> Self {
        Self { rules }
    }

    /// Returns the configured rules in declaration order.
    pub fn rules(&self) -> &IndexMap<String, RuleSeverity> {
        &self.rules
    }
}
