//! Lint runner.
//!
//! Rules live in external [`LintPlugin`]s. The runner hands every plugin the
//! finished token set and reports each returned [`LintNotice`] as an `E400`
//! diagnostic at the severity configured for its rule.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    builder::Source,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError, Severity},
    token::TokenSet,
};

/// Configured severity of a lint rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Error,
    #[default]
    Warn,
    Off,
}

/// One finding of a lint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintNotice {
    /// Id of the rule that raised the notice
    pub rule: String,
    pub message: String,
    /// Token the notice is about, if any
    pub token: Option<String>,
}

impl LintNotice {
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            token: None,
        }
    }

    pub fn for_token(mut self, id: impl Into<String>) -> Self {
        self.token = Some(id.into());
        self
    }
}

/// What a plugin gets to inspect.
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    pub tokens: &'a TokenSet,
    pub sources: &'a [Source],
    pub rules: &'a IndexMap<String, RuleSeverity>,
}

impl LintContext<'_> {
    /// Severity of `rule`; rules without configuration warn.
    pub fn severity(&self, rule: &str) -> RuleSeverity {
        self.rules.get(rule).copied().unwrap_or_default()
    }
}

/// A provider of lint rules.
#[async_trait]
pub trait LintPlugin: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Ids of the rules this plugin implements.
    fn rules(&self) -> Vec<String>;

    async fn lint(&self, context: &LintContext<'_>) -> Vec<LintNotice>;
}

/// Run every plugin that has at least one enabled rule.
pub(crate) async fn run(
    plugins: &[Arc<dyn LintPlugin>],
    context: &LintContext<'_>,
    collector: &DiagnosticCollector,
) -> Result<(), ParseError> {
    for plugin in plugins {
        let enabled = plugin
            .rules()
            .iter()
            .any(|rule| context.severity(rule) != RuleSeverity::Off);
        if !enabled {
            debug!(plugin = plugin.name(); "All rules off, skipping plugin");
            continue;
        }

        let notices = plugin.lint(context).await;
        debug!(plugin = plugin.name(), notices = notices.len(); "Lint plugin finished");

        for notice in notices {
            let message = format!("{}: {}", notice.rule, notice.message);
            let Some(severity) = Severity::of_rule(context.severity(&notice.rule)) else {
                continue;
            };
            let diagnostic = Diagnostic::new(severity, message).with_code(ErrorCode::E400);

            let token = notice.token.as_deref().and_then(|id| context.tokens.get(id));
            let diagnostic = match token {
                Some(token) => diagnostic
                    .with_label(token.source.span, format!("token `{}`", token.id))
                    .with_source(token.source.locator.as_ref(), Arc::clone(&token.source.text)),
                None => diagnostic,
            };
            collector.emit(diagnostic)?;
        }
    }
    Ok(())
}
