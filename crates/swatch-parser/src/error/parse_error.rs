//! The error a `parse` invocation fails with.

use std::fmt;

use crate::error::{Diagnostic, ErrorCode};

/// Diagnostics that ended a `parse` invocation.
///
/// Without continue-on-error this is the first error reported. With it, an
/// `E009` summary leads, followed by every diagnostic of the run.
#[derive(Debug, Clone)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// The leading `E009` summary of a continue-on-error run.
    pub fn summary(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .first()
            .filter(|diagnostic| diagnostic.code() == Some(ErrorCode::E009))
    }

    /// Number of diagnostics carrying `code`.
    pub fn count(&self, code: ErrorCode) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.code() == Some(code))
            .count()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.diagnostics.split_first() else {
            return Ok(());
        };
        write!(f, "{first}")?;
        if !rest.is_empty() {
            write!(f, " (+{} more)", rest.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}
