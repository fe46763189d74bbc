//! Collector for accumulating diagnostics during a `parse` invocation.
//!
//! The [`DiagnosticCollector`] is threaded explicitly through every stage.
//! Clones share the same record, so concurrent reference-resolution tasks can
//! report into it; each report is pushed whole under a lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{error, log};

use crate::error::{Diagnostic, ErrorCode, ParseError, Severity, code_frame};

/// Diagnostic counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub debugs: usize,
}

#[derive(Debug, Default)]
struct Record {
    diagnostics: Vec<Diagnostic>,
    stats: Stats,
}

/// A shared collector for diagnostics.
///
/// # Example
///
/// ```
/// # use swatch_parser::error::{Diagnostic, DiagnosticCollector, ErrorCode};
/// # use swatch_parser::Span;
///
/// let collector = DiagnosticCollector::new(true);
///
/// collector
///     .emit(
///         Diagnostic::error("unknown $type \"colour\"")
///             .with_code(ErrorCode::E200)
///             .with_label(Span::new(0..10), "not supported"),
///     )
///     .unwrap();
/// collector.emit(Diagnostic::warning("shadowed token")).unwrap();
///
/// assert_eq!(collector.stats().errors, 1);
///
/// let err = collector.finish().unwrap_err();
/// assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E009));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    record: Arc<Mutex<Record>>,
    continue_on_error: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    ///
    /// With `continue_on_error` unset, the first error makes [`emit`](Self::emit)
    /// return `Err`, halting the pipeline.
    pub fn new(continue_on_error: bool) -> Self {
        Self {
            record: Arc::default(),
            continue_on_error,
        }
    }

    /// Whether errors are only counted instead of halting.
    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit a diagnostic to this collector.
    ///
    /// The diagnostic is recorded, counted, and forwarded to the `log` facade.
    /// Returns `Err` for an error unless the collector continues on error.
    pub fn emit(&self, diagnostic: Diagnostic) -> Result<(), ParseError> {
        let halts = diagnostic.severity().is_error() && !self.continue_on_error;
        self.record(&diagnostic);

        if halts {
            Err(ParseError::from(diagnostic))
        } else {
            Ok(())
        }
    }

    /// Record an error that halts regardless of continue-on-error, such as a
    /// configuration problem.
    pub fn fatal(&self, diagnostic: Diagnostic) -> ParseError {
        self.record(&diagnostic);
        ParseError::from(diagnostic)
    }

    fn record(&self, diagnostic: &Diagnostic) {
        Self::forward(diagnostic);

        let mut record = self.lock();
        match diagnostic.severity() {
            Severity::Error => record.stats.errors += 1,
            Severity::Warning => record.stats.warnings += 1,
            Severity::Info => record.stats.infos += 1,
            Severity::Debug => record.stats.debugs += 1,
        }
        record.diagnostics.push(diagnostic.clone());
    }

    /// Counts per severity so far.
    pub fn stats(&self) -> Stats {
        self.lock().stats
    }

    /// Every diagnostic recorded so far, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().diagnostics.clone()
    }

    /// Finish collection.
    ///
    /// - If errors were recorded, returns `Err(ParseError)` led by an `E009`
    ///   summary and followed by every diagnostic.
    /// - Otherwise returns the recorded warnings and notices.
    pub fn finish(&self) -> Result<Vec<Diagnostic>, ParseError> {
        let record = self.lock();
        let errors = record.stats.errors;
        if errors == 0 {
            return Ok(record.diagnostics.clone());
        }

        let plural = if errors == 1 { "error" } else { "errors" };
        let summary = Diagnostic::error(format!("parser encountered {errors} {plural}"))
            .with_code(ErrorCode::E009);
        error!(code = ErrorCode::E009.as_str(); "{summary}");

        let mut diagnostics = Vec::with_capacity(record.diagnostics.len() + 1);
        diagnostics.push(summary);
        diagnostics.extend(record.diagnostics.iter().cloned());
        Err(ParseError::new(diagnostics))
    }

    fn forward(diagnostic: &Diagnostic) {
        let code = diagnostic.code().map_or("-", |code| code.as_str());
        let locator = diagnostic.locator().map_or("-", |url| url.as_str());

        let primary = diagnostic.labels().iter().find(|label| label.is_primary());
        let frame = match (diagnostic.source_text(), primary) {
            (Some(src), Some(label)) => format!("\n{}", code_frame(src, label.span())),
            _ => String::new(),
        };

        let level = diagnostic.severity().log_level();
        log!(level, code = code, locator = locator; "{diagnostic}{frame}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn test_collector_new_finish_ok() {
        let collector = DiagnosticCollector::new(false);
        assert!(collector.finish().unwrap().is_empty());
    }

    #[test]
    fn test_emit_error_halts_by_default() {
        let collector = DiagnosticCollector::new(false);

        let err = collector.emit(Diagnostic::error("test error")).unwrap_err();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(collector.stats().errors, 1);
    }

    #[test]
    fn test_emit_warning_never_halts() {
        let collector = DiagnosticCollector::new(false);

        assert!(collector.emit(Diagnostic::warning("test warning")).is_ok());
        assert!(collector.emit(Diagnostic::info("note")).is_ok());

        let remaining = collector.finish().unwrap();
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn test_continue_on_error_aggregates() {
        let collector = DiagnosticCollector::new(true);

        collector
            .emit(
                Diagnostic::error("error 1")
                    .with_code(ErrorCode::E303)
                    .with_label(Span::new(10..20), "here"),
            )
            .unwrap();
        collector.emit(Diagnostic::warning("warning 1")).unwrap();
        collector.emit(Diagnostic::error("error 2")).unwrap();

        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 4);
        assert_eq!(err.diagnostics()[0].message(), "parser encountered 2 errors");
        assert_eq!(err.diagnostics()[1].message(), "error 1");
    }

    #[test]
    fn test_clones_share_record() {
        let collector = DiagnosticCollector::new(true);
        let clone = collector.clone();

        clone.emit(Diagnostic::error("from a task")).unwrap();

        assert_eq!(collector.stats().errors, 1);
    }

    #[test]
    fn test_fatal_ignores_continue_on_error() {
        let collector = DiagnosticCollector::new(true);

        let err = collector.fatal(Diagnostic::error("no adapter").with_code(ErrorCode::E007));

        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E007));
        assert_eq!(collector.stats().errors, 1);
    }
}
