//! The core diagnostic type for the swatch error system.
//!
//! A [`Diagnostic`] represents a single error, warning or notice with optional
//! error code, multiple labeled source spans, help text, and the document it
//! was raised against.

use std::{fmt, sync::Arc};

use url::Url;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::Span,
};

/// A rich diagnostic message with source location information.
///
/// Diagnostics provide detailed information about problems in token
/// documents, including:
/// - A severity level
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - One or more labeled source spans
/// - Optional help text with suggestions
/// - The locator and text of the document the spans point into
///
/// # Example
///
/// ```text
/// error[E100]: invalid $ref "#": a document cannot embed itself
///   --> file:///tokens/colors.json:4:17
///    |
///  4 |       "$value": { "$ref": "#" }
///    |                 ^^^^^^^^^^^^^^^ invalid pointer
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    locator: Option<Url>,
    source_text: Option<Arc<str>>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use swatch_parser::error::{Diagnostic, ErrorCode};
    /// # use swatch_parser::Span;
    ///
    /// let diag = Diagnostic::error("unknown $type \"colour\"")
    ///     .with_code(ErrorCode::E200)
    ///     .with_label(Span::new(0..8), "not a supported type")
    ///     .with_help("did you mean `color`?");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Create a debug diagnostic.
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Get the locator of the document this diagnostic refers to.
    pub fn locator(&self) -> Option<&Url> {
        self.locator.as_ref()
    }

    /// Get the text of the document the labels point into.
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach the document the labels point into.
    pub fn with_source(mut self, locator: Option<&Url>, text: Arc<str>) -> Self {
        self.locator = locator.cloned();
        self.source_text = Some(text);
        self
    }

    /// Attach only the document locator.
    pub fn with_locator(mut self, locator: &Url) -> Self {
        self.locator = Some(locator.clone());
        self
    }

    /// Create a diagnostic with the given severity and message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            locator: None,
            source_text: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
