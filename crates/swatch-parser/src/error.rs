//! Error and diagnostic system for the swatch parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - A shared diagnostic collector that every pipeline stage reports into
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error, warning or notice with optional error code, source
//! locations, help text and the locator of the document it refers to.
//! Multiple diagnostics are wrapped in [`ParseError`] for returning from the
//! parsing lifecycle.
//!
//! # Example
//!
//! ```
//! # use swatch_parser::error::{Diagnostic, ErrorCode};
//! # use swatch_parser::Span;
//!
//! let span = Span::new(100..120);
//! let original_span = Span::new(50..70);
//!
//! let diag = Diagnostic::warning("token `color.brand` is defined more than once")
//!     .with_code(ErrorCode::E203)
//!     .with_label(span, "this definition wins")
//!     .with_secondary_label(original_span, "first defined here")
//!     .with_help("rename one of the tokens");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod frame;
mod label;
mod parse_error;
mod severity;

pub use collector::{DiagnosticCollector, Stats};
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use frame::{code_frame, line_col};
pub use label::{Emphasis, Label};
pub use parse_error::ParseError;
pub use severity::Severity;
