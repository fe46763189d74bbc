//! Error types for swatch operations.
//!
//! This module provides the main error type [`SwatchError`] which wraps
//! the error conditions that can occur while compiling token documents.

use std::io;

use thiserror::Error;

use swatch_parser::ParseError;

/// The main error type for swatch operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic of the failed run. Each
/// diagnostic holds its own source text and locator, so it can be rendered
/// with a code frame without further context.
#[derive(Debug, Error)]
pub enum SwatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}
