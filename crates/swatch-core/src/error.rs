//! Errors raised while canonicalizing token values.

use thiserror::Error;

/// A value could not be brought into its canonical form.
///
/// The parser maps each variant onto its own diagnostic code, so the
/// distinction between a missing unit, a bad color and any other shape
/// problem is kept all the way to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A bare non-zero number was given where a unit is required.
    #[error("missing unit: {0}")]
    MissingUnit(String),

    /// A color string could not be parsed, or a channel is out of gamut.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Any other value that cannot be canonicalized for its type.
    #[error("{0}")]
    Invalid(String),
}

impl NormalizeError {
    /// Prefix the message with the sub-field it was raised for.
    ///
    /// ```
    /// # use swatch_core::NormalizeError;
    /// let err = NormalizeError::MissingUnit("4".to_string()).in_field("offsetX");
    /// assert_eq!(err.to_string(), "missing unit: offsetX: 4");
    /// ```
    pub fn in_field(self, field: &str) -> Self {
        match self {
            Self::MissingUnit(msg) => Self::MissingUnit(format!("{field}: {msg}")),
            Self::InvalidColor(msg) => Self::InvalidColor(format!("{field}: {msg}")),
            Self::Invalid(msg) => Self::Invalid(format!("{field}: {msg}")),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Render a JSON value compactly for error messages.
pub(crate) fn describe(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_field_keeps_variant() {
        let err = NormalizeError::InvalidColor("\"#wtf\"".to_string()).in_field("color");
        assert!(matches!(err, NormalizeError::InvalidColor(_)));
        assert_eq!(err.to_string(), "invalid color: color: \"#wtf\"");
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&serde_json::json!("1rem")), "\"1rem\"");
        assert_eq!(describe(&serde_json::json!(12)), "12");
    }
}
