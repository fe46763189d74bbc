//! Error codes for the swatch diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Input and grammar errors
//! - `E1xx` - Structural reference (`$ref`) errors
//! - `E2xx` - Validation errors
//! - `E3xx` - Alias and normalization errors
//! - `E4xx` - Lint notices

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Input and grammar errors (E0xx)
    // =========================================================================
    /// Malformed input.
    ///
    /// An input entry is malformed, or its document root is not an object.
    E001,

    /// Unexpected token.
    ///
    /// The document does not follow the JSON grammar at this position.
    E002,

    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed.
    E003,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are `\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t` and `\uXXXX`.
    E004,

    /// Unexpected character.
    ///
    /// A character was encountered that cannot start any token.
    E005,

    /// Incomplete input.
    ///
    /// The document ended before a complete value was parsed.
    E006,

    /// Missing grammar adapter.
    ///
    /// The input does not look like JSON and no alternate grammar adapter was configured. This is a configuration error and always halts.
    E007,

    /// Alternate grammar failure.
    ///
    /// The configured alternate grammar adapter rejected the input.
    E008,

    /// Errors encountered.
    ///
    /// Summary raised at the end of a continue-on-error run that recorded errors.
    E009,

    // =========================================================================
    // Structural reference errors (E1xx)
    // =========================================================================
    /// Invalid pointer.
    ///
    /// A `$ref` is not a string, is malformed, or would embed a document within itself.
    E100,

    /// Circular reference.
    ///
    /// Following a `$ref` leads back to a pointer already being resolved.
    E101,

    /// Unresolved reference.
    ///
    /// The document or path a `$ref` points at does not exist.
    E102,

    /// Type mismatch.
    ///
    /// A `$ref` with sibling members resolved to something other than an object, so it cannot be merged.
    E103,

    /// Retrieval failure.
    ///
    /// A referenced document could not be read or fetched.
    E104,

    // =========================================================================
    // Validation errors (E2xx)
    // =========================================================================
    /// Unknown token type.
    ///
    /// The `$type` is not one of the supported token types.
    E200,

    /// Invalid value shape.
    ///
    /// The `$value` shape is incompatible with the token type.
    E201,

    /// Missing token type.
    ///
    /// The token has no `$type` and none is inherited from a parent group.
    E202,

    /// Duplicate token.
    ///
    /// A token id is defined by more than one input; the last one wins.
    E203,

    /// Invalid reserved member.
    ///
    /// A reserved member such as `$description` has a value of the wrong kind.
    E204,

    // =========================================================================
    // Alias and normalization errors (E3xx)
    // =========================================================================
    /// Circular alias.
    ///
    /// A token aliases itself, directly or through other tokens.
    E300,

    /// Unresolved alias.
    ///
    /// An alias names a token that does not exist.
    E301,

    /// Alias type mismatch.
    ///
    /// A value that is entirely an alias points at a token of another type.
    E302,

    /// Missing unit.
    ///
    /// A bare non-zero number was given where a unit is required.
    E303,

    /// Invalid color.
    ///
    /// A color could not be parsed, or is outside its color space.
    E304,

    /// Invalid value.
    ///
    /// A value could not be brought into its canonical form.
    E305,

    // =========================================================================
    // Lint notices (E4xx)
    // =========================================================================
    /// Lint notice.
    ///
    /// Reported by a lint rule.
    E400,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E007 => "E007",
            ErrorCode::E008 => "E008",
            ErrorCode::E009 => "E009",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E400 => "E400",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "malformed input",
            ErrorCode::E002 => "unexpected token",
            ErrorCode::E003 => "unterminated string literal",
            ErrorCode::E004 => "invalid escape sequence",
            ErrorCode::E005 => "unexpected character",
            ErrorCode::E006 => "incomplete input",
            ErrorCode::E007 => "missing grammar adapter",
            ErrorCode::E008 => "alternate grammar failure",
            ErrorCode::E009 => "errors encountered",
            ErrorCode::E100 => "invalid pointer",
            ErrorCode::E101 => "circular reference",
            ErrorCode::E102 => "unresolved reference",
            ErrorCode::E103 => "type mismatch",
            ErrorCode::E104 => "retrieval failure",
            ErrorCode::E200 => "unknown token type",
            ErrorCode::E201 => "invalid value shape",
            ErrorCode::E202 => "missing token type",
            ErrorCode::E203 => "duplicate token",
            ErrorCode::E204 => "invalid reserved member",
            ErrorCode::E300 => "circular alias",
            ErrorCode::E301 => "unresolved alias",
            ErrorCode::E302 => "alias type mismatch",
            ErrorCode::E303 => "missing unit",
            ErrorCode::E304 => "invalid color",
            ErrorCode::E305 => "invalid value",
            ErrorCode::E400 => "lint notice",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E203.to_string(), "E203");
        assert_eq!(ErrorCode::E305.to_string(), "E305");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E100.description(), "invalid pointer");
        assert_eq!(ErrorCode::E300.description(), "circular alias");
        assert_eq!(ErrorCode::E303.description(), "missing unit");
    }
}
